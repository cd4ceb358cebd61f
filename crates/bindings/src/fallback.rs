//! Fallback chains for locales and platforms.
//!
//! A chain lists a value from most to least specific and always ends with the
//! empty string followed by `None`, so bindings declared for "any locale" or
//! with no locale at all still match.

use std::sync::Arc;

use smallvec::SmallVec;

/// Most specific first. Entries equal to `None` match bindings with no value.
pub type Chain = SmallVec<[Option<Arc<str>>; 4]>;

const LOCALE_SEPARATOR: char = '_';

/// Expands a locale such as `en_GB` into `["en_GB", "en", "", None]`.
pub fn expand_locale(locale: &str) -> Chain {
	let mut levels: Vec<String> = Vec::new();
	let mut current = String::new();
	for part in locale.trim().split(LOCALE_SEPARATOR).map(str::trim).filter(|part| !part.is_empty()) {
		if !current.is_empty() {
			current.push(LOCALE_SEPARATOR);
		}
		current.push_str(part);
		levels.push(current.clone());
	}

	terminate(levels.into_iter().rev())
}

/// Expands a platform such as `gtk` into `["gtk", "", None]`.
pub fn expand_platform(platform: &str) -> Chain {
	let platform = platform.trim();
	terminate((!platform.is_empty()).then(|| platform.to_string()))
}

fn terminate(levels: impl IntoIterator<Item = String>) -> Chain {
	let mut chain: Chain = levels.into_iter().map(|level| Some(Arc::from(level))).collect();
	chain.push(Some(Arc::from("")));
	chain.push(None);
	chain
}

/// Position of `value` in `chain`, if present.
pub fn position(chain: &[Option<Arc<str>>], value: Option<&str>) -> Option<usize> {
	chain.iter().position(|entry| entry.as_deref() == value)
}
