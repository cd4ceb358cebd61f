//! Binding manager configuration.

use std::num::NonZeroUsize;

use serde::Deserialize;

use crate::error::Result;

/// Initial settings for a [`BindingManager`](crate::BindingManager).
///
/// ```toml
/// locale = "en_GB"
/// platform = "gtk"
/// cache_capacity = 32
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindingManagerConfig {
	/// Locale such as `en_GB`. Defaults to the process locale.
	pub locale: Option<String>,
	/// Platform such as `gtk`. Defaults to the operating system name.
	pub platform: Option<String>,
	/// Maximum number of cached resolutions. Unbounded when absent.
	pub cache_capacity: Option<NonZeroUsize>,
}

impl BindingManagerConfig {
	/// Parses a configuration from TOML text.
	///
	/// # Errors
	///
	/// Returns [`Error::Config`](crate::Error::Config) on malformed TOML or unknown keys.
	pub fn from_toml_str(text: &str) -> Result<Self> {
		Ok(toml::from_str(text)?)
	}

	pub(crate) fn initial_locale(&self) -> String {
		self.locale.clone().unwrap_or_else(default_locale)
	}

	pub(crate) fn initial_platform(&self) -> String {
		self.platform.clone().unwrap_or_else(default_platform)
	}
}

/// Process locale from `LC_ALL`, `LC_MESSAGES` or `LANG`, in that order.
///
/// Empty when none is set or the locale is `C`/`POSIX`.
pub fn default_locale() -> String {
	["LC_ALL", "LC_MESSAGES", "LANG"]
		.into_iter()
		.filter_map(|var| std::env::var(var).ok())
		.find(|value| !value.is_empty())
		.map(|value| locale_from_env(&value))
		.unwrap_or_default()
}

pub fn default_platform() -> String {
	std::env::consts::OS.to_string()
}

/// Strips the encoding and modifier from a POSIX locale: `en_US.UTF-8@euro` becomes `en_US`.
fn locale_from_env(value: &str) -> String {
	let locale = value.split(['.', '@']).next().unwrap_or_default().replace('-', "_");
	match locale.as_str() {
		"C" | "POSIX" => String::new(),
		_ => locale,
	}
}
