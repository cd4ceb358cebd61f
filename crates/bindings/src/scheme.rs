//! Schemes: named, inheritable collections of binding preferences.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::error::{Error, Result};
use crate::fallback::Chain;

/// A named binding scheme such as "default" or "emacs".
///
/// Schemes are created on first reference and always present afterwards; the
/// `defined` flag records whether a definition has been supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheme {
	id: Arc<str>,
	name: Option<Arc<str>>,
	description: Option<Arc<str>>,
	parent_id: Option<Arc<str>>,
	defined: bool,
}

impl Scheme {
	fn undefined(id: Arc<str>) -> Self {
		Self {
			id,
			name: None,
			description: None,
			parent_id: None,
			defined: false,
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn is_defined(&self) -> bool {
		self.defined
	}

	pub fn name(&self) -> Result<&str> {
		self.ensure_defined()?;
		Ok(self.name.as_deref().unwrap_or_default())
	}

	pub fn description(&self) -> Result<Option<&str>> {
		self.ensure_defined()?;
		Ok(self.description.as_deref())
	}

	/// The scheme this one inherits from, if any.
	pub fn parent_id(&self) -> Result<Option<&str>> {
		self.ensure_defined()?;
		Ok(self.parent_id.as_deref())
	}

	fn ensure_defined(&self) -> Result<()> {
		if self.defined { Ok(()) } else { Err(Error::SchemeNotDefined(Arc::clone(&self.id))) }
	}
}

/// Lazily populated map of schemes.
#[derive(Debug, Default)]
pub(crate) struct SchemeRegistry {
	schemes: FxHashMap<Arc<str>, Scheme>,
}

impl SchemeRegistry {
	/// Returns the scheme, creating an undefined entry if absent.
	pub(crate) fn get_or_create(&mut self, id: &str) -> &Scheme {
		self.schemes.entry(Arc::from(id)).or_insert_with_key(|key| Scheme::undefined(Arc::clone(key)))
	}

	pub(crate) fn get(&self, id: &str) -> Option<&Scheme> {
		self.schemes.get(id)
	}

	/// Defines or redefines a scheme. Returns whether anything changed.
	pub(crate) fn define(&mut self, id: &str, name: &str, description: Option<&str>, parent_id: Option<&str>) -> bool {
		let key: Arc<str> = Arc::from(id);
		let next = Scheme {
			id: Arc::clone(&key),
			name: Some(Arc::from(name)),
			description: description.map(Arc::from),
			parent_id: parent_id.map(Arc::from),
			defined: true,
		};
		if self.schemes.get(id) == Some(&next) {
			return false;
		}
		self.schemes.insert(key, next);
		true
	}

	/// Marks a scheme undefined. Returns whether it was defined before.
	pub(crate) fn undefine(&mut self, id: &str) -> bool {
		match self.schemes.get_mut(id) {
			Some(scheme) if scheme.defined => {
				*scheme = Scheme::undefined(Arc::clone(&scheme.id));
				true
			}
			_ => false,
		}
	}

	pub(crate) fn defined_ids(&self) -> FxHashSet<Arc<str>> {
		self.schemes.values().filter(|scheme| scheme.defined).map(|scheme| Arc::clone(&scheme.id)).collect()
	}

	/// Builds the inheritance chain starting at `id`, most specific first.
	///
	/// The chain is empty when `id` itself is unknown or undefined. Ascent stops
	/// silently at an undefined or missing ancestor and at a cycle.
	pub(crate) fn chain(&self, id: &str) -> Chain {
		let mut chain = Chain::new();
		let mut seen: FxHashSet<&str> = FxHashSet::default();
		let mut current = match self.schemes.get(id) {
			Some(scheme) if scheme.defined => scheme,
			_ => return chain,
		};

		loop {
			seen.insert(current.id.as_ref());
			chain.push(Some(Arc::clone(&current.id)));

			let Some(parent_id) = current.parent_id.as_deref() else {
				break;
			};
			if seen.contains(parent_id) {
				trace!(scheme = id, parent = parent_id, "scheme inheritance cycle; chain truncated");
				break;
			}
			match self.schemes.get(parent_id) {
				Some(parent) if parent.defined => current = parent,
				_ => {
					trace!(scheme = id, parent = parent_id, "undefined ancestor scheme; chain truncated");
					break;
				}
			}
		}

		chain
	}
}
