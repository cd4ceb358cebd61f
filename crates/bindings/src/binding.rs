use std::fmt;
use std::sync::Arc;

use bindery_trigger::TriggerSequence;

use crate::error::{Error, Result};

/// Who contributed a binding. User bindings take precedence over system ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BindingType {
	#[default]
	System,
	User,
}

/// Association of a trigger sequence with a command under specific conditions.
///
/// Bindings are plain values: equality, hashing and ordering cover every field.
/// A binding without a command is an unbinding; it suppresses lower priority
/// bindings on the same trigger instead of assigning a command.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Binding {
	trigger: TriggerSequence,
	command_id: Option<Arc<str>>,
	scheme_id: Arc<str>,
	context_id: Arc<str>,
	locale: Option<Arc<str>>,
	platform: Option<Arc<str>>,
	kind: BindingType,
}

impl Binding {
	/// Creates a system binding valid for every locale and platform.
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidBinding`] if the scheme or context id is empty.
	pub fn new(trigger: TriggerSequence, command_id: Option<&str>, scheme_id: &str, context_id: &str) -> Result<Self> {
		if scheme_id.is_empty() {
			return Err(Error::InvalidBinding("scheme id must not be empty"));
		}
		if context_id.is_empty() {
			return Err(Error::InvalidBinding("context id must not be empty"));
		}

		Ok(Self {
			trigger,
			command_id: command_id.map(Arc::from),
			scheme_id: Arc::from(scheme_id),
			context_id: Arc::from(context_id),
			locale: None,
			platform: None,
			kind: BindingType::System,
		})
	}

	/// Like [`Binding::new`], parsing the trigger from text such as `"ctrl+k ctrl+c"`.
	pub fn parse(trigger: &str, command_id: Option<&str>, scheme_id: &str, context_id: &str) -> Result<Self> {
		Self::new(TriggerSequence::parse(trigger)?, command_id, scheme_id, context_id)
	}

	pub fn with_locale(mut self, locale: Option<&str>) -> Self {
		self.locale = locale.map(Arc::from);
		self
	}

	pub fn with_platform(mut self, platform: Option<&str>) -> Self {
		self.platform = platform.map(Arc::from);
		self
	}

	pub fn with_type(mut self, kind: BindingType) -> Self {
		self.kind = kind;
		self
	}

	pub fn trigger(&self) -> &TriggerSequence {
		&self.trigger
	}

	/// The bound command, or `None` for an unbinding.
	pub fn command_id(&self) -> Option<&Arc<str>> {
		self.command_id.as_ref()
	}

	pub fn scheme_id(&self) -> &str {
		&self.scheme_id
	}

	pub fn context_id(&self) -> &str {
		&self.context_id
	}

	pub fn locale(&self) -> Option<&str> {
		self.locale.as_deref()
	}

	pub fn platform(&self) -> Option<&str> {
		self.platform.as_deref()
	}

	pub fn kind(&self) -> BindingType {
		self.kind
	}

	pub fn is_unbinding(&self) -> bool {
		self.command_id.is_none()
	}
}

impl fmt::Debug for Binding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Binding({} -> {}, scheme={}, context={}, locale={:?}, platform={:?}, {:?})",
			self.trigger,
			self.command_id.as_deref().unwrap_or("<unbound>"),
			self.scheme_id,
			self.context_id,
			self.locale,
			self.platform,
			self.kind,
		)
	}
}

/// Selects bindings for [`BindingManager::remove_bindings`](crate::BindingManager::remove_bindings).
///
/// Every field must equal the binding's field for the binding to be removed;
/// the command id is not consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingFilter {
	pub trigger: TriggerSequence,
	pub scheme_id: Arc<str>,
	pub context_id: Arc<str>,
	pub locale: Option<Arc<str>>,
	pub platform: Option<Arc<str>>,
	pub kind: BindingType,
}

impl BindingFilter {
	pub fn matches(&self, binding: &Binding) -> bool {
		binding.trigger == self.trigger
			&& binding.scheme_id == self.scheme_id
			&& binding.context_id == self.context_id
			&& binding.locale == self.locale
			&& binding.platform == self.platform
			&& binding.kind == self.kind
	}
}

impl From<&Binding> for BindingFilter {
	fn from(binding: &Binding) -> Self {
		Self {
			trigger: binding.trigger.clone(),
			scheme_id: Arc::clone(&binding.scheme_id),
			context_id: Arc::clone(&binding.context_id),
			locale: binding.locale.clone(),
			platform: binding.platform.clone(),
			kind: binding.kind,
		}
	}
}
