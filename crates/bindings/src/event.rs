//! Change notifications emitted by the binding manager.

use std::sync::Arc;

use bitflags::bitflags;

use crate::resolve::ResolvedBindings;

bitflags! {
	/// Aspects of the manager that changed in one event.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct Changes: u8 {
		/// The resolved trigger to command map was dropped or replaced.
		const ACTIVE_BINDINGS = 1 << 0;
		const ACTIVE_SCHEME = 1 << 1;
		const LOCALE = 1 << 2;
		const PLATFORM = 1 << 3;
		/// A scheme was defined, redefined or undefined.
		const SCHEME_DEFINITION = 1 << 4;
	}
}

/// The scheme whose definition changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeChange {
	pub id: Arc<str>,
	/// Whether the scheme is defined after the change.
	pub defined: bool,
}

/// One state change of a [`BindingManager`](crate::BindingManager).
#[derive(Debug, Clone, Default)]
pub struct BindingManagerEvent {
	pub changes: Changes,
	pub scheme: Option<SchemeChange>,
	/// Resolution published before the change, if there was one.
	pub previous: Option<Arc<ResolvedBindings>>,
}

impl BindingManagerEvent {
	pub fn is_active_bindings_changed(&self) -> bool {
		self.changes.contains(Changes::ACTIVE_BINDINGS)
	}

	pub fn is_active_scheme_changed(&self) -> bool {
		self.changes.contains(Changes::ACTIVE_SCHEME)
	}

	pub fn is_locale_changed(&self) -> bool {
		self.changes.contains(Changes::LOCALE)
	}

	pub fn is_platform_changed(&self) -> bool {
		self.changes.contains(Changes::PLATFORM)
	}

	pub fn is_scheme_changed(&self) -> bool {
		self.changes.contains(Changes::SCHEME_DEFINITION)
	}

	/// Whether the triggers bound to `command` differ between the previous
	/// resolution and `current`.
	///
	/// Without a previous resolution any command with triggers counts as changed.
	pub fn is_active_bindings_changed_for(&self, command: &str, current: &ResolvedBindings) -> bool {
		if !self.is_active_bindings_changed() {
			return false;
		}
		let before = self.previous.as_deref().map(|previous| previous.triggers_for(command)).unwrap_or_default();
		before != current.triggers_for(command)
	}
}

/// Observer of binding manager changes.
///
/// Called synchronously after the manager has released its lock, so the
/// manager may be queried from inside the callback.
pub trait BindingManagerListener: Send + Sync {
	fn binding_manager_changed(&self, event: &BindingManagerEvent);
}

impl<F> BindingManagerListener for F
where
	F: Fn(&BindingManagerEvent) + Send + Sync,
{
	fn binding_manager_changed(&self, event: &BindingManagerEvent) {
		self(event)
	}
}

/// Handle returned when registering a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);
