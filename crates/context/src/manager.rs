//! In-memory context manager.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::error::{ContextError, Result};


/// An activation condition such as "text editor focused".
///
/// Contexts are created on first reference and stay present afterwards; the
/// `defined` flag tracks whether a definition has been supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
	id: Arc<str>,
	name: Option<Arc<str>>,
	description: Option<Arc<str>>,
	parent_id: Option<Arc<str>>,
	defined: bool,
}

impl Context {
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

	/// Returns the parent context id, or `None` for a root context.
	pub fn parent_id(&self) -> Result<Option<&Arc<str>>> {
		self.ensure_defined()?;
		Ok(self.parent_id.as_ref())
	}

	fn ensure_defined(&self) -> Result<()> {
		if self.defined { Ok(()) } else { Err(ContextError::NotDefined(Arc::clone(&self.id))) }
	}
}

/// Read access to contexts needed by binding resolution.
pub trait ContextSource: Send + Sync {
	/// Identifiers of the currently active contexts.
	fn active_context_ids(&self) -> FxHashSet<Arc<str>>;

	/// Parent of the given context.
	///
	/// # Errors
	///
	/// Returns [`ContextError::NotDefined`] if the context is unknown or undefined.
	fn parent_of(&self, id: &str) -> Result<Option<Arc<str>>>;
}

/// Describes a change to a [`ContextManager`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContextManagerEvent {
	/// The set of active context ids changed.
	pub active_contexts_changed: bool,
	/// A context was defined, redefined or undefined.
	pub definition_changed: Option<Arc<str>>,
}

/// Observer of context manager changes.
pub trait ContextManagerListener: Send + Sync {
	fn context_manager_changed(&self, event: &ContextManagerEvent);
}

/// Handle returned when registering a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextListenerId(u64);

static NEXT_LISTENER: AtomicU64 = AtomicU64::new(0);

#[derive(Default)]
struct State {
	contexts: FxHashMap<Arc<str>, Context>,
	active: FxHashSet<Arc<str>>,
}

/// Owns context definitions and the active context set.
///
/// Listeners are held weakly and notified synchronously after the internal
/// lock is released, so they may query the manager while handling an event.
#[derive(Default)]
pub struct ContextManager {
	state: Mutex<State>,
	listeners: Mutex<Vec<(ContextListenerId, Weak<dyn ContextManagerListener>)>>,
}

impl ContextManager {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a snapshot of the context, creating an undefined one if absent.
	pub fn context(&self, id: &str) -> Context {
		let mut state = self.state.lock();
		if let Some(context) = state.contexts.get(id) {
			return context.clone();
		}
		let context = Context::undefined(Arc::from(id));
		state.contexts.insert(Arc::clone(&context.id), context.clone());
		context
	}

	/// Defines (or redefines) a context.
	///
	/// Returns whether anything changed; listeners are notified only on change.
	pub fn define(&self, id: &str, name: &str, description: Option<&str>, parent_id: Option<&str>) -> bool {
		let changed = {
			let mut state = self.state.lock();
			let key: Arc<str> = Arc::from(id);
			let next = Context {
				id: Arc::clone(&key),
				name: Some(Arc::from(name)),
				description: description.map(Arc::from),
				parent_id: parent_id.map(Arc::from),
				defined: true,
			};
			match state.contexts.get(id) {
				Some(existing) if *existing == next => false,
				_ => {
					state.contexts.insert(key, next);
					true
				}
			}
		};

		if changed {
			trace!(context = id, ?parent_id, "context defined");
			self.fire(ContextManagerEvent {
				active_contexts_changed: false,
				definition_changed: Some(Arc::from(id)),
			});
		}
		changed
	}

	/// Marks a context as undefined. The context stays referenced.
	pub fn undefine(&self, id: &str) -> bool {
		let changed = {
			let mut state = self.state.lock();
			match state.contexts.get_mut(id) {
				Some(context) if context.defined => {
					*context = Context::undefined(Arc::clone(&context.id));
					true
				}
				_ => false,
			}
		};

		if changed {
			trace!(context = id, "context undefined");
			self.fire(ContextManagerEvent {
				active_contexts_changed: false,
				definition_changed: Some(Arc::from(id)),
			});
		}
		changed
	}

	/// Replaces the active context set.
	pub fn set_active_context_ids<I, S>(&self, ids: I)
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let next: FxHashSet<Arc<str>> = ids.into_iter().map(|id| Arc::from(id.as_ref())).collect();
		let changed = {
			let mut state = self.state.lock();
			if state.active == next {
				false
			} else {
				state.active = next;
				true
			}
		};

		if changed {
			self.fire(ContextManagerEvent {
				active_contexts_changed: true,
				definition_changed: None,
			});
		}
	}

	/// Adds one context to the active set.
	pub fn activate(&self, id: &str) {
		let changed = self.state.lock().active.insert(Arc::from(id));
		if changed {
			self.fire(ContextManagerEvent {
				active_contexts_changed: true,
				definition_changed: None,
			});
		}
	}

	/// Removes one context from the active set.
	pub fn deactivate(&self, id: &str) {
		let changed = self.state.lock().active.remove(id);
		if changed {
			self.fire(ContextManagerEvent {
				active_contexts_changed: true,
				definition_changed: None,
			});
		}
	}

	pub fn defined_context_ids(&self) -> FxHashSet<Arc<str>> {
		self.state
			.lock()
			.contexts
			.values()
			.filter(|context| context.defined)
			.map(|context| Arc::clone(&context.id))
			.collect()
	}

	/// Registers a listener. The manager only keeps a weak reference.
	pub fn add_listener(&self, listener: Weak<dyn ContextManagerListener>) -> ContextListenerId {
		let id = ContextListenerId(NEXT_LISTENER.fetch_add(1, Ordering::Relaxed));
		self.listeners.lock().push((id, listener));
		id
	}

	/// Unregisters a listener; returns whether it was registered.
	pub fn remove_listener(&self, id: ContextListenerId) -> bool {
		let mut listeners = self.listeners.lock();
		let before = listeners.len();
		listeners.retain(|(existing, _)| *existing != id);
		listeners.len() != before
	}

	fn fire(&self, event: ContextManagerEvent) {
		let live: Vec<Arc<dyn ContextManagerListener>> = {
			let mut listeners = self.listeners.lock();
			listeners.retain(|(_, weak)| weak.strong_count() > 0);
			listeners.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
		};

		for listener in live {
			listener.context_manager_changed(&event);
		}
	}
}

impl ContextSource for ContextManager {
	fn active_context_ids(&self) -> FxHashSet<Arc<str>> {
		self.state.lock().active.clone()
	}

	fn parent_of(&self, id: &str) -> Result<Option<Arc<str>>> {
		let state = self.state.lock();
		match state.contexts.get(id) {
			Some(context) => context.parent_id().map(|parent| parent.cloned()),
			None => Err(ContextError::NotDefined(Arc::from(id))),
		}
	}
}
