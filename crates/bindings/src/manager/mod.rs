//! The binding manager: owns bindings, schemes and the active resolution.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;
use bindery_context::{ContextManager, ContextManagerEvent, ContextManagerListener, ContextSource};
use bindery_trigger::TriggerSequence;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::binding::{Binding, BindingFilter};
use crate::cache::{BindingCache, CacheKey};
use crate::config::BindingManagerConfig;
use crate::context_tree::ContextTree;
use crate::error::{Error, Result};
use crate::event::{BindingManagerEvent, BindingManagerListener, Changes, ListenerId, SchemeChange};
use crate::fallback::{Chain, expand_locale, expand_platform};
use crate::resolve::ResolvedBindings;
use crate::scheme::{Scheme, SchemeRegistry};

#[cfg(test)]
mod invariants;

static NEXT_LISTENER: AtomicU64 = AtomicU64::new(0);

struct State {
	bindings: BTreeSet<Binding>,
	schemes: SchemeRegistry,
	active_scheme: Option<Arc<str>>,
	scheme_chain: Chain,
	locale: String,
	locale_chain: Chain,
	platform: String,
	platform_chain: Chain,
	cache: BindingCache,
}

impl State {
	/// Re-derives the active scheme chain. Returns whether it changed.
	fn refresh_scheme_chain(&mut self) -> bool {
		let chain = match &self.active_scheme {
			Some(id) => self.schemes.chain(id),
			None => Chain::new(),
		};
		if chain == self.scheme_chain {
			return false;
		}
		self.scheme_chain = chain;
		true
	}
}

/// Resolves bindings for the current activation state and notifies listeners
/// when that state changes.
///
/// Every method takes `&self`; state is guarded by one lock and the current
/// resolution is published atomically, so queries that hit a published
/// resolution never block. Listeners run on the calling thread after the lock
/// is released and observe the post-change state.
pub struct BindingManager {
	contexts: Arc<dyn ContextSource>,
	state: Mutex<State>,
	active: ArcSwapOption<ResolvedBindings>,
	listeners: Mutex<Vec<(ListenerId, Arc<dyn BindingManagerListener>)>>,
}

impl BindingManager {
	/// Creates a manager reading contexts from `contexts`.
	///
	/// The manager does not subscribe to context changes; call
	/// [`recompute_bindings`](Self::recompute_bindings) after they happen or use
	/// [`attach`](Self::attach).
	pub fn new(contexts: Arc<dyn ContextSource>, config: BindingManagerConfig) -> Self {
		let locale = config.initial_locale();
		let platform = config.initial_platform();
		debug!(%locale, %platform, cache_capacity = ?config.cache_capacity, "binding manager created");

		Self {
			contexts,
			state: Mutex::new(State {
				bindings: BTreeSet::new(),
				schemes: SchemeRegistry::default(),
				active_scheme: None,
				scheme_chain: Chain::new(),
				locale_chain: expand_locale(&locale),
				locale,
				platform_chain: expand_platform(&platform),
				platform,
				cache: BindingCache::new(config.cache_capacity),
			}),
			active: ArcSwapOption::empty(),
			listeners: Mutex::new(Vec::new()),
		}
	}

	/// Creates a manager subscribed to `contexts`.
	///
	/// Context activation and definition changes recompute the resolution. The
	/// context manager holds the subscription weakly, so dropping the returned
	/// manager ends it.
	pub fn attach(contexts: Arc<ContextManager>, config: BindingManagerConfig) -> Arc<Self> {
		let manager = Arc::new(Self::new(Arc::clone(&contexts) as Arc<dyn ContextSource>, config));
		let listener: Weak<dyn ContextManagerListener> = Arc::downgrade(&manager) as Weak<dyn ContextManagerListener>;
		contexts.add_listener(listener);
		manager
	}

	/// Replaces the whole binding set.
	///
	/// An equal set is a no-op. Otherwise every cached resolution is dropped.
	/// Returns whether the set changed.
	pub fn set_bindings(&self, bindings: impl IntoIterator<Item = Binding>) -> bool {
		let next: BTreeSet<Binding> = bindings.into_iter().collect();
		self.update_bindings(|current| {
			if *current == next {
				return false;
			}
			*current = next;
			true
		})
	}

	/// Adds one binding. Returns whether it was not already present.
	pub fn add_binding(&self, binding: Binding) -> bool {
		self.update_bindings(|current| current.insert(binding))
	}

	/// Removes every binding selected by `filter`. Returns how many were removed.
	pub fn remove_bindings(&self, filter: &BindingFilter) -> usize {
		let mut removed = 0;
		self.update_bindings(|current| {
			let before = current.len();
			current.retain(|binding| !filter.matches(binding));
			removed = before - current.len();
			removed > 0
		});
		removed
	}

	fn update_bindings(&self, update: impl FnOnce(&mut BTreeSet<Binding>) -> bool) -> bool {
		let previous = {
			let mut state = self.state.lock();
			if !update(&mut state.bindings) {
				return false;
			}
			state.cache.clear();
			debug!(count = state.bindings.len(), "binding set replaced");
			self.active.swap(None)
		};

		self.fire(BindingManagerEvent {
			changes: Changes::ACTIVE_BINDINGS,
			scheme: None,
			previous,
		});
		true
	}

	/// Every binding, defined or not, in value order.
	pub fn bindings(&self) -> Vec<Binding> {
		self.state.lock().bindings.iter().cloned().collect()
	}

	/// Snapshot of the scheme, creating an undefined scheme if absent.
	pub fn scheme(&self, id: &str) -> Scheme {
		self.state.lock().schemes.get_or_create(id).clone()
	}

	/// Defines (or redefines) a scheme. Returns whether anything changed.
	///
	/// Redefining a scheme in the active chain re-derives the chain.
	pub fn define_scheme(&self, id: &str, name: &str, description: Option<&str>, parent_id: Option<&str>) -> bool {
		let (changes, previous) = {
			let mut state = self.state.lock();
			if !state.schemes.define(id, name, description, parent_id) {
				return false;
			}
			trace!(scheme = id, ?parent_id, "scheme defined");
			self.scheme_definition_changed(&mut state)
		};

		self.fire(BindingManagerEvent {
			changes,
			scheme: Some(SchemeChange {
				id: Arc::from(id),
				defined: true,
			}),
			previous,
		});
		true
	}

	/// Marks a scheme undefined. Returns whether it was defined.
	///
	/// Undefining the active scheme leaves no scheme active.
	pub fn undefine_scheme(&self, id: &str) -> bool {
		let (changes, previous) = {
			let mut state = self.state.lock();
			if !state.schemes.undefine(id) {
				return false;
			}
			trace!(scheme = id, "scheme undefined");
			let mut changes = Changes::empty();
			if state.active_scheme.as_deref() == Some(id) {
				debug!(scheme = id, "active scheme undefined; no scheme active");
				state.active_scheme = None;
				changes |= Changes::ACTIVE_SCHEME;
			}
			let (more, previous) = self.scheme_definition_changed(&mut state);
			(changes | more, previous)
		};

		self.fire(BindingManagerEvent {
			changes,
			scheme: Some(SchemeChange {
				id: Arc::from(id),
				defined: false,
			}),
			previous,
		});
		true
	}

	fn scheme_definition_changed(&self, state: &mut State) -> (Changes, Option<Arc<ResolvedBindings>>) {
		if state.refresh_scheme_chain() {
			(Changes::SCHEME_DEFINITION | Changes::ACTIVE_BINDINGS, self.active.swap(None))
		} else {
			(Changes::SCHEME_DEFINITION, None)
		}
	}

	pub fn defined_scheme_ids(&self) -> FxHashSet<Arc<str>> {
		self.state.lock().schemes.defined_ids()
	}

	/// Activates a defined scheme.
	///
	/// # Errors
	///
	/// Returns [`Error::SchemeNotDefined`] if the scheme is unknown or undefined;
	/// the active scheme is left unchanged.
	pub fn set_active_scheme(&self, id: &str) -> Result<()> {
		let previous = {
			let mut state = self.state.lock();
			if !state.schemes.get(id).is_some_and(Scheme::is_defined) {
				return Err(Error::SchemeNotDefined(Arc::from(id)));
			}
			if state.active_scheme.as_deref() == Some(id) {
				return Ok(());
			}
			state.active_scheme = Some(Arc::from(id));
			state.refresh_scheme_chain();
			debug!(scheme = id, chain = ?state.scheme_chain, "active scheme changed");
			self.active.swap(None)
		};

		self.fire(BindingManagerEvent {
			changes: Changes::ACTIVE_SCHEME | Changes::ACTIVE_BINDINGS,
			scheme: None,
			previous,
		});
		Ok(())
	}

	pub fn active_scheme(&self) -> Option<Scheme> {
		let state = self.state.lock();
		let id = state.active_scheme.as_deref()?;
		state.schemes.get(id).cloned()
	}

	/// Sets the locale, such as `en_GB`.
	pub fn set_locale(&self, locale: &str) {
		self.update_setting(Changes::LOCALE, |state| {
			if state.locale == locale {
				return false;
			}
			state.locale = locale.to_string();
			state.locale_chain = expand_locale(locale);
			true
		});
	}

	pub fn locale(&self) -> String {
		self.state.lock().locale.clone()
	}

	/// Sets the platform, such as `gtk` or `macos`.
	pub fn set_platform(&self, platform: &str) {
		self.update_setting(Changes::PLATFORM, |state| {
			if state.platform == platform {
				return false;
			}
			state.platform = platform.to_string();
			state.platform_chain = expand_platform(platform);
			true
		});
	}

	pub fn platform(&self) -> String {
		self.state.lock().platform.clone()
	}

	fn update_setting(&self, change: Changes, update: impl FnOnce(&mut State) -> bool) {
		let previous = {
			let mut state = self.state.lock();
			if !update(&mut state) {
				return;
			}
			debug!(locale = %state.locale, platform = %state.platform, "binding fallbacks changed");
			self.active.swap(None)
		};

		self.fire(BindingManagerEvent {
			changes: change | Changes::ACTIVE_BINDINGS,
			scheme: None,
			previous,
		});
	}

	/// Resolves bindings for the current state and publishes the result.
	///
	/// The result is served from the cache when an equal state was resolved
	/// before, so repeated calls without intervening changes return the same
	/// instance.
	pub fn recompute_bindings(&self) -> Arc<ResolvedBindings> {
		let mut state = self.state.lock();
		self.resolve_locked(&mut state)
	}

	fn resolve_locked(&self, state: &mut State) -> Arc<ResolvedBindings> {
		let key = CacheKey {
			context_tree: ContextTree::for_active(self.contexts.as_ref()),
			locales: state.locale_chain.clone(),
			platforms: state.platform_chain.clone(),
			schemes: state.scheme_chain.clone(),
		};
		let entry = state.cache.entry(key);
		let hit = entry.is_resolved();
		let resolved = entry.resolve(&state.bindings);
		trace!(hit, contexts = entry.key().context_tree.len(), triggers = resolved.len(), "bindings resolved");

		self.active.store(Some(Arc::clone(&resolved)));
		resolved
	}

	/// The published resolution, resolving first if none is published.
	pub fn active_bindings(&self) -> Arc<ResolvedBindings> {
		if let Some(active) = self.active.load_full() {
			return active;
		}
		let mut state = self.state.lock();
		if let Some(active) = self.active.load_full() {
			return active;
		}
		self.resolve_locked(&mut state)
	}

	/// The command bound to exactly `trigger`; `None` when unbound or unbound
	/// explicitly.
	pub fn perfect_match(&self, trigger: &TriggerSequence) -> Option<Arc<str>> {
		self.active_bindings().command(trigger).cloned()
	}

	/// Whether any resolved entry claims exactly `trigger`, unbindings included.
	pub fn is_perfect_match(&self, trigger: &TriggerSequence) -> bool {
		self.active_bindings().contains(trigger)
	}

	/// Resolved entries whose trigger strictly extends `prefix`.
	///
	/// An exact match is not a partial match. Unbindings are included with a
	/// `None` command.
	pub fn partial_matches(&self, prefix: &TriggerSequence) -> BTreeMap<TriggerSequence, Option<Arc<str>>> {
		self.active_bindings().partial_matches(prefix)
	}

	pub fn is_partial_match(&self, prefix: &TriggerSequence) -> bool {
		self.active_bindings().is_partial_match(prefix)
	}

	/// Triggers that currently resolve to `command`.
	pub fn active_bindings_for(&self, command: &str) -> Vec<TriggerSequence> {
		self.active_bindings().triggers_for(command)
	}

	/// Registers a listener, held strongly until removed.
	pub fn add_listener(&self, listener: Arc<dyn BindingManagerListener>) -> ListenerId {
		let id = ListenerId(NEXT_LISTENER.fetch_add(1, Ordering::Relaxed));
		self.listeners.lock().push((id, listener));
		id
	}

	/// Unregisters a listener; returns whether it was registered.
	pub fn remove_listener(&self, id: ListenerId) -> bool {
		let mut listeners = self.listeners.lock();
		let before = listeners.len();
		listeners.retain(|(existing, _)| *existing != id);
		listeners.len() != before
	}

	/// Recomputes after a context change and notifies if the resolution changed.
	fn contexts_changed(&self) {
		let (previous, resolved) = {
			let mut state = self.state.lock();
			let previous = self.active.load_full();
			(previous, self.resolve_locked(&mut state))
		};

		if previous.as_ref().is_some_and(|previous| Arc::ptr_eq(previous, &resolved)) {
			return;
		}
		self.fire(BindingManagerEvent {
			changes: Changes::ACTIVE_BINDINGS,
			scheme: None,
			previous,
		});
	}

	fn fire(&self, event: BindingManagerEvent) {
		let listeners: Vec<_> = self.listeners.lock().iter().map(|(_, listener)| Arc::clone(listener)).collect();
		trace!(changes = ?event.changes, listeners = listeners.len(), "binding manager changed");
		for listener in listeners {
			listener.binding_manager_changed(&event);
		}
	}
}

impl ContextManagerListener for BindingManager {
	fn context_manager_changed(&self, event: &ContextManagerEvent) {
		if event.active_contexts_changed || event.definition_changed.is_some() {
			self.contexts_changed();
		}
	}
}
