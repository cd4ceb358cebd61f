use std::sync::Arc;

use bindery_context::ContextManager;
use parking_lot::Mutex;

use super::*;
use crate::binding::BindingType;

fn attached() -> (Arc<ContextManager>, Arc<BindingManager>) {
	let contexts = Arc::new(ContextManager::new());
	contexts.define("window", "Window", None, None);
	contexts.define("editor", "Editor", None, Some("window"));
	contexts.define("terminal", "Terminal", None, Some("window"));
	contexts.set_active_context_ids(["window", "editor", "terminal"]);

	let manager = BindingManager::attach(
		Arc::clone(&contexts),
		BindingManagerConfig {
			locale: Some("en".into()),
			platform: Some("gtk".into()),
			cache_capacity: None,
		},
	);
	manager.define_scheme("default", "Default", None, None);
	manager.set_active_scheme("default").unwrap();
	(contexts, manager)
}

fn seq(text: &str) -> TriggerSequence {
	TriggerSequence::parse(text).unwrap()
}

/// Must resolve candidates in unrelated contexts to the same command regardless
/// of the order the bindings were supplied in.
///
/// - Enforced in: `resolve::resolve`, `precedence::select_winner`
/// - Failure symptom: A shortcut flips between commands across restarts.
#[cfg_attr(test, test)]
pub(crate) fn test_unrelated_contexts_resolve_deterministically() {
	let bindings = vec![
		Binding::parse("ctrl+3", Some("editor-cmd"), "default", "editor").unwrap(),
		Binding::parse("ctrl+3", Some("terminal-cmd"), "default", "terminal").unwrap(),
	];

	let mut winners = Vec::new();
	for order in [bindings.clone(), bindings.into_iter().rev().collect()] {
		let (_, manager) = attached();
		manager.set_bindings(order);
		winners.push(manager.perfect_match(&seq("ctrl+3")));
		assert_eq!(manager.active_bindings().conflicts().len(), 1);
	}
	assert!(winners[0].is_some());
	assert_eq!(winners[0], winners[1]);
}

/// Must let a user binding override a system binding in an unrelated context.
///
/// - Enforced in: `precedence::select_winner`
/// - Failure symptom: A user shortcut in a shallow context loses to a system
///   binding only because the other feature's context sits deeper.
#[cfg_attr(test, test)]
pub(crate) fn test_user_binding_wins_over_unrelated_context() {
	let (contexts, manager) = attached();
	contexts.define("java-editor", "Java Editor", None, Some("editor"));
	contexts.activate("java-editor");
	manager.set_bindings([
		Binding::parse("ctrl+9", Some("system-java"), "default", "java-editor").unwrap(),
		Binding::parse("ctrl+9", Some("user-terminal"), "default", "terminal")
			.unwrap()
			.with_type(BindingType::User),
	]);
	assert_eq!(manager.perfect_match(&seq("ctrl+9")).as_deref(), Some("user-terminal"));
}

/// Must return the identical resolution for repeated recomputes of one state.
///
/// - Enforced in: `CachedBindingSet::resolve`, `BindingManager::resolve_locked`
/// - Failure symptom: Every focus change re-runs resolution over all bindings.
#[cfg_attr(test, test)]
pub(crate) fn test_recompute_is_served_from_cache() {
	let (_, manager) = attached();
	manager.set_bindings([Binding::parse("ctrl+1", Some("cmd"), "default", "window").unwrap()]);
	let first = manager.recompute_bindings();
	assert!(Arc::ptr_eq(&first, &manager.recompute_bindings()));
}

/// Must not notify or drop cached resolutions for an equal binding set.
///
/// - Enforced in: `BindingManager::set_bindings`
/// - Failure symptom: Reloading unchanged preferences flushes the cache and
///   makes every listener rebuild its key hints.
#[cfg_attr(test, test)]
pub(crate) fn test_equal_binding_set_is_silent() {
	let (_, manager) = attached();
	let bindings = [
		Binding::parse("ctrl+1", Some("a"), "default", "window").unwrap(),
		Binding::parse("ctrl+2", Some("b"), "default", "editor").unwrap(),
	];
	manager.set_bindings(bindings.clone());
	let events = Arc::new(Mutex::new(0usize));
	let counter = Arc::clone(&events);
	manager.add_listener(Arc::new(move |_: &BindingManagerEvent| *counter.lock() += 1));

	assert!(!manager.set_bindings(bindings));
	assert_eq!(*events.lock(), 0);
}

/// Must keep unbindings in the resolved map with no command, still claiming
/// their trigger as a perfect match.
///
/// - Enforced in: `resolve::resolve`
/// - Failure symptom: A user's "remove shortcut" preference is ignored and the
///   system binding fires again.
#[cfg_attr(test, test)]
pub(crate) fn test_unbinding_suppresses_system_binding() {
	let (_, manager) = attached();
	manager.set_bindings([
		Binding::parse("ctrl+2", None, "default", "window").unwrap().with_type(BindingType::User),
		Binding::parse("ctrl+2", Some("cmdC"), "default", "window").unwrap(),
	]);
	assert_eq!(manager.perfect_match(&seq("ctrl+2")), None);
	assert_eq!(manager.active_bindings().get(&seq("ctrl+2")), Some(None));
	assert!(manager.is_perfect_match(&seq("ctrl+2")));
}

/// Must leave the active scheme untouched when activating an undefined scheme.
///
/// - Enforced in: `BindingManager::set_active_scheme`
/// - Failure symptom: A typo in a preference silently disables every binding.
#[cfg_attr(test, test)]
pub(crate) fn test_failed_scheme_activation_keeps_state() {
	let (_, manager) = attached();
	manager.set_bindings([Binding::parse("ctrl+1", Some("cmd"), "default", "window").unwrap()]);
	let before = manager.active_bindings();

	assert!(manager.set_active_scheme("nope").is_err());
	assert_eq!(manager.active_scheme().map(|scheme| scheme.id().to_string()), Some("default".to_string()));
	assert!(Arc::ptr_eq(&before, &manager.active_bindings()));
}

/// Must notify listeners only after the manager lock is released.
///
/// - Enforced in: `BindingManager::fire`
/// - Failure symptom: A listener that queries the manager deadlocks.
#[cfg_attr(test, test)]
pub(crate) fn test_listeners_observe_post_change_state() {
	let (contexts, manager) = attached();
	contexts.deactivate("editor");
	manager.set_bindings([Binding::parse("ctrl+e", Some("edit"), "default", "editor").unwrap()]);

	let observed = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&observed);
	let observer = Arc::downgrade(&manager);
	manager.add_listener(Arc::new(move |_: &BindingManagerEvent| {
		if let Some(manager) = observer.upgrade() {
			sink.lock().push(manager.is_perfect_match(&TriggerSequence::parse("ctrl+e").unwrap()));
		}
	}));

	contexts.activate("editor");
	assert_eq!(observed.lock().as_slice(), &[true]);
}
