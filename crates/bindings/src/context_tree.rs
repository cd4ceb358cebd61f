//! Snapshot of the active context hierarchy used for one resolution.

use std::collections::BTreeMap;
use std::sync::Arc;

use bindery_context::{ContextSource, ids};
use rustc_hash::FxHashSet;
use tracing::trace;

/// Upper bound on parent walks; guards against cyclic context definitions.
const MAX_DEPTH: usize = 64;

/// Map of child context id to parent id covering the eligible active contexts
/// and all of their ancestors.
///
/// The map is ordered so that the tree can be hashed and compared as part of a
/// cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ContextTree {
	parents: BTreeMap<Arc<str>, Option<Arc<str>>>,
}

impl ContextTree {
	/// Builds the tree for the source's active contexts after dialog/window filtering.
	pub fn for_active(source: &dyn ContextSource) -> Self {
		let mut active = source.active_context_ids();
		filter_dialog_and_window(source, &mut active);
		Self::build(source, active)
	}

	/// Builds the tree by ascending from each id through its parents.
	///
	/// Ascent stops at a root, at a context whose parent cannot be resolved, or
	/// at a context already in the tree.
	pub fn build(source: &dyn ContextSource, ids: impl IntoIterator<Item = Arc<str>>) -> Self {
		let mut parents = BTreeMap::new();

		for id in ids {
			let mut child = id;
			for _ in 0..MAX_DEPTH {
				if parents.contains_key(&child) {
					break;
				}
				let Ok(parent) = source.parent_of(&child) else {
					trace!(context = %child, "undefined context; ascent stopped");
					break;
				};
				parents.insert(Arc::clone(&child), parent.clone());
				match parent {
					Some(parent) => child = parent,
					None => break,
				}
			}
		}

		Self { parents }
	}

	pub fn contains(&self, id: &str) -> bool {
		self.parents.contains_key(id)
	}

	pub fn parent(&self, id: &str) -> Option<&str> {
		self.parents.get(id)?.as_deref()
	}

	/// Number of ancestors of `id` present in the tree. Roots have depth zero.
	pub fn depth(&self, id: &str) -> usize {
		let mut depth = 0;
		let mut current = id;
		while let Some(parent) = self.parent(current) {
			if !self.contains(parent) {
				break;
			}
			depth += 1;
			if depth >= MAX_DEPTH {
				break;
			}
			current = parent;
		}
		depth
	}

	/// Returns whether `ancestor` is a strict ancestor of `descendant`.
	pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
		let mut current = descendant;
		for _ in 0..MAX_DEPTH {
			match self.parent(current) {
				Some(parent) if parent == ancestor => return true,
				Some(parent) => current = parent,
				None => return false,
			}
		}
		false
	}

	/// Returns whether the two contexts lie on one ancestor line.
	pub fn related(&self, a: &str, b: &str) -> bool {
		a == b || self.is_ancestor(a, b) || self.is_ancestor(b, a)
	}

	pub fn len(&self) -> usize {
		self.parents.len()
	}

	pub fn is_empty(&self) -> bool {
		self.parents.is_empty()
	}

	pub fn ids(&self) -> impl Iterator<Item = &str> {
		self.parents.keys().map(|id| id.as_ref())
	}
}

/// Removes contexts that live under an inactive dialog or window marker.
///
/// The nearest marker ancestor decides: [`ids::DIALOG`] requires the dialog
/// context active, [`ids::WINDOW`] the window context, and
/// [`ids::DIALOG_AND_WINDOW`] either of them. A context whose ancestry cannot
/// be resolved is kept.
pub fn filter_dialog_and_window(source: &dyn ContextSource, active: &mut FxHashSet<Arc<str>>) {
	let dialog = active.contains(ids::DIALOG);
	let window = active.contains(ids::WINDOW);

	active.retain(|id| {
		let mut parent = source.parent_of(id).ok().flatten();
		for _ in 0..MAX_DEPTH {
			let Some(current) = parent else {
				return true;
			};
			let eligible = match &*current {
				ids::DIALOG => Some(dialog),
				ids::WINDOW => Some(window),
				ids::DIALOG_AND_WINDOW => Some(dialog || window),
				_ => None,
			};
			if let Some(eligible) = eligible {
				if !eligible {
					trace!(context = %id, marker = %current, "context filtered: marker context inactive");
				}
				return eligible;
			}
			parent = match source.parent_of(&current) {
				Ok(next) => next,
				Err(_) => return true,
			};
		}
		true
	});
}

#[cfg(test)]
mod tests {
	use bindery_context::ContextManager;

	use super::*;

	fn manager() -> ContextManager {
		let manager = ContextManager::new();
		manager.define(ids::DIALOG_AND_WINDOW, "Dialogs and Windows", None, None);
		manager.define(ids::DIALOG, "Dialogs", None, Some(ids::DIALOG_AND_WINDOW));
		manager.define(ids::WINDOW, "Windows", None, Some(ids::DIALOG_AND_WINDOW));
		manager.define("editor", "Editor", None, Some(ids::WINDOW));
		manager.define("java-editor", "Java Editor", None, Some("editor"));
		manager.define("find-dialog", "Find", None, Some(ids::DIALOG));
		manager.define("text", "Text", None, Some(ids::DIALOG_AND_WINDOW));
		manager.define("console", "Console", None, None);
		manager
	}

	fn arcs(ids: &[&str]) -> FxHashSet<Arc<str>> {
		ids.iter().map(|id| Arc::from(*id)).collect()
	}

	#[test]
	fn tree_covers_ancestors() {
		let manager = manager();
		let tree = ContextTree::build(&manager, arcs(&["java-editor"]));
		let mut names: Vec<_> = tree.ids().collect();
		names.sort();
		assert_eq!(names, vec![ids::DIALOG_AND_WINDOW, "editor", "java-editor", ids::WINDOW]);
		assert_eq!(tree.parent("java-editor"), Some("editor"));
		assert_eq!(tree.parent(ids::DIALOG_AND_WINDOW), None);
	}

	#[test]
	fn undefined_context_stops_ascent() {
		let manager = manager();
		manager.define("orphan", "Orphan", None, Some("never-defined"));
		let tree = ContextTree::build(&manager, arcs(&["orphan", "unknown"]));
		assert!(tree.contains("orphan"));
		assert!(!tree.contains("never-defined"));
		assert!(!tree.contains("unknown"));
		assert_eq!(tree.depth("orphan"), 0);
	}

	#[test]
	fn cyclic_definitions_terminate() {
		let manager = ContextManager::new();
		manager.define("a", "A", None, Some("b"));
		manager.define("b", "B", None, Some("a"));
		let tree = ContextTree::build(&manager, arcs(&["a"]));
		assert_eq!(tree.len(), 2);
		assert!(tree.depth("a") < MAX_DEPTH + 1);
	}

	#[test]
	fn depth_and_ancestry() {
		let manager = manager();
		let tree = ContextTree::build(&manager, arcs(&["java-editor", "console"]));
		assert_eq!(tree.depth(ids::DIALOG_AND_WINDOW), 0);
		assert_eq!(tree.depth("java-editor"), 3);
		assert!(tree.is_ancestor("editor", "java-editor"));
		assert!(!tree.is_ancestor("java-editor", "editor"));
		assert!(tree.related("editor", "java-editor"));
		assert!(!tree.related("console", "editor"));
	}

	#[test]
	fn dialog_contexts_need_active_dialog() {
		let manager = manager();
		let mut active = arcs(&[ids::WINDOW, "editor", "find-dialog", "text", "console"]);
		filter_dialog_and_window(&manager, &mut active);
		assert_eq!(active, arcs(&[ids::WINDOW, "editor", "text", "console"]));
	}

	#[test]
	fn window_contexts_need_active_window() {
		let manager = manager();
		let mut active = arcs(&[ids::DIALOG, "editor", "find-dialog", "text"]);
		filter_dialog_and_window(&manager, &mut active);
		assert_eq!(active, arcs(&[ids::DIALOG, "find-dialog", "text"]));
	}

	#[test]
	fn dialog_and_window_needs_either_marker() {
		let manager = manager();
		let mut active = arcs(&["text", "console"]);
		filter_dialog_and_window(&manager, &mut active);
		assert_eq!(active, arcs(&["console"]));
	}

	#[test]
	fn for_active_applies_filter() {
		let manager = manager();
		manager.set_active_context_ids(["editor", "find-dialog", ids::WINDOW]);
		let tree = ContextTree::for_active(&manager);
		assert!(tree.contains("editor"));
		assert!(!tree.contains("find-dialog"));
		assert!(!tree.contains(ids::DIALOG));
	}
}
