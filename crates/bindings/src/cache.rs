//! Memoized resolutions keyed by the state that determines them.

use std::num::NonZeroUsize;
use std::sync::{Arc, OnceLock};

use lru::LruCache;

use crate::binding::Binding;
use crate::context_tree::ContextTree;
use crate::fallback::Chain;
use crate::resolve::{ResolveInput, ResolvedBindings, resolve};

/// Everything besides the binding set that influences a resolution.
///
/// The locale and platform chains always end in the unset entry. The scheme
/// chain is empty while no scheme is active; such a key is valid and resolves
/// to an empty set because no binding's scheme can match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
	pub context_tree: ContextTree,
	pub locales: Chain,
	pub platforms: Chain,
	pub schemes: Chain,
}

impl CacheKey {
	fn input(&self) -> ResolveInput<'_> {
		ResolveInput {
			tree: &self.context_tree,
			locales: &self.locales,
			platforms: &self.platforms,
			schemes: &self.schemes,
		}
	}
}

/// A cache key with its resolution, computed on first use.
#[derive(Debug)]
pub struct CachedBindingSet {
	key: CacheKey,
	resolved: OnceLock<Arc<ResolvedBindings>>,
}

impl CachedBindingSet {
	fn new(key: CacheKey) -> Self {
		Self {
			key,
			resolved: OnceLock::new(),
		}
	}

	pub fn key(&self) -> &CacheKey {
		&self.key
	}

	/// Returns the resolution, computing it from `bindings` the first time.
	///
	/// Later calls return the same instance regardless of `bindings`; the owning
	/// cache must be cleared whenever the binding set changes.
	pub fn resolve<'b>(&self, bindings: impl IntoIterator<Item = &'b Binding>) -> Arc<ResolvedBindings> {
		Arc::clone(self.resolved.get_or_init(|| Arc::new(resolve(bindings, &self.key.input()))))
	}

	pub fn is_resolved(&self) -> bool {
		self.resolved.get().is_some()
	}
}

/// Map from cache key to cached resolution.
///
/// Unbounded unless a capacity is given, in which case the least recently used
/// entry is evicted. Eviction only costs a recomputation.
#[derive(Debug)]
pub struct BindingCache {
	entries: LruCache<CacheKey, Arc<CachedBindingSet>>,
}

impl BindingCache {
	pub fn new(capacity: Option<NonZeroUsize>) -> Self {
		let entries = match capacity {
			Some(capacity) => LruCache::new(capacity),
			None => LruCache::unbounded(),
		};
		Self { entries }
	}

	/// Returns the entry for `key`, inserting an unresolved one if absent.
	pub fn entry(&mut self, key: CacheKey) -> Arc<CachedBindingSet> {
		if let Some(existing) = self.entries.get(&key) {
			return Arc::clone(existing);
		}
		let set = Arc::new(CachedBindingSet::new(key.clone()));
		self.entries.put(key, Arc::clone(&set));
		set
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl Default for BindingCache {
	fn default() -> Self {
		Self::new(None)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fallback::{expand_locale, expand_platform};

	fn key(locale: &str) -> CacheKey {
		CacheKey {
			context_tree: ContextTree::default(),
			locales: expand_locale(locale),
			platforms: expand_platform("gtk"),
			schemes: Chain::from_iter([Some(Arc::from("default"))]),
		}
	}

	#[test]
	fn equal_keys_share_an_entry() {
		let mut cache = BindingCache::default();
		let first = cache.entry(key("en"));
		let second = cache.entry(key("en"));
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(cache.len(), 1);
		assert!(!Arc::ptr_eq(&first, &cache.entry(key("de"))));
	}

	#[test]
	fn resolution_is_computed_once() {
		let mut cache = BindingCache::default();
		let set = cache.entry(key("en"));
		assert!(!set.is_resolved());
		let first = set.resolve(std::iter::empty());
		let binding = Binding::parse("ctrl+1", Some("cmd"), "default", "window").unwrap();
		let second = set.resolve([&binding]);
		assert!(set.is_resolved());
		assert!(Arc::ptr_eq(&first, &second));
	}

	#[test]
	fn bounded_cache_evicts_least_recently_used() {
		let mut cache = BindingCache::new(NonZeroUsize::new(2));
		let en = cache.entry(key("en"));
		cache.entry(key("de"));
		cache.entry(key("en"));
		cache.entry(key("fr"));
		assert_eq!(cache.len(), 2);
		assert!(Arc::ptr_eq(&en, &cache.entry(key("en"))));
		assert_eq!(cache.len(), 2);
	}

	#[test]
	fn empty_scheme_chain_resolves_nothing() {
		let contexts = bindery_context::ContextManager::new();
		contexts.define("window", "Window", None, None);
		let mut inactive = key("en");
		inactive.context_tree = ContextTree::build(&contexts, [Arc::<str>::from("window")]);
		let active = inactive.clone();
		inactive.schemes = Chain::new();

		let binding = Binding::parse("ctrl+1", Some("cmd"), "default", "window").unwrap();
		let mut cache = BindingCache::default();
		assert!(cache.entry(inactive).resolve([&binding]).is_empty());
		assert_eq!(cache.entry(active).resolve([&binding]).len(), 1);
		assert_eq!(cache.len(), 2);
	}

	#[test]
	fn clear_drops_entries() {
		let mut cache = BindingCache::default();
		let before = cache.entry(key("en"));
		cache.clear();
		assert!(cache.is_empty());
		assert!(!Arc::ptr_eq(&before, &cache.entry(key("en"))));
	}
}
