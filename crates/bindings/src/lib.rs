//! Binding resolution engine.
//!
//! A [`BindingManager`] holds every registered [`Binding`] and resolves them
//! against the activation state (active contexts, active [`Scheme`], locale and
//! platform) into one command per trigger sequence. Competing bindings are
//! ranked by scheme, context ancestry, binding type, platform and locale; an
//! unbinding suppresses lower ranked bindings on its trigger. Resolutions are
//! cached per activation state and published atomically for lock-free queries.

pub use binding::{Binding, BindingFilter, BindingType};
pub use cache::{BindingCache, CacheKey, CachedBindingSet};
pub use config::{BindingManagerConfig, default_locale, default_platform};
pub use context_tree::{ContextTree, filter_dialog_and_window};
pub use error::{Error, Result};
pub use event::{BindingManagerEvent, BindingManagerListener, Changes, ListenerId, SchemeChange};
pub use fallback::{Chain, expand_locale, expand_platform};
pub use manager::BindingManager;
pub use resolve::{BindingConflict, ResolveInput, ResolvedBindings, resolve};
pub use scheme::Scheme;

mod binding;
mod cache;
mod config;
mod context_tree;
mod error;
mod event;
mod fallback;
mod manager;
mod resolve;
mod scheme;
