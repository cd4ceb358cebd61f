//! Activation contexts.
//!
//! Contexts form a tree through their parent ids and are switched on and off by
//! the host as focus moves. Binding resolution reads them through the
//! [`ContextSource`] trait and listens for changes through
//! [`ContextManagerListener`].

pub use error::{ContextError, Result};
pub use manager::{Context, ContextListenerId, ContextManager, ContextManagerEvent, ContextManagerListener, ContextSource};

mod error;
pub mod ids;
mod manager;
