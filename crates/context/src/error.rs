//! Error types for context lookups.

use std::sync::Arc;

use thiserror::Error;

/// Errors raised while querying context definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
	/// The context exists only as a reference and has never been defined, or was undefined.
	#[error("context `{0}` is not defined")]
	NotDefined(Arc<str>),
}

/// Result type for context operations.
pub type Result<T> = std::result::Result<T, ContextError>;
