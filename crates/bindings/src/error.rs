//! Error types for binding management.

use std::sync::Arc;

use thiserror::Error;

/// Errors raised by the binding manager and its value types.
#[derive(Debug, Error)]
pub enum Error {
	/// The scheme is unknown or has been undefined.
	#[error("scheme `{0}` is not defined")]
	SchemeNotDefined(Arc<str>),

	/// A binding was constructed with a missing required field.
	#[error("invalid binding: {0}")]
	InvalidBinding(&'static str),

	/// A textual trigger sequence could not be parsed.
	#[error(transparent)]
	Trigger(#[from] bindery_trigger::ParseError),

	/// Manager configuration could not be deserialized.
	#[error("invalid binding manager configuration: {0}")]
	Config(#[from] toml::de::Error),
}

/// Result type for binding operations.
pub type Result<T> = std::result::Result<T, Error>;
