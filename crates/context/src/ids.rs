//! Well-known context identifiers.
//!
//! Contexts descending from these markers are only eligible for binding
//! resolution while the corresponding marker context is itself active.

/// Active while a dialog has focus.
pub const DIALOG: &str = "dialog";

/// Active while a top-level window has focus.
pub const WINDOW: &str = "window";

/// Parent of both [`DIALOG`] and [`WINDOW`]; satisfied by either one.
pub const DIALOG_AND_WINDOW: &str = "dialogAndWindow";
