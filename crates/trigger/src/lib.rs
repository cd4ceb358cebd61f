//! Trigger value types for binding resolution.
//!
//! Provides:
//! - [`Trigger`]: one atomic input event (a key stroke or a mouse click)
//! - [`TriggerSequence`]: an ordered chain of triggers (a multi-chord shortcut)
//! - A textual parser for strokes like `ctrl+shift+f` and sequences like `ctrl+k ctrl+c`

pub use key::{Key, KeyStroke, Modifiers, MouseButton};
pub use parser::{ParseError, parse, parse_seq};
pub use sequence::{Trigger, TriggerSequence};

mod key;
pub mod parser;
mod sequence;
