//! Key stroke representation.
//!
//! A [`KeyStroke`] pairs a [`Key`] with a set of [`Modifiers`]. Strokes are plain
//! values: copyable, hashable and totally ordered so that trigger sequences built
//! from them can be used as map keys and sorted deterministically.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

bitflags! {
	/// Modifier keys held while a trigger fires.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
	pub struct Modifiers: u8 {
		const CTRL = 1 << 0;
		const ALT = 1 << 1;
		const SHIFT = 1 << 2;
		/// Command key on macOS, super/windows key elsewhere.
		const META = 1 << 3;
	}
}

impl Modifiers {
	/// Display order used when formatting strokes.
	const ORDERED: [(Modifiers, &'static str); 4] = [
		(Modifiers::CTRL, "Ctrl"),
		(Modifiers::ALT, "Alt"),
		(Modifiers::SHIFT, "Shift"),
		(Modifiers::META, "Cmd"),
	];

	/// Parses a single modifier name, case-insensitively.
	pub fn from_keyword(name: &str) -> Option<Self> {
		match name.to_ascii_lowercase().as_str() {
			"ctrl" | "control" => Some(Modifiers::CTRL),
			"alt" | "option" => Some(Modifiers::ALT),
			"shift" => Some(Modifiers::SHIFT),
			"cmd" | "meta" | "super" | "command" => Some(Modifiers::META),
			_ => None,
		}
	}

	pub(crate) fn write_prefix(self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (flag, label) in Self::ORDERED {
			if self.contains(flag) {
				write!(f, "{label}+")?;
			}
		}
		Ok(())
	}
}

/// A physical or logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
	Backspace,
	BackTab,
	Delete,
	Down,
	End,
	Enter,
	Esc,
	F(u8),
	Home,
	Insert,
	Left,
	PageDown,
	PageUp,
	Right,
	Space,
	Tab,
	Up,
	Char(char),
}

impl Key {
	fn name(self) -> Option<&'static str> {
		Some(match self {
			Key::Backspace => "Backspace",
			Key::BackTab => "BackTab",
			Key::Delete => "Del",
			Key::Down => "Down",
			Key::End => "End",
			Key::Enter => "Enter",
			Key::Esc => "Esc",
			Key::Home => "Home",
			Key::Insert => "Insert",
			Key::Left => "Left",
			Key::PageDown => "PgDn",
			Key::PageUp => "PgUp",
			Key::Right => "Right",
			Key::Space => "Space",
			Key::Tab => "Tab",
			Key::Up => "Up",
			Key::F(_) | Key::Char(_) => return None,
		})
	}
}

impl FromStr for Key {
	type Err = ();

	/// Parses a named key (not single characters or function keys).
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s.to_ascii_lowercase().as_str() {
			"backspace" | "bs" => Key::Backspace,
			"backtab" => Key::BackTab,
			"del" | "delete" => Key::Delete,
			"down" => Key::Down,
			"end" => Key::End,
			"enter" | "ret" | "return" | "cr" => Key::Enter,
			"esc" | "escape" => Key::Esc,
			"home" => Key::Home,
			"ins" | "insert" => Key::Insert,
			"left" => Key::Left,
			"pgdn" | "pagedown" => Key::PageDown,
			"pgup" | "pageup" => Key::PageUp,
			"right" => Key::Right,
			"space" | "spc" => Key::Space,
			"tab" => Key::Tab,
			"up" => Key::Up,
			_ => return Err(()),
		})
	}
}

impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Key::F(n) => write!(f, "F{n}"),
			Key::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
			named => f.write_str(named.name().unwrap_or_default()),
		}
	}
}

/// One key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyStroke {
	pub modifiers: Modifiers,
	pub key: Key,
}

impl KeyStroke {
	pub const fn new(modifiers: Modifiers, key: Key) -> Self {
		Self { modifiers, key }
	}

	/// A plain character key without modifiers.
	///
	/// Letters are normalised to lowercase so that `Ctrl+F` and `ctrl-f` compare equal.
	pub const fn char(c: char) -> Self {
		Self::new(Modifiers::empty(), Key::Char(c.to_ascii_lowercase()))
	}

	pub const fn ctrl(c: char) -> Self {
		Self::new(Modifiers::CTRL, Key::Char(c.to_ascii_lowercase()))
	}

	pub const fn alt(c: char) -> Self {
		Self::new(Modifiers::ALT, Key::Char(c.to_ascii_lowercase()))
	}

	pub const fn with_shift(self) -> Self {
		Self::new(self.modifiers.union(Modifiers::SHIFT), self.key)
	}
}

impl From<Key> for KeyStroke {
	fn from(key: Key) -> Self {
		Self::new(Modifiers::empty(), key)
	}
}

impl fmt::Display for KeyStroke {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.modifiers.write_prefix(f)?;
		write!(f, "{}", self.key)
	}
}

/// Mouse button used by mouse triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MouseButton {
	Left,
	Middle,
	Right,
}

impl MouseButton {
	pub fn from_name(name: &str) -> Option<Self> {
		match name.to_ascii_lowercase().as_str() {
			"left" => Some(MouseButton::Left),
			"middle" => Some(MouseButton::Middle),
			"right" => Some(MouseButton::Right),
			_ => None,
		}
	}
}

impl fmt::Display for MouseButton {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			MouseButton::Left => "Left",
			MouseButton::Middle => "Middle",
			MouseButton::Right => "Right",
		})
	}
}
