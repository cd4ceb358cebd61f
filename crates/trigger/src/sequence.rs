use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use rustc_hash::FxHasher;

use crate::key::{KeyStroke, Modifiers, MouseButton};
use crate::parser::{ParseError, parse_seq};

/// One atomic input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Trigger {
	Key(KeyStroke),
	Mouse { button: MouseButton, modifiers: Modifiers },
}

impl From<KeyStroke> for Trigger {
	fn from(stroke: KeyStroke) -> Self {
		Trigger::Key(stroke)
	}
}

impl fmt::Display for Trigger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Trigger::Key(stroke) => write!(f, "{stroke}"),
			Trigger::Mouse { button, modifiers } => {
				modifiers.write_prefix(f)?;
				write!(f, "Mouse{button}")
			}
		}
	}
}

/// Ordered, immutable chain of triggers.
///
/// Cloning is cheap (the triggers are shared) and the hash is computed at most
/// once per allocation, since sequences are hashed and compared repeatedly while
/// bindings are resolved and partial matches are searched.
#[derive(Clone)]
pub struct TriggerSequence {
	triggers: Arc<[Trigger]>,
	hash: OnceLock<u64>,
}

impl TriggerSequence {
	pub fn new(triggers: impl IntoIterator<Item = Trigger>) -> Self {
		Self {
			triggers: triggers.into_iter().collect(),
			hash: OnceLock::new(),
		}
	}

	/// The empty sequence, meaning "no trigger".
	pub fn empty() -> Self {
		Self::new([])
	}

	/// Parses a whitespace separated list of strokes such as `"ctrl+k ctrl+c"`.
	pub fn parse(text: &str) -> Result<Self, ParseError> {
		Ok(Self::new(parse_seq(text)?))
	}

	pub fn triggers(&self) -> &[Trigger] {
		&self.triggers
	}

	pub fn len(&self) -> usize {
		self.triggers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.triggers.is_empty()
	}

	/// Returns whether `prefix` is a prefix of this sequence.
	///
	/// With `equals_ok` false, a sequence equal to `self` does not count.
	pub fn starts_with(&self, prefix: &TriggerSequence, equals_ok: bool) -> bool {
		if !equals_ok && prefix.len() == self.len() {
			return false;
		}
		self.triggers.starts_with(&prefix.triggers)
	}

	/// Returns whether `suffix` is a suffix of this sequence.
	///
	/// With `equals_ok` false, a sequence equal to `self` does not count.
	pub fn ends_with(&self, suffix: &TriggerSequence, equals_ok: bool) -> bool {
		if !equals_ok && suffix.len() == self.len() {
			return false;
		}
		self.triggers.ends_with(&suffix.triggers)
	}

	/// Returns the sequence without its last trigger, or `None` when empty.
	pub fn parent(&self) -> Option<TriggerSequence> {
		let (_, rest) = self.triggers.split_last()?;
		Some(Self::new(rest.iter().copied()))
	}

	fn fingerprint(&self) -> u64 {
		*self.hash.get_or_init(|| {
			let mut hasher = FxHasher::default();
			self.triggers.hash(&mut hasher);
			hasher.finish()
		})
	}
}

impl Default for TriggerSequence {
	fn default() -> Self {
		Self::empty()
	}
}

impl PartialEq for TriggerSequence {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.triggers, &other.triggers) || (self.fingerprint() == other.fingerprint() && self.triggers == other.triggers)
	}
}

impl Eq for TriggerSequence {}

impl Hash for TriggerSequence {
	fn hash<H: Hasher>(&self, state: &mut H) {
		state.write_u64(self.fingerprint());
	}
}

impl PartialOrd for TriggerSequence {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for TriggerSequence {
	fn cmp(&self, other: &Self) -> Ordering {
		self.triggers.cmp(&other.triggers)
	}
}

impl fmt::Debug for TriggerSequence {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TriggerSequence({self})")
	}
}

impl fmt::Display for TriggerSequence {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (idx, trigger) in self.triggers.iter().enumerate() {
			if idx > 0 {
				f.write_str(" ")?;
			}
			write!(f, "{trigger}")?;
		}
		Ok(())
	}
}

impl FromStr for TriggerSequence {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl FromIterator<Trigger> for TriggerSequence {
	fn from_iter<I: IntoIterator<Item = Trigger>>(iter: I) -> Self {
		Self::new(iter)
	}
}

impl From<KeyStroke> for TriggerSequence {
	fn from(stroke: KeyStroke) -> Self {
		Self::new([Trigger::Key(stroke)])
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use proptest::prelude::*;

	use super::*;
	use crate::key::Key;

	fn seq(text: &str) -> TriggerSequence {
		TriggerSequence::parse(text).unwrap()
	}

	#[test]
	fn equal_sequences_hash_alike() {
		let mut set = HashSet::new();
		set.insert(seq("ctrl+k ctrl+c"));
		assert!(set.contains(&seq("Ctrl-K Ctrl-C")));
		assert!(!set.contains(&seq("ctrl+k")));
	}

	#[test]
	fn starts_with_respects_equals_flag() {
		let full = seq("ctrl+k ctrl+c");
		assert!(full.starts_with(&seq("ctrl+k"), false));
		assert!(full.starts_with(&full, true));
		assert!(!full.starts_with(&full, false));
		assert!(!full.starts_with(&seq("ctrl+c"), true));
		assert!(full.starts_with(&TriggerSequence::empty(), false));
	}

	#[test]
	fn ends_with_respects_equals_flag() {
		let full = seq("ctrl+k ctrl+c");
		assert!(full.ends_with(&seq("ctrl+c"), false));
		assert!(!full.ends_with(&full, false));
		assert!(full.ends_with(&full, true));
		assert!(!full.ends_with(&seq("ctrl+k"), true));
	}

	#[test]
	fn empty_sequence_is_not_its_own_strict_prefix() {
		let empty = TriggerSequence::empty();
		assert!(empty.starts_with(&empty, true));
		assert!(!empty.starts_with(&empty, false));
	}

	#[test]
	fn display_reparses_to_equal_sequence() {
		for text in ["ctrl+shift+f", "ctrl-k ctrl-c", "alt+enter", "f5", "mouse-left", "ctrl++", "cmd+pgup"] {
			let parsed = seq(text);
			let shown = parsed.to_string();
			assert_eq!(seq(&shown), parsed, "{text} rendered as {shown}");
		}
	}

	#[test]
	fn parent_drops_last_trigger() {
		assert_eq!(seq("ctrl+k ctrl+c").parent(), Some(seq("ctrl+k")));
		assert_eq!(TriggerSequence::empty().parent(), None);
	}

	fn arb_trigger() -> impl Strategy<Value = Trigger> {
		(0u8..16, prop::char::range('a', 'z')).prop_map(|(mods, c)| Trigger::Key(KeyStroke::new(Modifiers::from_bits_truncate(mods), Key::Char(c))))
	}

	proptest! {
		#[test]
		fn starts_with_implies_elementwise_prefix(
			triggers in prop::collection::vec(arb_trigger(), 0..6),
			cut in 0usize..7,
		) {
			let full = TriggerSequence::new(triggers.iter().copied());
			let cut = cut.min(triggers.len());
			let prefix = TriggerSequence::new(triggers[..cut].iter().copied());

			prop_assert!(full.starts_with(&prefix, true));
			prop_assert_eq!(full.starts_with(&prefix, false), cut < triggers.len());
			prop_assert_eq!(&full.triggers()[..prefix.len()], prefix.triggers());
		}

		#[test]
		fn starts_with_never_accepts_a_mismatch(
			a in prop::collection::vec(arb_trigger(), 1..5),
			b in prop::collection::vec(arb_trigger(), 1..5),
		) {
			let full = TriggerSequence::new(a.iter().copied());
			let other = TriggerSequence::new(b.iter().copied());
			if full.starts_with(&other, true) {
				prop_assert!(other.len() <= full.len());
				prop_assert_eq!(&a[..b.len()], &b[..]);
			}
		}
	}
}
