//! # Parser
//!
//! Parses plain-text trigger definitions into structured [`Trigger`] values. It
//! supports strokes such as `"ctrl+alt+f1"` or `"Ctrl-K"` and whitespace
//! separated sequences such as `"ctrl+k ctrl+c"`.
//!
//! ## Supported Syntax
//!
//! ```text
//! stroke    = modifiers* (mouse | key)
//! modifiers = modifier sep
//! modifier  = "ctrl" | "alt" | "shift" | "cmd" | "meta" | ...
//! sep       = "-" | "+"
//! mouse     = "mouse" sep? button
//! key       = fn-key | named-key | char
//! fn-key    = "f" digit digit?
//! named-key = "del" | "insert" | "end" | ...
//! char      = ascii-char
//! ```
//!
//! Names are case-insensitive and ASCII letters are normalised to lowercase, so
//! `CTRL+F` and `ctrl-f` parse to the same trigger.

use thiserror::Error;

use crate::key::{Key, KeyStroke, Modifiers, MouseButton};
use crate::sequence::Trigger;


/// Function pointer type for parser combinators.
type ParserFn<T> = fn(&mut Parser) -> Result<Option<T>, ParseError>;

/// Represents an error that occurred during parsing.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
	/// Human-readable description of the parse error.
	pub message: String,
	/// Byte offset in the input where the error occurred.
	pub position: usize,
}

fn is_sep(ch: char) -> bool {
	matches!(ch, '-' | '+')
}

/// Maintains the parser's state for recursive descent parsing.
struct Parser<'a> {
	input: &'a str,
	position: usize,
}

impl<'a> Parser<'a> {
	fn new(input: &'a str) -> Self {
		Self { input, position: 0 }
	}

	fn peek(&self) -> Option<char> {
		self.input.chars().next()
	}

	fn peek_at(&self, n: usize) -> Option<char> {
		self.input.chars().nth(n)
	}

	fn next(&mut self) -> Option<char> {
		let ch = self.peek()?;
		self.position += ch.len_utf8();
		self.input = &self.input[ch.len_utf8()..];
		Some(ch)
	}

	fn is_end(&self) -> bool {
		self.input.is_empty()
	}

	/// Consumes one separator character.
	fn take_sep(&mut self) -> Result<(), ParseError> {
		match self.next() {
			Some(ch) if is_sep(ch) => Ok(()),
			Some(ch) => Err(ParseError {
				message: format!("expected '-' or '+', found '{ch}'"),
				position: self.position - ch.len_utf8(),
			}),
			None => Err(self.error("expected '-' or '+', found end of input".to_string())),
		}
	}

	/// Attempts to parse with a fallback: restores state if parsing fails.
	fn try_parse<T, F>(&mut self, f: F) -> Result<Option<T>, ParseError>
	where
		F: FnOnce(&mut Parser<'a>) -> Result<Option<T>, ParseError>,
	{
		let snapshot = (self.input, self.position);
		match f(self) {
			Ok(Some(val)) => Ok(Some(val)),
			Ok(None) | Err(_) => {
				self.input = snapshot.0;
				self.position = snapshot.1;
				Ok(None)
			}
		}
	}

	fn take_while<F>(&mut self, predicate: F) -> String
	where
		F: Fn(char) -> bool,
	{
		let mut result = String::new();
		while let Some(ch) = self.peek() {
			if !predicate(ch) {
				break;
			}
			result.push(ch);
			self.next();
		}
		result
	}

	/// Tries multiple parsers in sequence, returning the result of the first successful one.
	fn alt<T>(&mut self, parsers: &[ParserFn<T>]) -> Result<Option<T>, ParseError> {
		for p in parsers {
			if let Some(value) = p(self)? {
				return Ok(Some(value));
			}
		}
		Ok(None)
	}

	fn error(&self, message: String) -> ParseError {
		ParseError {
			message,
			position: self.position,
		}
	}
}

/// Parses a single stroke into a [`Trigger`].
///
/// # Errors
///
/// Returns a [`ParseError`] if the input does not match the grammar.
pub fn parse(s: &str) -> Result<Trigger, ParseError> {
	let mut parser = Parser::new(s);
	let trigger = parse_stroke(&mut parser)?;

	if let Some(ch) = parser.peek() {
		return Err(parser.error(format!("expected end of input, found: {ch}")));
	}

	Ok(trigger)
}

/// Parses a whitespace-separated sequence of strokes.
///
/// An input made only of whitespace yields an empty sequence.
pub fn parse_seq(s: &str) -> Result<Vec<Trigger>, ParseError> {
	let mut triggers = Vec::new();
	let mut offset = 0;
	for part in s.split_whitespace() {
		let start = s[offset..].find(part).map_or(offset, |idx| offset + idx);
		offset = start + part.len();
		let trigger = parse(part).map_err(|err| ParseError {
			message: err.message,
			position: start + err.position,
		})?;
		triggers.push(trigger);
	}
	Ok(triggers)
}

fn parse_stroke(parser: &mut Parser) -> Result<Trigger, ParseError> {
	let mut modifiers = Modifiers::empty();

	while let Some(modifier) = try_parse_modifier(parser)? {
		if modifiers.contains(modifier) {
			return Err(parser.error("duplicate modifier".to_string()));
		}
		modifiers |= modifier;
	}

	if let Some(button) = try_parse_mouse(parser)? {
		return Ok(Trigger::Mouse { button, modifiers });
	}

	let key = parse_key(parser)?;
	Ok(Trigger::Key(KeyStroke::new(modifiers, key)))
}

/// Attempts to parse a single modifier followed by a separator.
fn try_parse_modifier(parser: &mut Parser) -> Result<Option<Modifiers>, ParseError> {
	parser.try_parse(|p| {
		let name = p.take_while(|ch| ch.is_ascii_alphabetic());
		let Some(modifier) = Modifiers::from_keyword(&name) else {
			return Ok(None);
		};
		if p.is_end() {
			return Ok(None);
		}
		p.take_sep()?;
		Ok(Some(modifier))
	})
}

/// Attempts to parse `mouse-left`, `mouse+right` or `MouseMiddle`.
fn try_parse_mouse(parser: &mut Parser) -> Result<Option<MouseButton>, ParseError> {
	parser.try_parse(|p| {
		let word = p.take_while(|ch| ch.is_ascii_alphabetic());
		let lower = word.to_ascii_lowercase();
		let Some(rest) = lower.strip_prefix("mouse") else {
			return Ok(None);
		};

		if !rest.is_empty() {
			return Ok(MouseButton::from_name(rest));
		}

		p.take_sep()?;
		let name = p.take_while(|ch| ch.is_ascii_alphabetic());
		match MouseButton::from_name(&name) {
			Some(button) => Ok(Some(button)),
			None => Err(p.error(format!("unknown mouse button: '{name}'"))),
		}
	})
}

fn parse_key(parser: &mut Parser) -> Result<Key, ParseError> {
	match parser.alt(&[try_parse_fn_key, try_parse_named_key, try_parse_char])? {
		Some(key) => Ok(key),
		None => Err(parser.error("expected a valid key".to_string())),
	}
}

/// Attempts to parse a function key (`f1` to `f35`).
///
/// Only activates when the input starts with `f` followed by a digit. Once
/// activated the digits must form a valid number or an error is returned.
fn try_parse_fn_key(parser: &mut Parser) -> Result<Option<Key>, ParseError> {
	if !matches!(parser.peek(), Some('f' | 'F')) {
		return Ok(None);
	}

	if !matches!(parser.peek_at(1), Some(ch) if ch.is_ascii_digit()) {
		return Ok(None);
	}

	parser.next();
	let num = parser.take_while(|ch| ch.is_ascii_digit());

	match num.parse::<u8>() {
		Ok(n) if (1..=35).contains(&n) => Ok(Some(Key::F(n))),
		_ => Err(parser.error("invalid function key number (must be 1-35)".to_string())),
	}
}

/// Attempts to parse a named key such as `"del"`, `"insert"`, or `"end"`.
fn try_parse_named_key(parser: &mut Parser) -> Result<Option<Key>, ParseError> {
	parser.try_parse(|p| {
		let name = p.take_while(|ch| ch.is_ascii_alphabetic());
		if name.len() < 2 {
			return Ok(None);
		}
		Ok(name.parse::<Key>().ok())
	})
}

fn try_parse_char(parser: &mut Parser) -> Result<Option<Key>, ParseError> {
	match parser.peek() {
		Some(ch) if ch.is_ascii() && !ch.is_ascii_whitespace() => {
			parser.next();
			Ok(Some(Key::Char(ch.to_ascii_lowercase())))
		}
		_ => Ok(None),
	}
}
