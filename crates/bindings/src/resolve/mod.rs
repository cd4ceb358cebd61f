//! Two-pass resolution of binding candidates into one command per trigger.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use bindery_trigger::TriggerSequence;
use rustc_hash::FxHashMap;

use crate::binding::Binding;
use crate::context_tree::ContextTree;
use crate::fallback::position;

mod precedence;

use precedence::{Candidate, CandidatePrecedence, Selection, select_winner};

/// Everything resolution needs besides the bindings themselves.
#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
	pub tree: &'a ContextTree,
	pub locales: &'a [Option<Arc<str>>],
	pub platforms: &'a [Option<Arc<str>>],
	pub schemes: &'a [Option<Arc<str>>],
}

/// Two candidates for one trigger whose contexts do not share an ancestor line.
///
/// Context ancestry could not separate them, so the winner was decided by type,
/// platform, locale or value order. This usually means two unrelated features
/// claim the same trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConflict {
	pub trigger: TriggerSequence,
	pub kept_command: Option<Arc<str>>,
	pub kept_context: Arc<str>,
	pub dropped_command: Option<Arc<str>>,
	pub dropped_context: Arc<str>,
}

/// Resolved trigger to command map for one state of the manager.
///
/// Unbindings stay in the map with a `None` command so that they still count as
/// "claimed" for lookups that need to know the trigger is taken.
#[derive(Debug, Clone, Default)]
pub struct ResolvedBindings {
	commands: FxHashMap<TriggerSequence, Option<Arc<str>>>,
	conflicts: Vec<BindingConflict>,
}

impl ResolvedBindings {
	/// Returns the resolution for `trigger`: `None` if nothing claims it,
	/// `Some(None)` if an unbinding won.
	pub fn get(&self, trigger: &TriggerSequence) -> Option<Option<&Arc<str>>> {
		self.commands.get(trigger).map(Option::as_ref)
	}

	/// The command bound to exactly `trigger`.
	pub fn command(&self, trigger: &TriggerSequence) -> Option<&Arc<str>> {
		self.get(trigger).flatten()
	}

	pub fn contains(&self, trigger: &TriggerSequence) -> bool {
		self.commands.contains_key(trigger)
	}

	pub fn len(&self) -> usize {
		self.commands.len()
	}

	pub fn is_empty(&self) -> bool {
		self.commands.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&TriggerSequence, Option<&Arc<str>>)> {
		self.commands.iter().map(|(trigger, command)| (trigger, command.as_ref()))
	}

	/// Entries whose trigger strictly extends `prefix`, unbindings included.
	///
	/// The empty prefix matches every non-empty trigger.
	pub fn partial_matches(&self, prefix: &TriggerSequence) -> BTreeMap<TriggerSequence, Option<Arc<str>>> {
		self.commands
			.iter()
			.filter(|(trigger, _)| trigger.starts_with(prefix, false))
			.map(|(trigger, command)| (trigger.clone(), command.clone()))
			.collect()
	}

	pub fn is_partial_match(&self, prefix: &TriggerSequence) -> bool {
		self.commands.keys().any(|trigger| trigger.starts_with(prefix, false))
	}

	/// Triggers that resolve to `command`, in trigger order.
	pub fn triggers_for(&self, command: &str) -> Vec<TriggerSequence> {
		let mut triggers: Vec<_> = self
			.commands
			.iter()
			.filter(|(_, bound)| bound.as_deref() == Some(command))
			.map(|(trigger, _)| trigger.clone())
			.collect();
		triggers.sort();
		triggers
	}

	pub fn conflicts(&self) -> &[BindingConflict] {
		&self.conflicts
	}
}

enum Candidates<'b> {
	Single(Candidate<'b>),
	Multiple(BTreeSet<Candidate<'b>>),
}

impl<'b> Candidates<'b> {
	fn push(&mut self, candidate: Candidate<'b>) {
		match self {
			Candidates::Single(first) => {
				let set = BTreeSet::from([*first, candidate]);
				*self = Candidates::Multiple(set);
			}
			Candidates::Multiple(set) => {
				set.insert(candidate);
			}
		}
	}
}

/// Resolves `bindings` against the given context tree and fallback chains.
///
/// A binding is a candidate only if its context is in the tree and its locale,
/// platform and scheme each appear in the respective chain. Among candidates
/// for one trigger, the precedence order picks the winner; context ancestry only
/// separates candidates on one ancestor line.
pub fn resolve<'b>(bindings: impl IntoIterator<Item = &'b Binding>, input: &ResolveInput<'_>) -> ResolvedBindings {
	let mut grouped: FxHashMap<&'b TriggerSequence, Candidates<'b>> = FxHashMap::default();

	for binding in bindings {
		let Some(precedence) = rank(binding, input) else {
			continue;
		};
		let candidate = Candidate { precedence, binding };
		match grouped.get_mut(binding.trigger()) {
			Some(existing) => existing.push(candidate),
			None => {
				grouped.insert(binding.trigger(), Candidates::Single(candidate));
			}
		}
	}

	let mut commands = FxHashMap::default();
	commands.reserve(grouped.len());
	let mut conflicts = Vec::new();

	for (trigger, candidates) in grouped {
		let winner = match candidates {
			Candidates::Single(only) => only,
			Candidates::Multiple(set) => {
				let sorted: Vec<_> = set.into_iter().collect();
				let Some(Selection { winner, rival }) = select_winner(&sorted, input.tree) else {
					continue;
				};
				if let Some(rival) = rival {
					conflicts.push(conflict_between(trigger, &winner, &rival));
				}
				winner
			}
		};
		commands.insert(trigger.clone(), winner.binding.command_id().cloned());
	}

	if !conflicts.is_empty() {
		conflicts.sort_by(|a, b| a.trigger.cmp(&b.trigger));
		let samples: Vec<_> = conflicts.iter().take(5).collect();
		tracing::debug!(count = conflicts.len(), ?samples, "binding conflicts detected");
	}

	ResolvedBindings { commands, conflicts }
}

fn rank(binding: &Binding, input: &ResolveInput<'_>) -> Option<CandidatePrecedence> {
	if !input.tree.contains(binding.context_id()) {
		return None;
	}
	let locale = position(input.locales, binding.locale())?;
	let platform = position(input.platforms, binding.platform())?;
	let scheme = position(input.schemes, Some(binding.scheme_id()))?;

	Some(CandidatePrecedence {
		scheme,
		kind: Reverse(binding.kind()),
		platform,
		locale,
		binds_command: !binding.is_unbinding(),
	})
}

fn conflict_between(trigger: &TriggerSequence, kept: &Candidate<'_>, dropped: &Candidate<'_>) -> BindingConflict {
	let (kept, dropped) = (kept.binding, dropped.binding);
	BindingConflict {
		trigger: trigger.clone(),
		kept_command: kept.command_id().cloned(),
		kept_context: Arc::from(kept.context_id()),
		dropped_command: dropped.command_id().cloned(),
		dropped_context: Arc::from(dropped.context_id()),
	}
}
