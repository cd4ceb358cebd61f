//! Candidate precedence policy for trigger conflict resolution.

use std::cmp::{Ordering, Reverse};

use crate::binding::{Binding, BindingType};
use crate::context_tree::ContextTree;

/// Comparable precedence tuple for one candidate binding.
///
/// Field order is the precedence order; lower compares first and wins. Context
/// ancestry sits between `scheme` and `kind` but is not a total order, so it is
/// applied by [`select_winner`] rather than encoded here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct CandidatePrecedence {
	/// Index of the binding's scheme in the active scheme chain.
	pub scheme: usize,
	pub kind: Reverse<BindingType>,
	/// Index of the binding's platform in the platform chain.
	pub platform: usize,
	/// Index of the binding's locale in the locale chain.
	pub locale: usize,
	/// `false` for unbindings, so they shadow bindings of equal rank.
	pub binds_command: bool,
}

/// One candidate for a trigger, ordered by precedence then by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Candidate<'b> {
	pub precedence: CandidatePrecedence,
	pub binding: &'b Binding,
}

impl PartialOrd for Candidate<'_> {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Candidate<'_> {
	fn cmp(&self, other: &Self) -> Ordering {
		compare_candidates(self, other)
	}
}

/// Compare two candidates ignoring context ancestry; `Less` means `a` wins.
///
/// Policy:
/// * Scheme: closer to the active scheme wins.
/// * Type: user bindings win over system bindings.
/// * Platform, then locale: more specific wins.
/// * An unbinding wins over a binding of equal rank.
/// * Stable tie-break uses the binding's value ordering.
pub(crate) fn compare_candidates(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
	a.precedence.cmp(&b.precedence).then_with(|| a.binding.cmp(b.binding))
}

/// Winner among candidates for one trigger, plus its closest rival from an
/// unrelated context.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Selection<'b> {
	pub winner: Candidate<'b>,
	pub rival: Option<Candidate<'b>>,
}

/// Picks the winner from candidates sorted by [`compare_candidates`].
///
/// Only candidates of the closest scheme compete. Among them, a candidate whose
/// context is a strict ancestor of another candidate's context is shadowed: the
/// descendant is the narrower context. Survivors share a context or sit on
/// unrelated lines, and the first survivor in sorted order wins.
pub(crate) fn select_winner<'b>(sorted: &[Candidate<'b>], tree: &ContextTree) -> Option<Selection<'b>> {
	let scheme = sorted.first()?.precedence.scheme;
	let contenders: Vec<_> = sorted.iter().take_while(|candidate| candidate.precedence.scheme == scheme).collect();

	let shadowed = |candidate: &Candidate<'_>| {
		contenders
			.iter()
			.any(|other| tree.is_ancestor(candidate.binding.context_id(), other.binding.context_id()))
	};
	let mut survivors = contenders.iter().copied().filter(|candidate| !shadowed(*candidate));

	// Cyclic parent links can shadow every contender.
	let winner = *survivors.next().or_else(|| contenders.first().copied())?;
	let rival = survivors
		.find(|candidate| candidate.binding.context_id() != winner.binding.context_id())
		.copied();

	Some(Selection { winner, rival })
}
