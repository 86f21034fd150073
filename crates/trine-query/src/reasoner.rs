//! Depth-bounded transitive reasoning.
//!
//! Treats one predicate as a directed graph (`x -> y` for every `(x, p, y)`)
//! and answers reachability questions within a hop budget. The relation may
//! contain cycles, so every traversal tracks what it has seen.
//!
//! # Depth
//!
//! Depth counts edges. With `max_depth = n`, a chain of `n` edges is found and
//! a chain of `n + 1` edges is not. Chains longer than the budget are reported
//! as unrelated.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use trine_index::TripleIndex;
use trine_types::TermId;

/// Hop budget used when the caller does not pick one.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Reachability queries along a single predicate.
#[derive(Clone, Copy, Debug)]
pub struct TransitiveReasoner<'a> {
    index: &'a TripleIndex,
}

impl<'a> TransitiveReasoner<'a> {
    pub fn new(index: &'a TripleIndex) -> Self {
        Self { index }
    }

    /// [`is_transitively_related`](Self::is_transitively_related) with [`DEFAULT_MAX_DEPTH`].
    pub fn is_related(&self, start: TermId, predicate: TermId, target: TermId) -> bool {
        self.is_transitively_related(start, predicate, target, DEFAULT_MAX_DEPTH)
    }

    /// Returns `true` if `target` is reachable from `start` in at most
    /// `max_depth` `predicate` edges.
    ///
    /// Depth-first with an explicit stack. The seen-map keeps the shallowest
    /// depth each node was reached at; a node is expanded again only when a
    /// strictly shorter route turns up, so stack order cannot hide a short
    /// path behind a long one.
    pub fn is_transitively_related(
        &self,
        start: TermId,
        predicate: TermId,
        target: TermId,
        max_depth: usize,
    ) -> bool {
        if max_depth == 0 || start.is_wildcard() || target.is_wildcard() {
            return false;
        }
        if !self.index.has_subject(predicate, start) || !self.index.has_object(predicate, target) {
            return false;
        }

        let mut shallowest: HashMap<TermId, usize> = HashMap::new();
        shallowest.insert(start, 0);
        let mut stack = vec![(start, 0usize)];
        let mut truncated = false;

        while let Some((node, depth)) = stack.pop() {
            if shallowest.get(&node).is_some_and(|&best| best < depth) {
                continue;
            }
            let next = depth + 1;
            for neighbor in self.index.objects(predicate, node) {
                if neighbor == target {
                    return true;
                }
                if next >= max_depth {
                    truncated |= self.index.has_subject(predicate, neighbor);
                    continue;
                }
                match shallowest.entry(neighbor) {
                    Entry::Occupied(mut seen) => {
                        if *seen.get() <= next {
                            continue;
                        }
                        seen.insert(next);
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(next);
                    }
                }
                stack.push((neighbor, next));
            }
        }

        if truncated {
            debug!(%start, %predicate, %target, max_depth, "transitive search hit depth bound");
        }
        false
    }

    /// Every term reachable from `start` within `max_depth` edges, in
    /// breadth-first discovery order. `start` itself appears only if it lies
    /// on a cycle within the bound.
    pub fn closure(&self, start: TermId, predicate: TermId, max_depth: usize) -> Vec<TermId> {
        let mut seen = HashSet::new();
        let mut reached = Vec::new();
        let mut queue = VecDeque::from([(start, 0usize)]);

        while let Some((node, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for neighbor in self.index.objects(predicate, node) {
                if seen.insert(neighbor) {
                    reached.push(neighbor);
                    queue.push_back((neighbor, depth + 1));
                }
            }
        }

        reached
    }
}
