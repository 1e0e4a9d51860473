//! Circular fund flow detection.
//!
//! Finds simple directed cycles with 3 to 5 accounts. Every cycle is reported
//! once in canonical rotation (smallest account id first, direction kept),
//! and cycles over an identical member set collapse into the first one found.
//!
//! # Search
//!
//! The primary search enumerates every bounded simple cycle exactly once: it
//! roots a depth-first search at each account in ascending id order and only
//! walks through accounts with a larger id than the root, so the root is
//! already the canonical first member. Successors are visited in ascending id
//! order, which fixes the order in which rings are registered.
//!
//! Enumeration is exponential in the worst case. When it exceeds the
//! configured expansion budget the detector falls back to a cheaper bounded
//! search that expands every account at most once per root and only reports
//! closures back to that root. The fallback may miss cycles but still obeys
//! the same canonicalisation, de-duplication and scoring.

#![allow(clippy::cast_precision_loss)]

use std::collections::{BTreeSet, HashSet};

use mulenet_core::round::round_score;
use petgraph::graph::NodeIndex;
use tracing::{debug, instrument, warn};

use crate::context::{MAX_SCORE, Pattern, PatternType, Ring, RunContext};
use crate::detect::Detector;
use crate::error::{DetectError, SearchBudget};
use crate::graph::TransactionGraph;

/// Shortest cycle reported.
pub const MIN_CYCLE_LEN: usize = 3;
/// Longest cycle reported; also the search depth bound.
pub const MAX_CYCLE_LEN: usize = 5;
/// Fewest non-hub accounts a cycle needs to become a ring.
const MIN_RING_MEMBERS: usize = 2;

/// Detects circular flows and registers them as `cycle` rings.
#[derive(Debug, Clone, Copy)]
pub struct CycleDetector {
    budget: usize,
}

impl CycleDetector {
    #[must_use]
    pub const fn new(budget: usize) -> Self {
        Self { budget }
    }
}

impl Detector for CycleDetector {
    fn name(&self) -> &'static str {
        "cycle"
    }

    #[instrument(skip_all, name = "detect_cycles")]
    fn detect(&self, ctx: &mut RunContext<'_>) -> Result<(), DetectError> {
        let graph = ctx.graph();

        let cycles = match enumerate_cycles(graph, self.budget) {
            Ok(cycles) => cycles,
            Err(err) => {
                warn!(
                    code = %err.code(),
                    error = %err,
                    "cycle enumeration exhausted its budget; using bounded root-closure search"
                );
                root_closure_cycles(graph)
            }
        };

        let mut seen_sets: HashSet<BTreeSet<NodeIndex>> = HashSet::new();
        let mut registered = 0usize;
        for cycle in cycles {
            if !seen_sets.insert(cycle.iter().copied().collect()) {
                continue;
            }
            if register_cycle(ctx, &cycle) {
                registered += 1;
            }
        }

        debug!(rings = registered, "cycle detection finished");
        Ok(())
    }
}

/// Register one canonical cycle as a ring and flag its members.
///
/// Hubs stay out of the member list but still count as hops: length, flow
/// and risk come from the full cycle. A cycle with fewer than two non-hub
/// accounts is not registered.
fn register_cycle(ctx: &mut RunContext<'_>, cycle: &[NodeIndex]) -> bool {
    let graph = ctx.graph();
    let members: Vec<NodeIndex> = cycle
        .iter()
        .copied()
        .filter(|&idx| !ctx.is_hub(idx))
        .collect();
    if members.len() < MIN_RING_MEMBERS {
        return false;
    }

    let cycle_len = cycle.len();
    let total_flow = cycle_flow(graph, cycle);
    let risk = (60.0 + (total_flow / cycle_len as f64) * 0.005 + cycle_len as f64 * 5.0)
        .min(MAX_SCORE);

    let ring_id = ctx.next_ring_id();
    let member_accounts: Vec<String> = members
        .iter()
        .map(|&idx| graph.id(idx).to_string())
        .collect();

    let base_score = 40.0 + cycle_len as f64 * 5.0;
    for account in &member_accounts {
        ctx.flag(account, Pattern::CycleLength(cycle_len), &ring_id, base_score);
    }

    ctx.push_ring(Ring {
        ring_id,
        member_accounts,
        pattern_type: PatternType::Cycle,
        risk_score: round_score(risk),
    });
    true
}

/// Sum of edge amounts along each hop, wrapping back to the first account.
/// A missing hop contributes zero.
#[must_use]
pub fn cycle_flow(graph: &TransactionGraph, cycle: &[NodeIndex]) -> f64 {
    (0..cycle.len())
        .map(|i| {
            let from = cycle[i];
            let to = cycle[(i + 1) % cycle.len()];
            graph.edge(from, to).map_or(0.0, |edge| edge.amount)
        })
        .sum()
}

/// Rotate `cycle` so its smallest element comes first, keeping direction.
#[must_use]
pub fn canonicalize_cycle<T: Ord + Clone>(cycle: &[T]) -> Vec<T> {
    let Some(min_idx) = cycle
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map(|(idx, _)| idx)
    else {
        return Vec::new();
    };

    let mut rotated = Vec::with_capacity(cycle.len());
    rotated.extend_from_slice(&cycle[min_idx..]);
    rotated.extend_from_slice(&cycle[..min_idx]);
    rotated
}

// ---------------------------------------------------------------------------
// Exhaustive bounded enumeration
// ---------------------------------------------------------------------------

/// Enumerate every simple cycle of length 3..=5, each once, canonical.
///
/// # Errors
///
/// Returns [`DetectError::SearchBudgetExceeded`] after `budget` expansions.
pub fn enumerate_cycles(
    graph: &TransactionGraph,
    budget: usize,
) -> Result<Vec<Vec<NodeIndex>>, DetectError> {
    let mut budget = SearchBudget::new("cycle", budget);
    let mut cycles = Vec::new();

    for root in graph.nodes_by_id() {
        let mut path = vec![root];
        extend_from(graph, root, &mut path, &mut cycles, &mut budget)?;
    }

    Ok(cycles)
}

fn extend_from(
    graph: &TransactionGraph,
    root: NodeIndex,
    path: &mut Vec<NodeIndex>,
    cycles: &mut Vec<Vec<NodeIndex>>,
    budget: &mut SearchBudget,
) -> Result<(), DetectError> {
    let Some(&current) = path.last() else {
        return Ok(());
    };
    let root_id = graph.id(root);

    for next in graph.successors_by_id(current) {
        budget.spend()?;

        if next == root {
            if path.len() >= MIN_CYCLE_LEN {
                cycles.push(path.clone());
            }
            continue;
        }

        if path.len() < MAX_CYCLE_LEN && graph.id(next) > root_id && !path.contains(&next) {
            path.push(next);
            extend_from(graph, root, path, cycles, budget)?;
            path.pop();
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Fallback: bounded root-closure search
// ---------------------------------------------------------------------------

/// Cheaper bounded search used when enumeration is over budget.
///
/// From each root (ascending id), depth-first with a per-root visited set:
/// every account is expanded at most once per root, paths never exceed five
/// accounts, and only edges closing back to the root with at least three
/// accounts on the path are reported. Results are canonicalised and
/// de-duplicated.
#[must_use]
pub fn root_closure_cycles(graph: &TransactionGraph) -> Vec<Vec<NodeIndex>> {
    let mut found: Vec<Vec<NodeIndex>> = Vec::new();
    let mut seen: HashSet<Vec<String>> = HashSet::new();

    for root in graph.nodes_by_id() {
        let mut visited: HashSet<NodeIndex> = HashSet::from([root]);
        let mut stack: Vec<Vec<NodeIndex>> = vec![vec![root]];

        while let Some(path) = stack.pop() {
            let Some(&current) = path.last() else {
                continue;
            };

            for next in graph.successors_by_id(current) {
                if next == root {
                    if path.len() >= MIN_CYCLE_LEN {
                        let ids: Vec<String> = path.iter().map(|&i| graph.id(i).to_string()).collect();
                        let canonical = canonicalize_cycle(&ids);
                        if seen.insert(canonical.clone()) {
                            found.push(
                                canonical
                                    .iter()
                                    .filter_map(|id| graph.node_index(id))
                                    .collect(),
                            );
                        }
                    }
                } else if path.len() < MAX_CYCLE_LEN && visited.insert(next) {
                    let mut extended = path.clone();
                    extended.push(next);
                    stack.push(extended);
                }
            }
        }
    }

    found
}
