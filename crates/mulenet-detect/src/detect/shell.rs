//! Layering through low-activity shell accounts.
//!
//! A shell candidate is an account with only two or three transactions in
//! total. Money hopping from an active account through a run of shells to
//! another account is registered as a `layering` ring.
//!
//! The traversal is a bounded depth-first walk from every active account in
//! first-appearance order. Paths never revisit an account and never grow
//! beyond seven accounts. A path qualifies once it has at least four accounts
//! and shells make up at least 60% of its interior. Each qualifying member
//! set is registered once, the first time any path over it is found.

#![allow(clippy::cast_precision_loss)]

use std::collections::{BTreeSet, HashSet};

use mulenet_core::round::round_score;
use petgraph::graph::NodeIndex;
use tracing::{debug, instrument};

use crate::context::{MAX_SCORE, Pattern, PatternType, Ring, RunContext};
use crate::detect::Detector;
use crate::error::{DetectError, SearchBudget};
use crate::graph::TransactionGraph;

const SHELL_MIN_TX: usize = 2;
const SHELL_MAX_TX: usize = 3;
/// Longest path explored, in accounts.
pub const MAX_CHAIN_LEN: usize = 7;
const MIN_CHAIN_LEN: usize = 4;
const MIN_INTERIOR: usize = 2;
const SHELL_INTERIOR_RATIO: f64 = 0.6;

/// Registers `layering` rings for shell chains.
#[derive(Debug, Clone, Copy)]
pub struct ShellChainDetector {
    budget: usize,
}

impl ShellChainDetector {
    #[must_use]
    pub const fn new(budget: usize) -> Self {
        Self { budget }
    }
}

/// True when the account's transaction count marks it as a shell.
#[must_use]
pub fn is_shell_candidate(graph: &TransactionGraph, idx: NodeIndex) -> bool {
    (SHELL_MIN_TX..=SHELL_MAX_TX).contains(&graph.account(idx).tx_count)
}

/// A qualifying chain: path accounts plus how many interior ones are shells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellChain {
    pub path: Vec<NodeIndex>,
    pub interior_shells: usize,
}

impl ShellChain {
    /// `min(100, 50 + 10 × interior shells + 3 × path length)`.
    #[must_use]
    pub fn risk(&self) -> f64 {
        (50.0 + self.interior_shells as f64 * 10.0 + self.path.len() as f64 * 3.0).min(MAX_SCORE)
    }

    /// Per-member flag score: `30 + 5 × interior shells`.
    #[must_use]
    pub fn member_score(&self) -> f64 {
        30.0 + self.interior_shells as f64 * 5.0
    }
}

impl Detector for ShellChainDetector {
    fn name(&self) -> &'static str {
        "shell"
    }

    #[instrument(skip_all, name = "detect_shell_chains")]
    fn detect(&self, ctx: &mut RunContext<'_>) -> Result<(), DetectError> {
        let graph = ctx.graph();
        let shells: HashSet<NodeIndex> = graph
            .nodes()
            .filter(|&idx| is_shell_candidate(graph, idx))
            .collect();
        if shells.is_empty() {
            return Ok(());
        }

        let mut budget = SearchBudget::new("shell", self.budget);
        let mut seen: HashSet<BTreeSet<NodeIndex>> = HashSet::new();
        let mut registered = 0usize;

        for start in graph.nodes() {
            if shells.contains(&start) {
                continue;
            }
            let outcome = walk_chains(graph, start, &shells, &mut seen, &mut budget, |chain| {
                if register_chain(ctx, &chain, &shells) {
                    registered += 1;
                }
            });
            if let Err(err) = outcome {
                debug!(rings = registered, spent = budget.spent(), "shell search stopped early");
                return Err(err);
            }
        }

        debug!(rings = registered, spent = budget.spent(), "shell detection finished");
        Ok(())
    }
}

/// Depth-first walk from `start`, reporting every chain whose member set is
/// new to `seen`.
fn walk_chains(
    graph: &TransactionGraph,
    start: NodeIndex,
    shells: &HashSet<NodeIndex>,
    seen: &mut HashSet<BTreeSet<NodeIndex>>,
    budget: &mut SearchBudget,
    mut on_chain: impl FnMut(ShellChain),
) -> Result<(), DetectError> {
    let mut stack: Vec<Vec<NodeIndex>> = vec![vec![start]];

    while let Some(path) = stack.pop() {
        let Some(&current) = path.last() else {
            continue;
        };

        for next in graph.successors_by_id(current) {
            if path.contains(&next) {
                continue;
            }
            budget.spend()?;

            let mut extended = path.clone();
            extended.push(next);

            if let Some(interior_shells) = qualifying_shells(&extended, shells) {
                if seen.insert(extended.iter().copied().collect()) {
                    on_chain(ShellChain {
                        path: extended.clone(),
                        interior_shells,
                    });
                }
            }

            if extended.len() < MAX_CHAIN_LEN {
                stack.push(extended);
            }
        }
    }

    Ok(())
}

/// Interior shell count when `path` qualifies as a chain.
fn qualifying_shells(path: &[NodeIndex], shells: &HashSet<NodeIndex>) -> Option<usize> {
    if path.len() < MIN_CHAIN_LEN {
        return None;
    }
    let interior = &path[1..path.len() - 1];
    if interior.len() < MIN_INTERIOR {
        return None;
    }
    let interior_shells = interior.iter().filter(|idx| shells.contains(idx)).count();
    (interior_shells as f64 >= interior.len() as f64 * SHELL_INTERIOR_RATIO)
        .then_some(interior_shells)
}

/// Register a chain and flag its non-hub members. Chains with fewer than two
/// non-hub accounts are not registered.
fn register_chain(ctx: &mut RunContext<'_>, chain: &ShellChain, shells: &HashSet<NodeIndex>) -> bool {
    let graph = ctx.graph();
    let members: Vec<NodeIndex> = chain
        .path
        .iter()
        .copied()
        .filter(|&idx| !ctx.is_hub(idx))
        .collect();
    if members.len() < 2 {
        return false;
    }

    let ring_id = ctx.next_ring_id();
    let score = chain.member_score();
    for &idx in &members {
        let pattern = if shells.contains(&idx) {
            Pattern::ShellIntermediate
        } else {
            Pattern::ShellEndpoint
        };
        ctx.flag(graph.id(idx), pattern, &ring_id, score);
    }

    ctx.push_ring(Ring {
        ring_id,
        member_accounts: members.iter().map(|&idx| graph.id(idx).to_string()).collect(),
        pattern_type: PatternType::Layering,
        risk_score: round_score(chain.risk()),
    });
    true
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mulenet_core::Transaction;

    fn graph_from(edges: &[(&str, &str)]) -> TransactionGraph {
        let ts = Utc
            .with_ymd_and_hms(2024, 2, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        let records: Vec<Transaction> = edges
            .iter()
            .map(|(from, to)| Transaction::new("t", *from, *to, 900.0, ts))
            .collect();
        TransactionGraph::from_transactions(&records)
    }

    /// `SRC` is active (4 transactions); `S1`, `S2` relay once each.
    fn simple_chain() -> TransactionGraph {
        graph_from(&[
            ("SRC", "S1"),
            ("S1", "S2"),
            ("S2", "DST"),
            ("SRC", "X1"),
            ("SRC", "X2"),
            ("SRC", "X3"),
        ])
    }

    #[test]
    fn shell_candidates_have_two_or_three_transactions() {
        let graph = simple_chain();
        let shell = |id: &str| is_shell_candidate(&graph, graph.node_index(id).expect("node"));
        assert!(shell("S1"));
        assert!(shell("S2"));
        assert!(!shell("SRC"));
        assert!(!shell("DST"), "single transaction is not a shell");
    }

    #[test]
    fn registers_layering_ring_through_shells() {
        let graph = simple_chain();
        let mut ctx = RunContext::new(&graph);
        ShellChainDetector::new(10_000).detect(&mut ctx).expect("detect");

        assert_eq!(ctx.rings().len(), 1);
        let ring = &ctx.rings()[0];
        assert_eq!(ring.pattern_type, PatternType::Layering);
        assert_eq!(ring.member_accounts, vec!["SRC", "S1", "S2", "DST"]);
        // 50 + 10×2 + 3×4
        assert_eq!(ring.risk_score, 82.0);

        let src = ctx.ledger().get("SRC").expect("flagged");
        assert_eq!(src.detected_patterns, vec![Pattern::ShellEndpoint]);
        assert_eq!(src.suspicion_score, 40.0);
        let relay = ctx.ledger().get("S1").expect("flagged");
        assert_eq!(relay.detected_patterns, vec![Pattern::ShellIntermediate]);
    }

    #[test]
    fn no_shells_means_no_rings() {
        let graph = graph_from(&[("A", "B")]);
        let mut ctx = RunContext::new(&graph);
        ShellChainDetector::new(10).detect(&mut ctx).expect("detect");
        assert!(ctx.rings().is_empty());
    }

    #[test]
    fn interior_must_be_mostly_shells() {
        assert_eq!(
            qualifying_shells(&[0, 1, 2, 3].map(NodeIndex::new), &HashSet::from([NodeIndex::new(1)])),
            None,
            "one shell out of two interior accounts is below 60%"
        );
        assert_eq!(
            qualifying_shells(
                &[0, 1, 2, 3, 4].map(NodeIndex::new),
                &HashSet::from([NodeIndex::new(1), NodeIndex::new(2)])
            ),
            Some(2),
            "two of three interior accounts reach 60%"
        );
        assert_eq!(
            qualifying_shells(&[0, 1, 2].map(NodeIndex::new), &HashSet::new()),
            None,
            "three accounts are too short"
        );
    }

    #[test]
    fn member_set_is_registered_once() {
        // Two starts reach the same member set along different routes.
        let graph = graph_from(&[
            ("A", "S1"),
            ("S1", "S2"),
            ("S2", "B"),
            ("B", "S3"),
            ("A", "X1"),
            ("A", "X2"),
            ("B", "X3"),
        ]);
        let mut ctx = RunContext::new(&graph);
        ShellChainDetector::new(10_000).detect(&mut ctx).expect("detect");

        let sets: Vec<BTreeSet<&str>> = ctx
            .rings()
            .iter()
            .map(|ring| ring.member_accounts.iter().map(String::as_str).collect())
            .collect();
        let unique: HashSet<&BTreeSet<&str>> = sets.iter().collect();
        assert_eq!(sets.len(), unique.len());
    }

    #[test]
    fn budget_exhaustion_is_reported() {
        let graph = simple_chain();
        let mut ctx = RunContext::new(&graph);
        let err = ShellChainDetector::new(3)
            .detect(&mut ctx)
            .expect_err("budget too small");
        assert!(matches!(err, DetectError::SearchBudgetExceeded { search: "shell", .. }));
    }

    #[test]
    fn chain_scores() {
        let chain = ShellChain {
            path: (0..7).map(NodeIndex::new).collect(),
            interior_shells: 5,
        };
        assert_eq!(chain.risk(), 100.0);
        assert_eq!(chain.member_score(), 55.0);
    }
}
