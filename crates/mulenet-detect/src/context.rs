//! Per-analysis mutable state shared by the detectors.
//!
//! A [`RunContext`] is created for exactly one analysis and dropped with it.
//! It owns the ring id counter, the ordered list of candidate rings and the
//! suspicion ledger, so concurrent analyses never share anything mutable.

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Serialize, Serializer};

use crate::graph::TransactionGraph;
use crate::hub::HubClassifier;

/// Upper bound of every suspicion and risk score.
pub const MAX_SCORE: f64 = 100.0;

// ---------------------------------------------------------------------------
// Rings
// ---------------------------------------------------------------------------

/// The laundering pattern a ring was registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    Cycle,
    Smurfing,
    Layering,
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cycle => "cycle",
            Self::Smurfing => "smurfing",
            Self::Layering => "layering",
        };
        f.write_str(label)
    }
}

/// A candidate group of cooperating accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub ring_id: String,
    pub member_accounts: Vec<String>,
    pub pattern_type: PatternType,
    /// Already rounded to one decimal.
    pub risk_score: f64,
}

// ---------------------------------------------------------------------------
// Account flags
// ---------------------------------------------------------------------------

/// A per-account detection label, rendered as a snake-case string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Member of a directed cycle of the given length.
    CycleLength(usize),
    FanIn,
    FanOut,
    HighVelocity,
    ShellIntermediate,
    ShellEndpoint,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycleLength(len) => write!(f, "cycle_length_{len}"),
            Self::FanIn => f.write_str("fan_in"),
            Self::FanOut => f.write_str("fan_out"),
            Self::HighVelocity => f.write_str("high_velocity"),
            Self::ShellIntermediate => f.write_str("shell_intermediate"),
            Self::ShellEndpoint => f.write_str("shell_endpoint"),
        }
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accumulated suspicion for one account.
#[derive(Debug, Clone, PartialEq)]
pub struct SuspiciousAccount {
    pub account_id: String,
    /// Unrounded running total, capped at [`MAX_SCORE`].
    pub suspicion_score: f64,
    /// Distinct patterns in the order they were first detected.
    pub detected_patterns: Vec<Pattern>,
    /// Ring of the first flag until reconciliation rewrites it.
    pub ring_id: String,
}

impl SuspiciousAccount {
    fn add_pattern(&mut self, pattern: Pattern) {
        if !self.detected_patterns.contains(&pattern) {
            self.detected_patterns.push(pattern);
        }
    }

    fn add_score(&mut self, amount: f64) {
        self.suspicion_score = (self.suspicion_score + amount).min(MAX_SCORE);
    }
}

/// Suspicious accounts in creation order, addressable by id.
#[derive(Debug, Clone, Default)]
pub struct SuspicionLedger {
    entries: Vec<SuspiciousAccount>,
    index: HashMap<String, usize>,
}

impl SuspicionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `pattern` for `account_id` and add `score`.
    ///
    /// The first flag creates the entry and fixes its provisional ring id.
    pub fn flag(&mut self, account_id: &str, pattern: Pattern, ring_id: &str, score: f64) {
        let slot = match self.index.get(account_id) {
            Some(&slot) => slot,
            None => {
                self.entries.push(SuspiciousAccount {
                    account_id: account_id.to_string(),
                    suspicion_score: 0.0,
                    detected_patterns: Vec::new(),
                    ring_id: ring_id.to_string(),
                });
                let slot = self.entries.len() - 1;
                self.index.insert(account_id.to_string(), slot);
                slot
            }
        };

        let entry = &mut self.entries[slot];
        entry.add_pattern(pattern);
        entry.add_score(score);
    }

    /// Strengthen an existing entry. Returns `false` (and does nothing) when
    /// the account has never been flagged.
    pub fn amplify(&mut self, account_id: &str, pattern: Pattern, score: f64) -> bool {
        let Some(&slot) = self.index.get(account_id) else {
            return false;
        };
        let entry = &mut self.entries[slot];
        entry.add_pattern(pattern);
        entry.add_score(score);
        true
    }

    #[must_use]
    pub fn contains(&self, account_id: &str) -> bool {
        self.index.contains_key(account_id)
    }

    #[must_use]
    pub fn get(&self, account_id: &str) -> Option<&SuspiciousAccount> {
        self.index.get(account_id).map(|&slot| &self.entries[slot])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &SuspiciousAccount> {
        self.entries.iter()
    }

    /// Consume the ledger, yielding entries in creation order.
    #[must_use]
    pub fn into_entries(self) -> Vec<SuspiciousAccount> {
        self.entries
    }
}

// ---------------------------------------------------------------------------
// RunContext
// ---------------------------------------------------------------------------

/// State threaded through the detectors of one analysis.
#[derive(Debug)]
pub struct RunContext<'g> {
    graph: &'g TransactionGraph,
    hubs: HubClassifier<'g>,
    ring_counter: usize,
    rings: Vec<Ring>,
    ledger: SuspicionLedger,
}

impl<'g> RunContext<'g> {
    #[must_use]
    pub fn new(graph: &'g TransactionGraph) -> Self {
        Self {
            graph,
            hubs: HubClassifier::new(graph),
            ring_counter: 0,
            rings: Vec::new(),
            ledger: SuspicionLedger::new(),
        }
    }

    #[must_use]
    pub const fn graph(&self) -> &'g TransactionGraph {
        self.graph
    }

    #[must_use]
    pub const fn hubs(&self) -> HubClassifier<'g> {
        self.hubs
    }

    #[must_use]
    pub fn is_hub(&self, idx: NodeIndex) -> bool {
        self.hubs.is_hub(idx)
    }

    /// Reserve the next ring id: `RING_001`, `RING_002`, …
    pub fn next_ring_id(&mut self) -> String {
        self.ring_counter += 1;
        format!("RING_{:03}", self.ring_counter)
    }

    /// Append a candidate ring. Insertion order is reconciliation priority.
    pub fn push_ring(&mut self, ring: Ring) {
        self.rings.push(ring);
    }

    /// See [`SuspicionLedger::flag`].
    pub fn flag(&mut self, account_id: &str, pattern: Pattern, ring_id: &str, score: f64) {
        self.ledger.flag(account_id, pattern, ring_id, score);
    }

    #[must_use]
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    #[must_use]
    pub const fn ledger(&self) -> &SuspicionLedger {
        &self.ledger
    }

    pub const fn ledger_mut(&mut self) -> &mut SuspicionLedger {
        &mut self.ledger
    }

    /// Hand the accumulated rings and ledger to reconciliation.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Ring>, SuspicionLedger) {
        (self.rings, self.ledger)
    }
}
