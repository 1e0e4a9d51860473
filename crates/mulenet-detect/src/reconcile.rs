//! Ring reconciliation and report assembly.
//!
//! Detectors register overlapping candidate rings. Reconciliation walks them
//! in registration order and lets each account belong to the first ring that
//! lists it. A ring left with fewer than two accounts is dropped; the accounts
//! it took are not handed to a later ring and do not appear in the report.
//! Suspicious accounts that no surviving ring claims are discarded too.

use std::collections::{HashMap, HashSet};

use mulenet_core::round::{round_money, round_score};
use tracing::debug;

use crate::context::{Ring, SuspicionLedger, SuspiciousAccount};
use crate::graph::TransactionGraph;
use crate::report::{
    AnalysisReport, GraphEdge, GraphNode, GraphProjection, RingReport, Summary,
    SuspiciousAccountReport,
};

const MIN_RING_MEMBERS: usize = 2;

/// Surviving rings plus the account → ring assignment they imply.
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    pub rings: Vec<Ring>,
    pub claims: HashMap<String, String>,
}

/// Give every account to the first ring that lists it.
#[must_use]
pub fn dedupe_rings(rings: Vec<Ring>) -> Reconciled {
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Reconciled::default();
    let mut dropped = 0usize;

    for mut ring in rings {
        let survivors: Vec<String> = ring
            .member_accounts
            .into_iter()
            .filter(|account| taken.insert(account.clone()))
            .collect();

        if survivors.len() < MIN_RING_MEMBERS {
            dropped += 1;
            continue;
        }

        for account in &survivors {
            out.claims.insert(account.clone(), ring.ring_id.clone());
        }
        ring.member_accounts = survivors;
        out.rings.push(ring);
    }

    debug!(kept = out.rings.len(), dropped, "rings reconciled");
    out
}

/// Reconcile `rings` against `ledger` and build the final report.
///
/// `processing_time_seconds` is left at zero.
#[must_use]
pub fn reconcile(graph: &TransactionGraph, rings: Vec<Ring>, ledger: SuspicionLedger) -> AnalysisReport {
    let Reconciled { rings, claims } = dedupe_rings(rings);

    let mut accounts: Vec<SuspiciousAccount> = ledger
        .into_entries()
        .into_iter()
        .filter_map(|mut entry| {
            let ring_id = claims.get(&entry.account_id)?;
            entry.ring_id.clone_from(ring_id);
            Some(entry)
        })
        .collect();
    // Stable: equal scores keep creation order.
    accounts.sort_by(|a, b| b.suspicion_score.total_cmp(&a.suspicion_score));

    let graph_projection = project_graph(graph, &rings, &accounts);

    let summary = Summary {
        total_accounts_analyzed: graph.node_count(),
        suspicious_accounts_flagged: accounts.len(),
        fraud_rings_detected: rings.len(),
        processing_time_seconds: 0.0,
    };

    AnalysisReport {
        suspicious_accounts: accounts
            .into_iter()
            .map(|entry| SuspiciousAccountReport {
                account_id: entry.account_id,
                suspicion_score: round_score(entry.suspicion_score),
                detected_patterns: entry.detected_patterns,
                ring_id: entry.ring_id,
            })
            .collect(),
        fraud_rings: rings
            .into_iter()
            .map(|ring| RingReport {
                ring_id: ring.ring_id,
                member_accounts: ring.member_accounts,
                pattern_type: ring.pattern_type,
                risk_score: ring.risk_score,
            })
            .collect(),
        summary,
        graph: graph_projection,
    }
}

fn project_graph(
    graph: &TransactionGraph,
    rings: &[Ring],
    accounts: &[SuspiciousAccount],
) -> GraphProjection {
    let mut membership: HashMap<&str, Vec<String>> = HashMap::new();
    for ring in rings {
        for account in &ring.member_accounts {
            membership
                .entry(account.as_str())
                .or_default()
                .push(ring.ring_id.clone());
        }
    }
    let scores: HashMap<&str, f64> = accounts
        .iter()
        .map(|entry| (entry.account_id.as_str(), entry.suspicion_score))
        .collect();

    let nodes = graph
        .nodes()
        .map(|idx| {
            let node = graph.account(idx);
            let score = scores.get(node.id.as_str()).copied();
            GraphNode {
                id: node.id.clone(),
                total_sent: round_money(node.total_sent),
                total_received: round_money(node.total_received),
                tx_count: node.tx_count,
                suspicious: score.is_some(),
                rings: membership.get(node.id.as_str()).cloned().unwrap_or_default(),
                score: score.map_or(0.0, round_score),
            }
        })
        .collect();

    let edges = graph
        .edges_in_order()
        .into_iter()
        .map(|(source, target, flow)| GraphEdge {
            source: graph.id(source).to_string(),
            target: graph.id(target).to_string(),
            amount: round_money(flow.amount),
            count: flow.count,
        })
        .collect();

    GraphProjection { nodes, edges }
}
