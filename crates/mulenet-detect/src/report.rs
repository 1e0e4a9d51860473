//! The analysis result handed to callers.
//!
//! Field order of every struct here is the serialization order, and all
//! numbers are already rounded (scores to one decimal, money to two), so
//! `serde_json::to_string(&report)` is stable byte for byte.

use serde::Serialize;

use crate::context::{Pattern, PatternType};

/// Complete output of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub suspicious_accounts: Vec<SuspiciousAccountReport>,
    pub fraud_rings: Vec<RingReport>,
    pub summary: Summary,
    pub graph: GraphProjection,
}

impl AnalysisReport {
    /// Record the caller-measured wall time, rounded to two decimals.
    pub fn set_processing_time(&mut self, seconds: f64) {
        self.summary.processing_time_seconds = mulenet_core::round::round_money(seconds);
    }

    /// Look up a reported account by id.
    #[must_use]
    pub fn account(&self, account_id: &str) -> Option<&SuspiciousAccountReport> {
        self.suspicious_accounts
            .iter()
            .find(|account| account.account_id == account_id)
    }

    /// Look up a surviving ring by id.
    #[must_use]
    pub fn ring(&self, ring_id: &str) -> Option<&RingReport> {
        self.fraud_rings.iter().find(|ring| ring.ring_id == ring_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuspiciousAccountReport {
    pub account_id: String,
    pub suspicion_score: f64,
    pub detected_patterns: Vec<Pattern>,
    pub ring_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RingReport {
    pub ring_id: String,
    pub member_accounts: Vec<String>,
    pub pattern_type: PatternType,
    pub risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_accounts_analyzed: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    /// Zero until the caller fills it in.
    pub processing_time_seconds: f64,
}

/// Node and edge lists for visualisation front-ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphProjection {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub total_sent: f64,
    pub total_received: f64,
    pub tx_count: usize,
    pub suspicious: bool,
    pub rings: Vec<String>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub amount: f64,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_report() -> AnalysisReport {
        AnalysisReport {
            suspicious_accounts: vec![SuspiciousAccountReport {
                account_id: "A".into(),
                suspicion_score: 55.0,
                detected_patterns: vec![Pattern::CycleLength(3)],
                ring_id: "RING_001".into(),
            }],
            fraud_rings: vec![RingReport {
                ring_id: "RING_001".into(),
                member_accounts: vec!["A".into(), "B".into()],
                pattern_type: PatternType::Cycle,
                risk_score: 80.0,
            }],
            summary: Summary {
                total_accounts_analyzed: 2,
                suspicious_accounts_flagged: 1,
                fraud_rings_detected: 1,
                processing_time_seconds: 0.0,
            },
            graph: GraphProjection {
                nodes: Vec::new(),
                edges: vec![GraphEdge {
                    source: "A".into(),
                    target: "B".into(),
                    amount: 12.5,
                    count: 2,
                }],
            },
        }
    }

    #[test]
    fn serializes_in_declared_field_order() {
        let json = serde_json::to_string(&empty_report()).expect("json");
        assert!(json.starts_with(
            r#"{"suspicious_accounts":[{"account_id":"A","suspicion_score":55.0,"detected_patterns":["cycle_length_3"],"ring_id":"RING_001"}],"fraud_rings":[{"ring_id":"RING_001","member_accounts":["A","B"],"pattern_type":"cycle","risk_score":80.0}],"summary":{"total_accounts_analyzed":2,"#
        ));
        assert!(json.ends_with(
            r#""graph":{"nodes":[],"edges":[{"source":"A","target":"B","amount":12.5,"count":2}]}}"#
        ));
    }

    #[test]
    fn processing_time_is_rounded() {
        let mut report = empty_report();
        report.set_processing_time(0.123_456);
        assert!((report.summary.processing_time_seconds - 0.12).abs() < f64::EPSILON);
    }

    #[test]
    fn lookups_by_id() {
        let report = empty_report();
        assert!(report.account("A").is_some());
        assert!(report.account("B").is_none());
        assert_eq!(report.ring("RING_001").map(|r| r.member_accounts.len()), Some(2));
    }
}
