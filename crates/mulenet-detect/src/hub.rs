//! Merchant and payroll hub classification.
//!
//! Hubs are accounts whose high fan-in or fan-out is explained by legitimate
//! business: a merchant collects from many customers and pays few suppliers,
//! a payroll account pays many employees similar amounts. Detectors never
//! flag a hub or list it as a ring member, but hub edges still count as
//! ordinary hops for everyone else.
//!
//! # Rules
//!
//! - **Merchant**: `distinct senders >= 20` and `distinct receivers <= 3`.
//! - **Payroll**: `distinct receivers >= 20`, `distinct senders <= 3`, at
//!   least 10 outgoing edges, and the coefficient of variation of per-edge
//!   average amounts below 0.25.

#![allow(clippy::cast_precision_loss)]

use petgraph::Direction;
use petgraph::graph::NodeIndex;

use crate::graph::TransactionGraph;

const MERCHANT_MIN_SENDERS: usize = 20;
const MERCHANT_MAX_RECEIVERS: usize = 3;
const PAYROLL_MIN_RECEIVERS: usize = 20;
const PAYROLL_MAX_SENDERS: usize = 3;
const PAYROLL_MIN_OUT_EDGES: usize = 10;
const PAYROLL_MAX_CV: f64 = 0.25;

/// Why an account was classified as a hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubKind {
    Merchant,
    Payroll,
}

/// Answers "is this account a hub?" against one graph.
///
/// The graph is immutable for the lifetime of the classifier, so answers are
/// stable for a run; they are still computed on every call.
#[derive(Debug, Clone, Copy)]
pub struct HubClassifier<'g> {
    graph: &'g TransactionGraph,
}

impl<'g> HubClassifier<'g> {
    #[must_use]
    pub const fn new(graph: &'g TransactionGraph) -> Self {
        Self { graph }
    }

    /// Classify `idx`, returning `None` for ordinary accounts.
    #[must_use]
    pub fn classify(&self, idx: NodeIndex) -> Option<HubKind> {
        let node = self.graph.account(idx);
        let senders = node.senders.len();
        let receivers = node.receivers.len();

        if senders >= MERCHANT_MIN_SENDERS && receivers <= MERCHANT_MAX_RECEIVERS {
            return Some(HubKind::Merchant);
        }

        if receivers >= PAYROLL_MIN_RECEIVERS
            && senders <= PAYROLL_MAX_SENDERS
            && self.has_regular_payouts(idx)
        {
            return Some(HubKind::Payroll);
        }

        None
    }

    /// True for merchant and payroll hubs.
    #[must_use]
    pub fn is_hub(&self, idx: NodeIndex) -> bool {
        self.classify(idx).is_some()
    }

    /// Same as [`Self::is_hub`] by account id; unknown ids are not hubs.
    #[must_use]
    pub fn is_hub_id(&self, account_id: &str) -> bool {
        self.graph
            .node_index(account_id)
            .is_some_and(|idx| self.is_hub(idx))
    }

    fn has_regular_payouts(&self, idx: NodeIndex) -> bool {
        let averages: Vec<f64> = self
            .graph
            .flows(idx, Direction::Outgoing)
            .map(crate::graph::FlowEdge::average_amount)
            .collect();

        if averages.len() < PAYROLL_MIN_OUT_EDGES {
            return false;
        }

        coefficient_of_variation(&averages).is_some_and(|cv| cv < PAYROLL_MAX_CV)
    }
}

/// Population standard deviation divided by the mean.
///
/// `None` for an empty slice or a non-positive mean.
#[must_use]
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return None;
    }

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt() / mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use mulenet_core::Transaction;

    fn tx(from: &str, to: &str, amount: f64, minute: i64) -> Transaction {
        let base = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        Transaction::new("t", from, to, amount, base + Duration::minutes(minute))
    }

    fn merchant_records(customers: usize, suppliers: usize) -> Vec<Transaction> {
        let mut records: Vec<Transaction> = (0..customers)
            .map(|i| tx(&format!("CUST_{i:02}"), "SHOP", 20.0, i as i64))
            .collect();
        records.extend((0..suppliers).map(|i| tx("SHOP", &format!("SUP_{i}"), 500.0, 100)));
        records
    }

    fn payroll_records(employees: usize, amount_for: impl Fn(usize) -> f64) -> Vec<Transaction> {
        let mut records = vec![tx("FUNDING", "PAYROLL", 100_000.0, 0)];
        records.extend(
            (0..employees).map(|i| tx("PAYROLL", &format!("EMP_{i:02}"), amount_for(i), 10)),
        );
        records
    }

    #[test]
    fn merchant_with_many_customers_is_a_hub() {
        let graph = TransactionGraph::from_transactions(&merchant_records(25, 1));
        let hubs = HubClassifier::new(&graph);

        assert_eq!(hubs.classify(graph.node_index("SHOP").expect("SHOP")), Some(HubKind::Merchant));
        assert!(hubs.is_hub_id("SHOP"));
        assert!(!hubs.is_hub_id("CUST_00"));
    }

    #[test]
    fn merchant_with_many_suppliers_is_not_a_hub() {
        let graph = TransactionGraph::from_transactions(&merchant_records(25, 4));
        assert!(!HubClassifier::new(&graph).is_hub_id("SHOP"));
    }

    #[test]
    fn merchant_threshold_is_inclusive() {
        let at_threshold = TransactionGraph::from_transactions(&merchant_records(20, 3));
        assert!(HubClassifier::new(&at_threshold).is_hub_id("SHOP"));

        let below = TransactionGraph::from_transactions(&merchant_records(19, 3));
        assert!(!HubClassifier::new(&below).is_hub_id("SHOP"));
    }

    #[test]
    fn regular_payroll_is_a_hub() {
        let graph = TransactionGraph::from_transactions(&payroll_records(22, |i| {
            3000.0 + (i % 3) as f64 * 50.0
        }));
        let hubs = HubClassifier::new(&graph);

        assert_eq!(
            hubs.classify(graph.node_index("PAYROLL").expect("PAYROLL")),
            Some(HubKind::Payroll)
        );
    }

    #[test]
    fn irregular_payouts_are_not_payroll() {
        let graph = TransactionGraph::from_transactions(&payroll_records(22, |i| {
            if i % 2 == 0 { 100.0 } else { 9000.0 }
        }));
        assert!(!HubClassifier::new(&graph).is_hub_id("PAYROLL"));
    }

    #[test]
    fn zero_amount_payouts_short_circuit() {
        let graph = TransactionGraph::from_transactions(&payroll_records(22, |_| 0.0));
        assert!(!HubClassifier::new(&graph).is_hub_id("PAYROLL"));
    }

    #[test]
    fn coefficient_of_variation_guards_denominators() {
        assert_eq!(coefficient_of_variation(&[]), None);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), None);
        assert_eq!(coefficient_of_variation(&[5.0, 5.0, 5.0]), Some(0.0));

        let cv = coefficient_of_variation(&[2.0, 4.0]).expect("positive mean");
        assert!((cv - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_account_is_not_a_hub() {
        let graph = TransactionGraph::new();
        assert!(!HubClassifier::new(&graph).is_hub_id("NOPE"));
    }
}
