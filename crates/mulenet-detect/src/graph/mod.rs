//! Transaction graph module.
//!
//! # Overview
//!
//! Raw transaction records are folded into a petgraph-based directed graph
//! with one node per account and one aggregated edge per ordered
//! `(sender, receiver)` pair. Every detector reads from this graph; nothing
//! mutates it once it is built.
//!
//! ## Ordering
//!
//! Node indices follow first appearance in the input, and edge indices follow
//! the first transaction of each pair. The report projection relies on both,
//! and detectors that need an order independent of the input sort by account
//! id through [`TransactionGraph::successors_by_id`].
//!
//! ## Fingerprint
//!
//! [`TransactionGraph::content_hash`] is a BLAKE3 hash of the aggregated edge
//! set. Two inputs that fold into the same graph share a fingerprint.

pub mod build;

pub use build::{AccountNode, FlowEdge, TransactionGraph};
