//! Graph construction from transaction records.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A sent money to B". Repeated transfers between the
//! same ordered pair accumulate into one [`FlowEdge`] instead of creating
//! parallel edges. Self-transfers (`A → A`) are kept as a self-loop.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use mulenet_core::Transaction;
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::instrument;

// ---------------------------------------------------------------------------
// Node and edge weights
// ---------------------------------------------------------------------------

/// Per-account statistics accumulated while ingesting records.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountNode {
    pub id: String,
    pub total_sent: f64,
    pub total_received: f64,
    /// Transactions touching this account, counting both directions.
    pub tx_count: usize,
    pub send_count: usize,
    pub recv_count: usize,
    /// Distinct counterparties this account paid, sorted by id.
    pub receivers: BTreeSet<String>,
    /// Distinct counterparties that paid this account, sorted by id.
    pub senders: BTreeSet<String>,
    /// Every involvement timestamp in ingestion order (not sorted).
    pub timestamps: Vec<DateTime<Utc>>,
}

impl AccountNode {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            total_sent: 0.0,
            total_received: 0.0,
            tx_count: 0,
            send_count: 0,
            recv_count: 0,
            receivers: BTreeSet::new(),
            senders: BTreeSet::new(),
            timestamps: Vec::new(),
        }
    }
}

/// Aggregate of every transfer over one ordered account pair.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowEdge {
    pub amount: f64,
    pub count: usize,
    pub timestamps: Vec<DateTime<Utc>>,
}

impl FlowEdge {
    /// Mean amount per transfer on this edge.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_amount(&self) -> f64 {
        self.amount / self.count.max(1) as f64
    }
}

// ---------------------------------------------------------------------------
// TransactionGraph
// ---------------------------------------------------------------------------

/// A directed, weighted transaction graph.
///
/// Nodes are accounts, edges are aggregated money flows. Built once per
/// analysis run and read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct TransactionGraph {
    graph: DiGraph<AccountNode, FlowEdge>,
    node_map: HashMap<String, NodeIndex>,
}

impl TransactionGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `records` into a new graph, in order.
    #[must_use]
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn from_transactions(records: &[Transaction]) -> Self {
        let mut graph = Self::new();
        for record in records {
            graph.add_transaction(record);
        }
        graph
    }

    /// Ingest one record.
    ///
    /// Creates either endpoint on first sight, updates both accounts'
    /// statistics and accumulates the directed edge.
    pub fn add_transaction(&mut self, record: &Transaction) {
        let sender = self.ensure_node(&record.sender_id);
        let receiver = self.ensure_node(&record.receiver_id);
        let amount = record.amount;
        let ts = record.timestamp;

        let s = &mut self.graph[sender];
        s.total_sent += amount;
        s.tx_count += 1;
        s.send_count += 1;
        s.receivers.insert(record.receiver_id.clone());
        s.timestamps.push(ts);

        let r = &mut self.graph[receiver];
        r.total_received += amount;
        r.tx_count += 1;
        r.recv_count += 1;
        r.senders.insert(record.sender_id.clone());
        r.timestamps.push(ts);

        if let Some(edge) = self.graph.find_edge(sender, receiver) {
            let flow = &mut self.graph[edge];
            flow.amount += amount;
            flow.count += 1;
            flow.timestamps.push(ts);
        } else {
            self.graph.add_edge(
                sender,
                receiver,
                FlowEdge {
                    amount,
                    count: 1,
                    timestamps: vec![ts],
                },
            );
        }
    }

    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(AccountNode::new(id));
        self.node_map.insert(id.to_string(), idx);
        idx
    }

    /// Return the number of accounts in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of aggregated edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Look up the `NodeIndex` for an account id.
    #[must_use]
    pub fn node_index(&self, account_id: &str) -> Option<NodeIndex> {
        self.node_map.get(account_id).copied()
    }

    /// Account statistics for a node.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not belong to this graph.
    #[must_use]
    pub fn account(&self, idx: NodeIndex) -> &AccountNode {
        &self.graph[idx]
    }

    /// Account id for a node.
    #[must_use]
    pub fn id(&self, idx: NodeIndex) -> &str {
        &self.graph[idx].id
    }

    /// Account statistics by id.
    #[must_use]
    pub fn account_by_id(&self, account_id: &str) -> Option<&AccountNode> {
        self.node_index(account_id).map(|idx| &self.graph[idx])
    }

    /// All nodes in first-appearance order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// All nodes sorted by account id.
    #[must_use]
    pub fn nodes_by_id(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        nodes.sort_unstable_by(|a, b| self.id(*a).cmp(self.id(*b)));
        nodes
    }

    /// Direct successors of `idx` sorted by account id.
    ///
    /// petgraph yields neighbors in reverse insertion order, which would leak
    /// input order into search results.
    #[must_use]
    pub fn successors_by_id(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut next: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        next.sort_unstable_by(|a, b| self.id(*a).cmp(self.id(*b)));
        next.dedup();
        next
    }

    /// Aggregated edges leaving (`Outgoing`) or entering (`Incoming`) `idx`.
    pub fn flows(&self, idx: NodeIndex, direction: Direction) -> impl Iterator<Item = &FlowEdge> + '_ {
        self.graph
            .edges_directed(idx, direction)
            .map(|edge| edge.weight())
    }

    /// Aggregated edge `from → to`, if any transfer happened on that pair.
    #[must_use]
    pub fn edge(&self, from: NodeIndex, to: NodeIndex) -> Option<&FlowEdge> {
        self.graph
            .find_edge(from, to)
            .map(|edge| &self.graph[edge])
    }

    /// Edges grouped by source node (in node order), each group in
    /// first-occurrence order.
    #[must_use]
    pub fn edges_in_order(&self) -> Vec<(NodeIndex, NodeIndex, &FlowEdge)> {
        let mut edges: Vec<(NodeIndex, NodeIndex, EdgeIndex)> = self
            .graph
            .edge_references()
            .map(|edge| (edge.source(), edge.target(), edge.id()))
            .collect();
        edges.sort_unstable_by_key(|(source, _, id)| (source.index(), id.index()));

        edges
            .into_iter()
            .map(|(source, target, id)| (source, target, &self.graph[id]))
            .collect()
    }

    /// BLAKE3 fingerprint of the aggregated edge set, `blake3:<hex>`.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (source, target, flow) in self.edges_in_order() {
            hasher.update(self.id(source).as_bytes());
            hasher.update(b"\x00");
            hasher.update(self.id(target).as_bytes());
            hasher.update(b"\x00");
            hasher.update(&flow.amount.to_bits().to_le_bytes());
            hasher.update(&(flow.count as u64).to_le_bytes());
        }
        format!("blake3:{}", hasher.finalize())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
