//! The transaction record consumed by the detection engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One validated money transfer between two accounts.
///
/// Records reaching the engine are already filtered: ids are non-empty,
/// `amount` is finite and `timestamp` parsed. The `transaction_id` is carried
/// for traceability only; detection never looks at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Build a record, mostly useful in tests and synthetic generators.
    #[must_use]
    pub fn new(
        transaction_id: impl Into<String>,
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            amount,
            timestamp,
        }
    }
}
