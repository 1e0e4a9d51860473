//! CSV ingestion for transaction exports.
//!
//! Turns a CSV file with a header row into validated [`Transaction`] records.
//! Rows whose ids, amount or timestamp cannot be coerced are dropped and
//! counted rather than failing the whole file; structural problems (missing
//! columns, ragged rows, undecodable bytes) are errors.
//!
//! ## Accepted timestamp formats
//!
//! - RFC 3339 (`2024-03-01T12:00:00Z`, `2024-03-01T12:00:00+02:00`)
//! - `YYYY-MM-DD HH:MM:SS[.fff]` and `YYYY-MM-DDTHH:MM:SS[.fff]`
//! - `YYYY-MM-DD HH:MM`, `YYYY/MM/DD HH:MM:SS`
//! - `YYYY-MM-DD` (midnight)
//!
//! Values without an offset are read as UTC.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, instrument, warn};

use crate::error::ErrorCode;
use crate::model::Transaction;

/// Columns every export must carry, in documentation order.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "transaction_id",
    "sender_id",
    "receiver_id",
    "amount",
    "timestamp",
];

const NAIVE_DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that stop ingestion of a file.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The input path does not exist.
    #[error("input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The input does not have a `.csv` extension.
    #[error("only CSV files are accepted: {}", path.display())]
    UnsupportedFileType { path: PathBuf },

    /// The input exceeds the configured size limit.
    #[error("input is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    /// One or more required columns are absent from the header.
    #[error("missing columns {missing:?}; required: {}", REQUIRED_COLUMNS.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// The CSV stream itself is malformed.
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Reading the input failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IngestError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::InputNotFound,
            Self::UnsupportedFileType { .. } => ErrorCode::UnsupportedFileType,
            Self::TooLarge { .. } => ErrorCode::InputTooLarge,
            Self::MissingColumns { .. } => ErrorCode::MissingColumns,
            Self::Csv(_) | Self::Io { .. } => ErrorCode::MalformedCsv,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Records read from one export plus the number of rows that were discarded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutcome {
    pub transactions: Vec<Transaction>,
    pub dropped_rows: usize,
}

/// Open `path` and read it as a transaction export.
///
/// Applies the upload guards before parsing: the file must exist, carry a
/// `.csv` extension and be at most `max_bytes` long.
///
/// # Errors
///
/// Returns [`IngestError`] when a guard fails or the CSV cannot be parsed.
#[instrument(skip(max_bytes))]
pub fn load_transactions(path: &Path, max_bytes: u64) -> Result<IngestOutcome, IngestError> {
    if !path.exists() {
        return Err(IngestError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(IngestError::UnsupportedFileType {
            path: path.to_path_buf(),
        });
    }

    let io_err = |source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    };

    let size = std::fs::metadata(path).map_err(io_err)?.len();
    if size > max_bytes {
        return Err(IngestError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let file = File::open(path).map_err(io_err)?;
    read_transactions(file)
}

/// Read a transaction export from any reader.
///
/// # Errors
///
/// Returns [`IngestError::MissingColumns`] if the header lacks a required
/// column and [`IngestError::Csv`] for malformed records.
pub fn read_transactions<R: Read>(reader: R) -> Result<IngestOutcome, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let columns = ColumnIndex::from_headers(csv_reader.headers()?)?;

    let mut outcome = IngestOutcome::default();
    for (row_no, record) in csv_reader.records().enumerate() {
        let record = record?;
        match columns.coerce(&record) {
            Some(tx) => outcome.transactions.push(tx),
            None => {
                debug!(row = row_no + 2, "dropping row with missing or unparsable values");
                outcome.dropped_rows += 1;
            }
        }
    }

    if outcome.dropped_rows > 0 {
        warn!(
            dropped = outcome.dropped_rows,
            kept = outcome.transactions.len(),
            "dropped rows with missing or unparsable values"
        );
    }

    Ok(outcome)
}

/// Parse a timestamp in any of the accepted formats.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse an amount. Rejects empty, non-finite and negative values.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount >= 0.0)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Positions of the required columns within a header row.
struct ColumnIndex {
    transaction_id: usize,
    sender_id: usize,
    receiver_id: usize,
    amount: usize,
    timestamp: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, IngestError> {
        let position = |name: &str| headers.iter().position(|header| header == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| position(name).is_none())
            .map(|name| (*name).to_string())
            .collect();

        match (
            position("transaction_id"),
            position("sender_id"),
            position("receiver_id"),
            position("amount"),
            position("timestamp"),
        ) {
            (Some(transaction_id), Some(sender_id), Some(receiver_id), Some(amount), Some(timestamp)) => {
                Ok(Self {
                    transaction_id,
                    sender_id,
                    receiver_id,
                    amount,
                    timestamp,
                })
            }
            _ => Err(IngestError::MissingColumns { missing }),
        }
    }

    fn coerce(&self, record: &csv::StringRecord) -> Option<Transaction> {
        let sender_id = non_empty(record.get(self.sender_id)?)?;
        let receiver_id = non_empty(record.get(self.receiver_id)?)?;
        let amount = parse_amount(record.get(self.amount)?)?;
        let timestamp = parse_timestamp(record.get(self.timestamp)?)?;
        let transaction_id = record.get(self.transaction_id).unwrap_or_default();

        Some(Transaction::new(
            transaction_id,
            sender_id,
            receiver_id,
            amount,
            timestamp,
        ))
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.trim().is_empty() { None } else { Some(value) }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
