#![forbid(unsafe_code)]
//! mulenet-detect library.
//!
//! The detection engine: builds a [`graph::TransactionGraph`] from validated
//! transaction records, runs the pattern detectors in a fixed order against a
//! per-run [`context::RunContext`], and reconciles overlapping rings into an
//! [`report::AnalysisReport`].
//!
//! ```text
//! &[Transaction]
//!        ↓  TransactionGraph::from_transactions()
//! TransactionGraph  ── HubClassifier (queried by every detector)
//!        ↓  CycleDetector → Smurfing(fan-in) → Smurfing(fan-out)
//!        ↓  → ShellChainDetector → VelocityDetector
//! RunContext { rings, suspicion ledger }
//!        ↓  reconcile::reconcile()
//! AnalysisReport
//! ```
//!
//! # Conventions
//!
//! - **Errors**: Detectors return [`error::DetectError`]; a failing detector
//!   is logged and skipped, never fatal to the run.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod context;
pub mod detect;
pub mod engine;
pub mod error;
pub mod graph;
pub mod hub;
pub mod reconcile;
pub mod report;

pub use engine::{Analysis, Analyzer, SearchLimits, analyze};
pub use error::DetectError;
pub use graph::TransactionGraph;
pub use report::AnalysisReport;
