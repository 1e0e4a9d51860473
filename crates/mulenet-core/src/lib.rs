#![forbid(unsafe_code)]
//! mulenet-core library.
//!
//! Shared building blocks for the detection engine and the CLI: the
//! transaction record, CSV ingestion, project configuration, and the
//! machine-readable error code table.
//!
//! # Conventions
//!
//! - **Errors**: Typed `thiserror` enums at crate boundaries, `anyhow::Result`
//!   for configuration loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod round;

pub use error::ErrorCode;
pub use model::Transaction;
