//! Transaction velocity amplification.
//!
//! Accounts that move money faster than five transactions per hour across
//! their whole active span get `high_velocity` and 15 extra points, but only
//! when an earlier detector already flagged them. Velocity alone never puts
//! an account on the report.

#![allow(clippy::cast_precision_loss)]

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::context::{Pattern, RunContext};
use crate::detect::Detector;
use crate::error::DetectError;

const MIN_EVENTS: usize = 5;
const MAX_RATE_PER_HOUR: f64 = 5.0;
const VELOCITY_BONUS: f64 = 15.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct VelocityDetector;

impl Detector for VelocityDetector {
    fn name(&self) -> &'static str {
        "velocity"
    }

    #[instrument(skip_all, name = "detect_velocity")]
    fn detect(&self, ctx: &mut RunContext<'_>) -> Result<(), DetectError> {
        let graph = ctx.graph();
        let mut amplified = 0usize;

        for idx in graph.nodes() {
            if ctx.is_hub(idx) {
                continue;
            }
            let node = graph.account(idx);
            let Some(rate) = rate_per_hour(&node.timestamps) else {
                continue;
            };
            if rate > MAX_RATE_PER_HOUR
                && ctx
                    .ledger_mut()
                    .amplify(&node.id, Pattern::HighVelocity, VELOCITY_BONUS)
            {
                amplified += 1;
            }
        }

        debug!(amplified, "velocity detection finished");
        Ok(())
    }
}

/// Transactions per hour between the first and last timestamp.
///
/// `None` below five events. A zero or negative span counts as one second.
#[must_use]
pub fn rate_per_hour(timestamps: &[DateTime<Utc>]) -> Option<f64> {
    if timestamps.len() < MIN_EVENTS {
        return None;
    }
    let first = timestamps.iter().min()?;
    let last = timestamps.iter().max()?;

    let mut span_secs = (*last - *first).num_milliseconds() as f64 / 1000.0;
    if span_secs <= 0.0 {
        span_secs = 1.0;
    }
    Some(timestamps.len() as f64 / (span_secs / 3600.0))
}
