//! Pattern detectors.
//!
//! Each detector reads the graph through a [`RunContext`], appends candidate
//! rings and flags accounts. They run in a fixed order because later steps
//! depend on what earlier ones recorded:
//!
//! 1. [`cycles::CycleDetector`]: directed cycles of length 3 to 5
//! 2. [`smurfing::SmurfingDetector`] (fan-in), then again (fan-out)
//! 3. [`shell::ShellChainDetector`]: layering through low-activity accounts
//! 4. [`velocity::VelocityDetector`]: burst-rate amplification of existing flags

pub mod cycles;
pub mod shell;
pub mod smurfing;
pub mod temporal;
pub mod velocity;

use crate::context::RunContext;
use crate::error::DetectError;

pub use cycles::CycleDetector;
pub use shell::ShellChainDetector;
pub use smurfing::{FlowDirection, SmurfingDetector};
pub use temporal::temporal_concentration;
pub use velocity::VelocityDetector;

/// One step of the detection pipeline.
pub trait Detector {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Inspect the graph and record rings and flags into `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError`] when the detector could not finish. Whatever
    /// it recorded before failing stays in `ctx`.
    fn detect(&self, ctx: &mut RunContext<'_>) -> Result<(), DetectError>;
}
