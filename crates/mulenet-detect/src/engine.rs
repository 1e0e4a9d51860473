//! Analysis entry point.
//!
//! [`Analyzer::run`] builds the graph, runs every detector in order against
//! a fresh [`RunContext`], and reconciles the result. Each call owns
//! all of its mutable state, so analyzers can be shared across threads and
//! used concurrently.

use mulenet_core::Transaction;
use mulenet_core::config::AnalysisConfig;
use tracing::{info, instrument, warn};

use crate::context::RunContext;
use crate::detect::{CycleDetector, Detector, ShellChainDetector, SmurfingDetector, VelocityDetector};
use crate::graph::TransactionGraph;
use crate::reconcile::reconcile;
use crate::report::AnalysisReport;

/// Expansion budgets for the exponential graph searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Exhaustive cycle enumeration; the bounded fallback runs past it.
    pub cycle_search_budget: usize,
    /// Shell-chain walk; the detector stops with an error past it.
    pub shell_search_budget: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for SearchLimits {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            cycle_search_budget: config.cycle_search_budget,
            shell_search_budget: config.shell_search_budget,
        }
    }
}

/// A finished run: the report plus facts about the run that stay out of the
/// JSON contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub report: AnalysisReport,
    /// Content hash of the analysed graph.
    pub dataset: String,
    /// Detectors that stopped before finishing, in pipeline order. Their
    /// rings are partial, not absent.
    pub truncated: Vec<&'static str>,
}

impl Analysis {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.truncated.is_empty()
    }
}

/// Runs the detection pipeline.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    limits: SearchLimits,
}

impl Analyzer {
    #[must_use]
    pub const fn new(limits: SearchLimits) -> Self {
        Self { limits }
    }

    fn detectors(&self) -> Vec<Box<dyn Detector>> {
        vec![
            Box::new(CycleDetector::new(self.limits.cycle_search_budget)),
            Box::new(SmurfingDetector::fan_in()),
            Box::new(SmurfingDetector::fan_out()),
            Box::new(ShellChainDetector::new(self.limits.shell_search_budget)),
            Box::new(VelocityDetector),
        ]
    }

    /// Analyse a batch of validated transaction records.
    ///
    /// Never fails: a detector that cannot finish is logged, recorded in
    /// [`Analysis::truncated`] and skipped. Whatever it registered before
    /// stopping is kept.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn run(&self, records: &[Transaction]) -> Analysis {
        let graph = TransactionGraph::from_transactions(records);
        let mut ctx = RunContext::new(&graph);
        let mut truncated = Vec::new();

        for detector in self.detectors() {
            let rings_before = ctx.rings().len();
            if let Err(err) = detector.detect(&mut ctx) {
                warn!(
                    detector = detector.name(),
                    code = %err.code(),
                    error = %err,
                    kept = ctx.rings().len() - rings_before,
                    "detector stopped early; continuing with partial results"
                );
                truncated.push(detector.name());
            }
        }

        let (rings, ledger) = ctx.into_parts();
        let report = reconcile(&graph, rings, ledger);
        let dataset = graph.content_hash();

        info!(
            accounts = report.summary.total_accounts_analyzed,
            edges = graph.edge_count(),
            suspicious = report.summary.suspicious_accounts_flagged,
            rings = report.summary.fraud_rings_detected,
            truncated = ?truncated,
            dataset = %dataset,
            "analysis complete"
        );
        Analysis {
            report,
            dataset,
            truncated,
        }
    }

    /// Like [`Analyzer::run`], keeping only the report.
    #[must_use]
    pub fn analyze(&self, records: &[Transaction]) -> AnalysisReport {
        self.run(records).report
    }
}

/// Analyse `records` with default search limits.
#[must_use]
pub fn analyze(records: &[Transaction]) -> AnalysisReport {
    Analyzer::default().analyze(records)
}
