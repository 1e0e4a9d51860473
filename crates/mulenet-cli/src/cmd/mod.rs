pub mod analyze;
pub mod graph;

use std::path::Path;
use std::time::Instant;

use mulenet_core::config::ProjectConfig;
use mulenet_core::ingest::{IngestOutcome, load_transactions};
use mulenet_detect::{Analysis, AnalysisReport, Analyzer, SearchLimits};

use crate::output::{CliError, OutputMode, render_error};

/// A finished analysis plus what the CLI needs to describe it.
pub struct AnalysisRun {
    pub report: AnalysisReport,
    /// Content hash of the analysed graph.
    pub dataset: String,
    /// Detectors that stopped on their search budget.
    pub truncated: Vec<&'static str>,
    pub input: IngestOutcome,
}

/// Ingest `path` and analyse it with the configured search limits.
///
/// Ingestion failures are rendered in `output` mode before being returned.
/// `summary.processing_time_seconds` covers ingestion and analysis.
pub fn ingest_and_analyze(
    path: &Path,
    config: &ProjectConfig,
    output: OutputMode,
) -> anyhow::Result<AnalysisRun> {
    let started = Instant::now();

    let input = match load_transactions(path, config.analysis.max_input_bytes) {
        Ok(input) => input,
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            return Err(err.into());
        }
    };

    let analyzer = Analyzer::new(SearchLimits::from(&config.analysis));
    let Analysis {
        mut report,
        dataset,
        truncated,
    } = analyzer.run(&input.transactions);

    report.set_processing_time(started.elapsed().as_secs_f64());

    Ok(AnalysisRun {
        report,
        dataset,
        truncated,
        input,
    })
}
