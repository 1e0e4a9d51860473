//! `mulenet analyze`: full detection report for a transaction CSV.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use mulenet_core::config::ProjectConfig;
use mulenet_detect::report::SuspiciousAccountReport;
use mulenet_detect::AnalysisReport;

use crate::cmd::ingest_and_analyze;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Pretty mode lists at most this many accounts.
const PRETTY_ACCOUNT_LIMIT: usize = 20;

/// Arguments for `mulenet analyze`.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Transaction CSV with transaction_id, sender_id, receiver_id, amount
    /// and timestamp columns.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Execute `mulenet analyze`.
pub fn run_analyze(
    args: &AnalyzeArgs,
    config: &ProjectConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let run = ingest_and_analyze(&args.file, config, output)?;

    let header = RunHeader {
        file: args.file.display().to_string(),
        dropped_rows: run.input.dropped_rows,
        dataset: run.dataset,
        truncated: run.truncated,
    };

    render_mode(output, &run.report, render_analysis_text, |report, w| {
        render_analysis_pretty(report, &header, w)
    })
}

/// Context shown above the pretty report.
struct RunHeader {
    file: String,
    dropped_rows: usize,
    dataset: String,
    truncated: Vec<&'static str>,
}

fn render_analysis_text(report: &AnalysisReport, w: &mut dyn Write) -> std::io::Result<()> {
    let summary = &report.summary;
    writeln!(
        w,
        "summary\t{}\t{}\t{}\t{:.2}",
        summary.total_accounts_analyzed,
        summary.suspicious_accounts_flagged,
        summary.fraud_rings_detected,
        summary.processing_time_seconds
    )?;

    for ring in &report.fraud_rings {
        writeln!(
            w,
            "ring\t{}\t{}\t{:.1}\t{}",
            ring.ring_id,
            ring.pattern_type,
            ring.risk_score,
            ring.member_accounts.join(",")
        )?;
    }

    for account in &report.suspicious_accounts {
        writeln!(
            w,
            "account\t{}\t{:.1}\t{}\t{}",
            account.account_id,
            account.suspicion_score,
            account.ring_id,
            join_patterns(account)
        )?;
    }

    Ok(())
}

fn render_analysis_pretty(
    report: &AnalysisReport,
    header: &RunHeader,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    let summary = &report.summary;

    pretty_section(w, "Summary")?;
    pretty_kv(w, "File", &header.file)?;
    pretty_kv(w, "Dataset", &header.dataset)?;
    if header.dropped_rows > 0 {
        pretty_kv(w, "Dropped rows", header.dropped_rows.to_string())?;
    }
    if !header.truncated.is_empty() {
        pretty_kv(
            w,
            "Partial results",
            format!("{} (search budget exhausted)", header.truncated.join(", ")),
        )?;
    }
    pretty_kv(w, "Accounts", summary.total_accounts_analyzed.to_string())?;
    pretty_kv(w, "Suspicious", summary.suspicious_accounts_flagged.to_string())?;
    pretty_kv(w, "Rings", summary.fraud_rings_detected.to_string())?;
    pretty_kv(w, "Processing time", format!("{:.2}s", summary.processing_time_seconds))?;

    writeln!(w)?;
    pretty_section(w, "Fraud rings")?;
    if report.fraud_rings.is_empty() {
        writeln!(w, "No fraud rings detected.")?;
    } else {
        writeln!(w, "{:<10} {:<9} {:>6}  Members", "Ring", "Pattern", "Risk")?;
        for ring in &report.fraud_rings {
            writeln!(
                w,
                "{:<10} {:<9} {:>6.1}  {}",
                ring.ring_id,
                ring.pattern_type.to_string(),
                ring.risk_score,
                ring.member_accounts.join(", ")
            )?;
        }
    }

    writeln!(w)?;
    pretty_section(w, "Suspicious accounts")?;
    if report.suspicious_accounts.is_empty() {
        writeln!(w, "No suspicious accounts.")?;
        return Ok(());
    }

    writeln!(w, "{:<20} {:>6}  {:<10} Patterns", "Account", "Score", "Ring")?;
    for account in report.suspicious_accounts.iter().take(PRETTY_ACCOUNT_LIMIT) {
        writeln!(
            w,
            "{:<20} {:>6.1}  {:<10} {}",
            account.account_id,
            account.suspicion_score,
            account.ring_id,
            join_patterns(account)
        )?;
    }
    let hidden = report
        .suspicious_accounts
        .len()
        .saturating_sub(PRETTY_ACCOUNT_LIMIT);
    if hidden > 0 {
        writeln!(w, "… {hidden} more (use --json for the full list)")?;
    }

    Ok(())
}

fn join_patterns(account: &SuspiciousAccountReport) -> String {
    account
        .detected_patterns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
