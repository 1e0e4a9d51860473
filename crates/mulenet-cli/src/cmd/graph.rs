//! `mulenet graph`: the annotated node/edge projection only.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use mulenet_core::config::ProjectConfig;
use mulenet_detect::report::GraphProjection;

use crate::cmd::ingest_and_analyze;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `mulenet graph`.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Transaction CSV to project.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Execute `mulenet graph`.
pub fn run_graph(args: &GraphArgs, config: &ProjectConfig, output: OutputMode) -> anyhow::Result<()> {
    let run = ingest_and_analyze(&args.file, config, output)?;
    render_mode(output, &run.report.graph, render_graph_text, render_graph_pretty)
}

fn render_graph_text(graph: &GraphProjection, w: &mut dyn Write) -> std::io::Result<()> {
    for node in &graph.nodes {
        writeln!(
            w,
            "node\t{}\t{:.2}\t{:.2}\t{}\t{}\t{:.1}\t{}",
            node.id,
            node.total_sent,
            node.total_received,
            node.tx_count,
            node.suspicious,
            node.score,
            node.rings.join(",")
        )?;
    }
    for edge in &graph.edges {
        writeln!(
            w,
            "edge\t{}\t{}\t{:.2}\t{}",
            edge.source, edge.target, edge.amount, edge.count
        )?;
    }
    Ok(())
}

fn render_graph_pretty(graph: &GraphProjection, w: &mut dyn Write) -> std::io::Result<()> {
    let suspicious = graph.nodes.iter().filter(|node| node.suspicious).count();

    pretty_section(w, "Graph")?;
    pretty_kv(w, "Nodes", graph.nodes.len().to_string())?;
    pretty_kv(w, "Edges", graph.edges.len().to_string())?;
    pretty_kv(w, "Suspicious", suspicious.to_string())?;

    writeln!(w)?;
    pretty_section(w, "Accounts")?;
    writeln!(
        w,
        "{:<20} {:>12} {:>12} {:>5} {:>6}  Rings",
        "Account", "Sent", "Received", "Txs", "Score"
    )?;
    for node in &graph.nodes {
        let marker = if node.suspicious { "!" } else { " " };
        writeln!(
            w,
            "{:<20} {:>12.2} {:>12.2} {:>5} {:>6.1}{marker} {}",
            node.id,
            node.total_sent,
            node.total_received,
            node.tx_count,
            node.score,
            node.rings.join(", ")
        )?;
    }

    writeln!(w)?;
    pretty_section(w, "Flows")?;
    if graph.edges.is_empty() {
        writeln!(w, "No flows.")?;
        return Ok(());
    }
    for edge in &graph.edges {
        writeln!(
            w,
            "{} -> {}  {:.2} ({} tx)",
            edge.source, edge.target, edge.amount, edge.count
        )?;
    }
    Ok(())
}
