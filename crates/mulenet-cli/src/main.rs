#![forbid(unsafe_code)]

mod cmd;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mulenet_core::ErrorCode;
use mulenet_core::config::{ProjectConfig, load_project_config};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "mulenet: money-muling ring detection over transaction batches",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true)]
    json: bool,

    /// Read configuration from this file instead of ./mulenet.toml.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Analyse a transaction CSV",
        long_about = "Build the transaction graph from a CSV file, run every detector and print suspicious accounts, fraud rings and the graph projection.",
        after_help = "EXAMPLES:\n    # Human-readable report\n    mulenet analyze transactions.csv\n\n    # Machine-readable report\n    mulenet analyze transactions.csv --json"
    )]
    Analyze(cmd::analyze::AnalyzeArgs),

    #[command(
        about = "Print the annotated transaction graph",
        long_about = "Analyse a transaction CSV and print only the node/edge projection used by visualisation front-ends.",
        after_help = "EXAMPLES:\n    # Graph as JSON\n    mulenet graph transactions.csv --json"
    )]
    Graph(cmd::graph::GraphArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("MULENET_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "mulenet=debug,info"
        } else {
            "mulenet=info,warn"
        })
    });

    let format = env::var("MULENET_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_config(cli: &Cli, project_root: &std::path::Path) -> anyhow::Result<ProjectConfig> {
    match load_project_config(project_root, cli.config.as_deref()) {
        Ok(config) => Ok(config),
        Err(err) => {
            let mode = resolve_output_mode(cli.format, cli.json, None);
            render_error(
                mode,
                &CliError::with_code(
                    format!("{err:#}"),
                    ErrorCode::ConfigParseError.hint(),
                    ErrorCode::ConfigParseError,
                ),
            )?;
            Err(err)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_root = env::current_dir().context("failed to resolve working directory")?;
    let config = load_config(&cli, &project_root)?;
    let output = resolve_output_mode(cli.format, cli.json, config.output.format.as_deref());
    debug!(?output, "output mode resolved");

    match cli.command {
        Commands::Analyze(ref args) => cmd::analyze::run_analyze(args, &config, output),
        Commands::Graph(ref args) => cmd::graph::run_graph(args, &config, output),
    }
}
