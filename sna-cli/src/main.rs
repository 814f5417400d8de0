//! sna CLI - Command-line interface for Struct-NA
//!
//! Aligns protein interaction networks using homology evidence: weights
//! homology edges, merges duplicate proteins and crosses conserved
//! interactions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::run::RunArgs;
use output::OutputFormat;

/// Parse and validate a probability (must be between 0.0 and 1.0)
fn parse_probability(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(format!("must be between 0.0 and 1.0, got {}", value));
    }
    Ok(value)
}

/// Parse and validate a non-negative weight
fn parse_non_negative(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("must be a non-negative number, got {}", value));
    }
    Ok(value)
}

/// Homology-aware protein interaction network alignment.
#[derive(Parser)]
#[command(name = "sna")]
#[command(author, version)]
#[command(about = "Homology-aware protein interaction network alignment")]
#[command(propagate_version = true)]
#[command(after_help = "Examples:
  sna prepare raw.json net.json
  sna run -i net.json -o aligned.json --classification scop.tsv
  sna cliques net.json --floor 0.4")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Weight, merge and cross a network
    Run(RunArgs),

    /// Remove self-interactions and fold parallel edges
    Prepare {
        /// Raw input network (JSON)
        input: PathBuf,

        /// Where to write the prepared network (JSON)
        output: PathBuf,
    },

    /// List cliques of the homology graph
    Cliques {
        /// Input network (JSON)
        input: PathBuf,

        /// Ignore homology edges below this probability
        #[arg(long, default_value = "0.0", value_parser = parse_probability)]
        floor: f64,

        /// Only the largest cliques
        #[arg(long)]
        maximum: bool,
    },
}

/// Setup logging based on verbosity flags
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn,sna=info,sna_core=info"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);
    tracing::debug!("sna {} (core {})", env!("CARGO_PKG_VERSION"), sna_core::VERSION);

    match cli.command {
        Commands::Run(args) => commands::run::run(args, cli.format),
        Commands::Prepare { input, output } => commands::prepare::run(&input, &output, cli.format),
        Commands::Cliques { input, floor, maximum } => commands::cliques::run(&input, floor, maximum, cli.format),
    }
}
