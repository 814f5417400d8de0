//! Output formatting for sna CLI
//!
//! Every command result renders either as colored human-readable text or as
//! JSON for scripting.

use std::io::IsTerminal;

use clap::ValueEnum;
use serde::Serialize;

/// Output format for CLI results
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    #[default]
    Table,
    /// JSON format for machine consumption
    Json,
}

/// A command result that can be shown to a human.
pub trait TableDisplay: Serialize {
    fn to_table(&self) -> String;
}

/// Print `data` to stdout in the requested format.
pub fn render<T: TableDisplay>(data: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            if !std::io::stdout().is_terminal() {
                colored::control::set_override(false);
            }
            println!("{}", data.to_table());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
    }
    Ok(())
}

/// Milliseconds with two decimals, for summaries.
pub fn millis(duration: std::time::Duration) -> String {
    format!("{:.2}ms", duration.as_secs_f64() * 1000.0)
}
