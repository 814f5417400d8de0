//! Prepare command - Clean a raw network before alignment
//!
//! Removes self-interactions and folds parallel interaction or homology
//! records over the same vertex pair with probabilistic OR.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use sna_core::network::PrepareReport;
use sna_core::Network;

use crate::output::{render, OutputFormat, TableDisplay};

/// Result of network preparation
#[derive(Debug, Serialize)]
pub struct PrepareResult {
    pub input: String,
    pub output: String,
    pub vertices: usize,
    pub interactions: usize,
    pub homologies: usize,
    pub report: PrepareReport,
}

impl TableDisplay for PrepareResult {
    fn to_table(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} Prepared network written to {}\n",
            "SUCCESS:".green().bold(),
            self.output
        ));
        output.push_str(&format!("\n{}\n", "Network".cyan().bold()));
        output.push_str(&format!("  Vertices:     {}\n", self.vertices));
        output.push_str(&format!("  Interactions: {}\n", self.interactions.to_string().green()));
        output.push_str(&format!("  Homologies:   {}\n", self.homologies));

        output.push_str(&format!("\n{}\n", "Cleanup".cyan().bold()));
        output.push_str(&format!(
            "  Self-interactions removed:       {}\n",
            self.report.self_interactions
        ));
        output.push_str(&format!(
            "  Parallel interactions combined:  {}\n",
            self.report.interactions_combined
        ));
        output.push_str(&format!(
            "  Parallel homologies combined:    {}\n",
            self.report.homologies_combined
        ));
        if self.report.duplicate_vertices > 0 {
            output.push_str(&format!(
                "  {} {} duplicate vertex records dropped\n",
                "!".yellow(),
                self.report.duplicate_vertices
            ));
        }
        output
    }
}

/// Prepare `input` and write the cleaned network to `output`.
pub fn run(input: &Path, output: &Path, format: OutputFormat) -> Result<()> {
    let mut network =
        Network::read(input).with_context(|| format!("Failed to read network {}", input.display()))?;
    let report = network.prepare();

    // Catch anything preparation cannot fix, such as undeclared vertices.
    network
        .to_graph()
        .with_context(|| format!("Invalid network topology in {}", input.display()))?;

    network
        .write(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let result = PrepareResult {
        input: input.display().to_string(),
        output: output.display().to_string(),
        vertices: network.vertices.len(),
        interactions: network.interactions.len(),
        homologies: network.homologies.len(),
        report,
    };
    render(&result, format)
}
