//! Cliques command - List homology cliques of a network
//!
//! Shows the maximal (or maximum) cliques of the homology graph after
//! dropping edges below a floor, in the same order the merge stage
//! considers them.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use sna_core::{BronKerbosch, CliqueFinder, Network, VertexId};

use crate::output::{render, OutputFormat, TableDisplay};

/// One clique with its members' accessions where known.
#[derive(Debug, Serialize)]
pub struct CliqueEntry {
    pub size: usize,
    pub members: Vec<VertexId>,
    pub accessions: Vec<Option<String>>,
}

/// Result of clique enumeration
#[derive(Debug, Serialize)]
pub struct CliquesResult {
    pub input: String,
    pub floor: f64,
    pub maximum: bool,
    pub cliques: Vec<CliqueEntry>,
}

impl TableDisplay for CliquesResult {
    fn to_table(&self) -> String {
        let kind = if self.maximum { "maximum" } else { "maximal" };
        let mut output = format!(
            "{} {} cliques in {} (floor {})\n",
            self.cliques.len().to_string().green().bold(),
            kind,
            self.input,
            self.floor
        );
        for clique in &self.cliques {
            let members: Vec<String> = clique
                .members
                .iter()
                .zip(&clique.accessions)
                .map(|(v, acc)| match acc {
                    Some(acc) => format!("{} ({})", v, acc.as_str().dimmed()),
                    None => v.to_string(),
                })
                .collect();
            output.push_str(&format!("  [{}] {}\n", clique.size.to_string().cyan(), members.join(", ")));
        }
        output
    }
}

/// Enumerate cliques of the homology graph of `input`.
pub fn run(input: &Path, floor: f64, maximum: bool, format: OutputFormat) -> Result<()> {
    let mut network =
        Network::read(input).with_context(|| format!("Failed to read network {}", input.display()))?;
    network.prepare();
    let (graph, accessions) = network
        .to_graph()
        .with_context(|| format!("Invalid network topology in {}", input.display()))?;

    let homology = graph.filtered_homology(floor);
    let finder = BronKerbosch::new();
    let cliques = if maximum {
        finder.maximum_cliques(&homology)
    } else {
        finder.maximal_cliques(&homology)
    };

    let result = CliquesResult {
        input: input.display().to_string(),
        floor,
        maximum,
        cliques: cliques
            .into_iter()
            .map(|c| entry(c.into_iter().collect(), &accessions))
            .collect(),
    };
    render(&result, format)
}

fn entry(members: Vec<VertexId>, accessions: &HashMap<VertexId, String>) -> CliqueEntry {
    CliqueEntry {
        size: members.len(),
        accessions: members.iter().map(|v| accessions.get(v).cloned()).collect(),
        members,
    }
}
