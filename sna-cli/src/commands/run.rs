//! Run command - Align a network through Weight -> Merge -> Cross
//!
//! This command:
//! 1. Loads `.snarc.toml` and merges it with command-line flags
//! 2. Reads the input network, optionally with extra homology edges
//! 3. Registers classification and pair-score weight sources
//! 4. Runs the pipeline, writing per-stage snapshots if asked
//! 5. Writes the aligned network and prints a summary

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use sna_core::weight::{ClassificationWeight, PairTableWeight};
use sna_core::{Network, Pipeline, PipelineConfig, PipelineReport};

use crate::config::SnaConfig;
use crate::output::{millis, render, OutputFormat, TableDisplay};
use crate::{parse_non_negative, parse_probability};

/// Arguments of `sna run`.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Input network (JSON)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the aligned network (JSON)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Maximum homology hops between corresponding interaction endpoints
    #[arg(long)]
    pub xi: Option<u32>,

    /// Minimum homology between interaction partners of merged vertices
    #[arg(long, value_parser = parse_probability)]
    pub delta: Option<f64>,

    /// Homology floor for crossing
    #[arg(long, value_parser = parse_probability)]
    pub tau: Option<f64>,

    /// Homology floor for merge cliques
    #[arg(long, value_parser = parse_probability)]
    pub zeta: Option<f64>,

    /// Relative weight of database sources over alignment sources
    #[arg(long, value_parser = parse_non_negative)]
    pub beta: Option<f64>,

    /// Weighted score at which a homology edge is created
    #[arg(long, value_parser = parse_probability)]
    pub threshold: Option<f64>,

    /// Skip the merge stage
    #[arg(long)]
    pub no_merge: bool,

    /// Skip the crossing stage
    #[arg(long)]
    pub no_cross: bool,

    /// Worker threads for weighting (default: all cores)
    #[arg(long)]
    pub cores: Option<usize>,

    /// Classification table (accession, sccs, optional domain)
    #[arg(long)]
    pub classification: Option<PathBuf>,

    /// Pair score table (accessionA, accessionB, score); repeatable
    #[arg(long)]
    pub scores: Vec<PathBuf>,

    /// Network whose homology edges are added to the input
    #[arg(long)]
    pub homology: Option<PathBuf>,

    /// Remove self-interactions and fold parallel edges before running
    #[arg(long)]
    pub prepare: bool,

    /// Write a JSON snapshot of the network after each stage to this directory
    #[arg(long)]
    pub write_steps: Option<PathBuf>,

    /// Config file (default: .snarc.toml in the working directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fail on .snarc.toml errors instead of silently using defaults
    #[arg(long)]
    pub strict: bool,
}

impl RunArgs {
    /// Command-line flags over config file values over defaults.
    pub fn pipeline_config(&self, file: &SnaConfig) -> PipelineConfig {
        let base = &file.pipeline;
        PipelineConfig {
            xi: self.xi.unwrap_or(base.xi),
            delta: self.delta.unwrap_or(base.delta),
            tau: self.tau.unwrap_or(base.tau),
            zeta: self.zeta.unwrap_or(base.zeta),
            beta: self.beta.unwrap_or(base.beta),
            threshold: self.threshold.unwrap_or(base.threshold),
            no_merge: self.no_merge || base.no_merge,
            no_cross: self.no_cross || base.no_cross,
            num_threads: self.cores.or(base.num_threads),
        }
    }
}

/// Result of a pipeline run
#[derive(Debug, Serialize)]
pub struct RunResult {
    pub input: String,
    pub output: String,
    pub sources: Vec<String>,
    pub steps_dir: Option<String>,
    pub config: PipelineConfig,
    pub report: PipelineReport,
}

impl TableDisplay for RunResult {
    fn to_table(&self) -> String {
        let report = &self.report;
        let mut output = String::new();

        output.push_str(&format!(
            "{} Aligned network written to {}\n",
            "SUCCESS:".green().bold(),
            self.output
        ));

        output.push_str(&format!("\n{}\n", "Summary".cyan().bold()));
        output.push_str(&format!("  Input:    {}\n", self.input));
        output.push_str(&format!(
            "  Vertices: {} -> {}\n",
            report.vertices_before,
            report.vertices_after.to_string().green()
        ));
        output.push_str(&format!("  Duration: {}\n", millis(report.duration).yellow()));
        if let Some(dir) = &self.steps_dir {
            output.push_str(&format!("  Steps:    {}\n", dir));
        }

        output.push_str(&format!("\n{}\n", "Weight".cyan().bold()));
        if self.sources.is_empty() {
            output.push_str(&format!("  {}\n", "no sources; input homology kept".dimmed()));
        } else {
            output.push_str(&format!("  Sources:        {}\n", self.sources.join(", ")));
            output.push_str(&format!(
                "  Pairs scored:   {} ({} skipped)\n",
                report.weight.pairs_evaluated, report.weight.pairs_skipped
            ));
            output.push_str(&format!(
                "  Homology edges: {} new, {} combined\n",
                report.weight.edges_created.to_string().green(),
                report.weight.edges_combined
            ));
            for (name, count) in report.weight.failures.iter().filter(|(_, c)| *c > 0) {
                output.push_str(&format!("  {} {} failed on {} pairs\n", "!".yellow(), name, count));
            }
        }

        output.push_str(&format!("\n{}\n", "Merge".cyan().bold()));
        match &report.merge {
            Some(merge) => {
                output.push_str(&format!(
                    "  Groups merged:    {} of {} candidates\n",
                    merge.groups_merged.to_string().green(),
                    merge.candidates_evaluated
                ));
                output.push_str(&format!("  Vertices retired: {}\n", merge.vertices_retired));
            }
            None => output.push_str(&format!("  {}\n", "skipped".dimmed())),
        }

        output.push_str(&format!("\n{}\n", "Cross".cyan().bold()));
        match &report.cross {
            Some(cross) => {
                output.push_str(&format!(
                    "  Interactions updated: {} of {}\n",
                    cross.interactions_updated.to_string().green(),
                    cross.interactions_examined
                ));
                output.push_str(&format!("  Supporting pairs:     {}\n", cross.contributions));
            }
            None => output.push_str(&format!("  {}\n", "skipped".dimmed())),
        }

        output
    }
}

/// Run the full pipeline.
pub fn run(args: RunArgs, format: OutputFormat) -> Result<()> {
    let file = SnaConfig::load(Path::new("."), args.config.as_deref(), args.strict)?;
    let config = args.pipeline_config(&file);

    let mut network =
        Network::read(&args.input).with_context(|| format!("Failed to read network {}", args.input.display()))?;
    if args.prepare {
        network.prepare();
    }
    if let Some(path) = args.homology.as_ref().or(file.sources.homology.as_ref()) {
        let extra =
            Network::read(path).with_context(|| format!("Failed to read homology network {}", path.display()))?;
        let added = network.absorb_homologies(&extra);
        tracing::info!("Added {} homology records from {}", added, path.display());
    }
    let (mut graph, accessions) = network
        .to_graph()
        .with_context(|| format!("Invalid network topology in {}", args.input.display()))?;

    let mut pipeline = Pipeline::new(config.clone()).context("Invalid pipeline configuration")?;
    let mut sources = Vec::new();

    if let Some(path) = args.classification.as_ref().or(file.sources.classification.as_ref()) {
        let source = ClassificationWeight::from_path(path)
            .with_context(|| format!("Failed to load classification {}", path.display()))?;
        sources.push(format!("classification ({})", source.len()));
        pipeline.add_source(source);
    }
    let score_paths = if args.scores.is_empty() {
        &file.sources.scores
    } else {
        &args.scores
    };
    for path in score_paths {
        let source =
            PairTableWeight::from_path(path).with_context(|| format!("Failed to load scores {}", path.display()))?;
        sources.push(format!("{} ({})", sna_core::WeightSource::name(&source), source.len()));
        pipeline.add_source(source);
    }

    if let Some(dir) = &args.write_steps {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let report = pipeline.run_with(&mut graph, &accessions, |stage, g| {
        if let Some(dir) = &args.write_steps {
            let path = dir.join(format!("{}.json", stage));
            Network::from_graph(g, &accessions).write(&path)?;
            tracing::debug!("Wrote {} snapshot to {}", stage, path.display());
        }
        Ok(())
    })?;

    Network::from_graph(&graph, &accessions)
        .write(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let result = RunResult {
        input: args.input.display().to_string(),
        output: args.output.display().to_string(),
        sources,
        steps_dir: args.write_steps.as_ref().map(|d| d.display().to_string()),
        config,
        report,
    };
    render(&result, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config_file() {
        let file = SnaConfig {
            pipeline: PipelineConfig {
                xi: 4,
                delta: 0.9,
                no_cross: true,
                num_threads: Some(8),
                ..Default::default()
            },
            ..Default::default()
        };
        let args = RunArgs {
            xi: Some(1),
            tau: Some(0.6),
            cores: Some(2),
            ..Default::default()
        };

        let config = args.pipeline_config(&file);
        assert_eq!(config.xi, 1);
        assert_eq!(config.delta, 0.9);
        assert_eq!(config.tau, 0.6);
        assert_eq!(config.zeta, PipelineConfig::default().zeta);
        assert!(config.no_cross);
        assert_eq!(config.num_threads, Some(2));
    }
}
