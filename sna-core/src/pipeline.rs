//! Stage sequencing: Weight -> Merge -> Cross over one [`CleverGraph`].

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cross::{CrossReport, CrossingManager};
use crate::error::{ConfigError, Result};
use crate::graph::CleverGraph;
use crate::merge::{MergeManager, MergeReport};
use crate::types::VertexId;
use crate::weight::{WeightManager, WeightReport, WeightSource};

/// Default maximum homology hops for crossing.
pub const DEFAULT_XI: u32 = 2;
/// Default minimum partner homology for merging.
pub const DEFAULT_DELTA: f64 = 0.7;
/// Default homology floor for crossing.
pub const DEFAULT_TAU: f64 = 0.5;
/// Default homology floor for merge cliques.
pub const DEFAULT_ZETA: f64 = 0.4;
/// Default coefficient of database weight sources.
pub const DEFAULT_BETA: f64 = 1.0;
/// Default score at which weighting creates a homology edge.
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Parameters of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum homology hops between corresponding interaction endpoints.
    pub xi: u32,
    /// Minimum homology between interaction partners of merged vertices.
    pub delta: f64,
    /// Homology edges below this are ignored while crossing.
    pub tau: f64,
    /// Homology edges below this are ignored while searching merge cliques.
    pub zeta: f64,
    /// Relative weight of database sources against alignment sources.
    pub beta: f64,
    /// Weighted score at which a homology edge is created.
    pub threshold: f64,
    pub no_merge: bool,
    pub no_cross: bool,
    /// Worker threads for weighting; `None` uses the global Rayon pool.
    pub num_threads: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            xi: DEFAULT_XI,
            delta: DEFAULT_DELTA,
            tau: DEFAULT_TAU,
            zeta: DEFAULT_ZETA,
            beta: DEFAULT_BETA,
            threshold: DEFAULT_THRESHOLD,
            no_merge: false,
            no_cross: false,
            num_threads: None,
        }
    }
}

impl PipelineConfig {
    /// Reject thresholds outside [0, 1] and a negative or non-finite `beta`.
    ///
    /// `zeta > tau` is accepted with a warning.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (name, value) in [
            ("delta", self.delta),
            ("tau", self.tau),
            ("zeta", self.zeta),
            ("threshold", self.threshold),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { name, value });
            }
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(ConfigError::Negative {
                name: "beta",
                value: self.beta,
            });
        }
        if self.zeta > self.tau {
            warn!(
                "zeta ({}) is above tau ({}): merging will ignore homology that crossing uses",
                self.zeta, self.tau
            );
        }
        Ok(())
    }
}

/// A pipeline stage, reported to observers after it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Weight,
    Merge,
    Cross,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Weight => "weight",
            Stage::Merge => "merge",
            Stage::Cross => "cross",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What each stage did. Skipped stages have no report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub weight: WeightReport,
    pub merge: Option<MergeReport>,
    pub cross: Option<CrossReport>,
    pub vertices_before: usize,
    pub vertices_after: usize,
    pub duration: Duration,
}

/// Runs the configured stages in order over a dual graph.
pub struct Pipeline {
    config: PipelineConfig,
    weights: WeightManager,
}

impl Pipeline {
    /// Validate `config` and build a pipeline with no weight sources.
    pub fn new(config: PipelineConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let weights = WeightManager::new(config.threshold).with_threads(config.num_threads);
        Ok(Self { config, weights })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Register a source with the coefficient its kind implies (1 or `beta`).
    pub fn add_source<S>(&mut self, source: S) -> &mut Self
    where
        S: WeightSource + 'static,
    {
        self.weights.add_with_beta(source, self.config.beta);
        self
    }

    /// Direct access to the weight aggregator, e.g. for explicit coefficients.
    pub fn weights_mut(&mut self) -> &mut WeightManager {
        &mut self.weights
    }

    /// Run every enabled stage.
    pub fn run(&self, graph: &mut CleverGraph, accessions: &HashMap<VertexId, String>) -> Result<PipelineReport> {
        self.run_with(graph, accessions, |_, _| Ok(()))
    }

    /// Run every enabled stage, calling `observer` after each one completes.
    ///
    /// An observer error stops the pipeline.
    pub fn run_with<F>(
        &self,
        graph: &mut CleverGraph,
        accessions: &HashMap<VertexId, String>,
        mut observer: F,
    ) -> Result<PipelineReport>
    where
        F: FnMut(Stage, &CleverGraph) -> Result<()>,
    {
        let start = Instant::now();
        let mut report = PipelineReport {
            vertices_before: graph.vertex_count(),
            ..Default::default()
        };
        info!(
            "Pipeline: {} vertices, {} interactions, {} homologies",
            graph.vertex_count(),
            graph.interaction_count(),
            graph.homology_count()
        );

        report.weight = self.weights.assign_weights(graph, accessions)?;
        observer(Stage::Weight, graph)?;

        if self.config.no_merge {
            info!("Merge disabled");
        } else {
            let merge = MergeManager::new(self.config.zeta, self.config.delta).merge(graph)?;
            report.merge = Some(merge);
            observer(Stage::Merge, graph)?;
        }

        if self.config.no_cross {
            info!("Crossing disabled");
        } else {
            let cross = CrossingManager::new(self.config.xi, self.config.tau).cross(graph);
            report.cross = Some(cross);
            observer(Stage::Cross, graph)?;
        }

        report.vertices_after = graph.vertex_count();
        report.duration = start.elapsed();
        info!(
            "Pipeline finished in {:?}: {} -> {} vertices",
            report.duration, report.vertices_before, report.vertices_after
        );
        Ok(report)
    }
}
