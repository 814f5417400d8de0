//! Homology weighting: folds pluggable score sources into homology edges.
//!
//! Every unordered pair of distinct vertices that both carry an external
//! accession is scored by every registered [`WeightSource`]:
//!
//! ```text
//! score(a, b) = Σ coefficient_i × source_i(a, b)
//! ```
//!
//! A source that fails for a pair contributes 0 and the pair is still
//! scored by the others. Most pairs have no structural data for most
//! sources, so failure is the common case, not an error. Pairs with
//! `score >= threshold` become homology edges.
//!
//! # Cost
//!
//! Pair enumeration is O(V² × S) for V weighted vertices and S sources and
//! dominates the whole pipeline; homology is pairwise and has no cheaper
//! index. Pairs are evaluated in parallel with Rayon and, for a positive
//! threshold, skipped early when no source [covers](WeightSource::covers)
//! both accessions. Edges are
//! inserted afterwards by a single writer in sorted pair order.

use std::collections::HashMap;
use std::io::BufRead;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{GraphError, Result, SnaError, WeightError};
use crate::graph::CleverGraph;
use crate::probability;
use crate::types::{HomologyEdge, VertexId};

pub mod classification;
pub mod table;

pub use classification::{Classification, ClassificationLevel, ClassificationWeight};
pub use table::PairTableWeight;

/// Broad family of evidence a source provides.
///
/// Database sources are scaled by `beta` relative to alignment sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Pairwise structure or sequence alignment scores.
    Alignment,
    /// Curated classification databases.
    Database,
}

/// A pluggable, partially-failing homology score source.
pub trait WeightSource: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// What kind of evidence this source provides.
    fn kind(&self) -> SourceKind;

    /// Score the pair of external identifiers, or explain why it cannot.
    fn score(&self, a: &str, b: &str) -> std::result::Result<f64, WeightError>;

    /// Whether the source could possibly score a pair involving `id`.
    ///
    /// Used only to skip hopeless pairs early; the default is `true`.
    fn covers(&self, _id: &str) -> bool {
        true
    }
}

struct Registered {
    source: Box<dyn WeightSource>,
    coefficient: f64,
}

/// Outcome of one weighting pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WeightReport {
    /// Vertices with an accession that took part in pair enumeration.
    pub vertices: usize,
    /// Vertices left out for lack of an accession.
    pub vertices_without_accession: usize,
    pub pairs_evaluated: usize,
    /// Pairs no source covered, skipped under a positive threshold.
    pub pairs_skipped: usize,
    /// New homology edges.
    pub edges_created: usize,
    /// Scores folded into a homology edge that already existed.
    pub edges_combined: usize,
    /// Per-source failure counts, in registration order.
    pub failures: Vec<(String, usize)>,
    pub duration: Duration,
}

/// Sums weighted source scores and materializes homology edges.
pub struct WeightManager {
    sources: Vec<Registered>,
    threshold: f64,
    num_threads: Option<usize>,
}

impl WeightManager {
    /// Create a manager with no sources.
    ///
    /// # Arguments
    ///
    /// * `threshold` - Minimum combined score for a homology edge
    pub fn new(threshold: f64) -> Self {
        Self {
            sources: Vec::new(),
            threshold,
            num_threads: None,
        }
    }

    /// Use a dedicated pool of `num_threads` workers (defaults to Rayon's global pool).
    pub fn with_threads(mut self, num_threads: Option<usize>) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Register a source with an explicit coefficient.
    pub fn add<S>(&mut self, source: S, coefficient: f64) -> &mut Self
    where
        S: WeightSource + 'static,
    {
        self.add_boxed(Box::new(source), coefficient)
    }

    /// Register an already boxed source.
    pub fn add_boxed(&mut self, source: Box<dyn WeightSource>, coefficient: f64) -> &mut Self {
        debug!(
            "Registered weight source {} ({:?}) with coefficient {}",
            source.name(),
            source.kind(),
            coefficient
        );
        self.sources.push(Registered { source, coefficient });
        self
    }

    /// Register a source with the coefficient implied by its kind:
    /// 1 for alignment sources, `beta` for database sources.
    pub fn add_with_beta<S>(&mut self, source: S, beta: f64) -> &mut Self
    where
        S: WeightSource + 'static,
    {
        let coefficient = match source.kind() {
            SourceKind::Alignment => 1.0,
            SourceKind::Database => beta,
        };
        self.add(source, coefficient)
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if no sources are registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Combined score for one pair of accessions. Failing sources add nothing.
    pub fn score(&self, a: &str, b: &str) -> f64 {
        self.score_counting(a, b, None)
    }

    fn score_counting(&self, a: &str, b: &str, failures: Option<&[AtomicUsize]>) -> f64 {
        let mut score = 0.0;
        for (i, registered) in self.sources.iter().enumerate() {
            match registered.source.score(a, b) {
                Ok(value) => score += registered.coefficient * value,
                Err(e) => {
                    if let Some(counters) = failures {
                        counters[i].fetch_add(1, Ordering::Relaxed);
                    }
                    debug!("{} could not score ({}, {}): {}", registered.source.name(), a, b, e);
                }
            }
        }
        score
    }

    fn any_covers(&self, a: &str, b: &str) -> bool {
        self.sources
            .iter()
            .any(|r| r.source.covers(a) && r.source.covers(b))
    }

    /// Score every pair of accession-bearing vertices and add homology edges.
    ///
    /// # Arguments
    ///
    /// * `graph` - Dual graph to receive homology edges
    /// * `accessions` - External identifier of each vertex; vertices missing
    ///   from the map are not weighted
    ///
    /// # Returns
    ///
    /// A report of what was scored and inserted.
    pub fn assign_weights(
        &self,
        graph: &mut CleverGraph,
        accessions: &HashMap<VertexId, String>,
    ) -> std::result::Result<WeightReport, GraphError> {
        let start = Instant::now();
        let mut report = WeightReport::default();

        if self.sources.is_empty() {
            info!("No weight sources registered; keeping existing homology edges");
            return Ok(report);
        }

        let vertices: Vec<(VertexId, &str)> = graph
            .vertices()
            .into_iter()
            .filter_map(|v| accessions.get(&v).map(|acc| (v, acc.as_str())))
            .collect();
        report.vertices = vertices.len();
        report.vertices_without_accession = graph.vertex_count() - vertices.len();
        if report.vertices_without_accession > 0 {
            warn!(
                "{} vertices have no accession and will not be weighted",
                report.vertices_without_accession
            );
        }

        let failures: Vec<AtomicUsize> = self.sources.iter().map(|_| AtomicUsize::new(0)).collect();
        let evaluated = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);
        let n = vertices.len();

        let compute = || -> Vec<(VertexId, VertexId, f64)> {
            (0..n)
                .into_par_iter()
                .flat_map_iter(|i| {
                    let (a, acc_a) = vertices[i];
                    let vertices = &vertices;
                    let failures = &failures;
                    let evaluated = &evaluated;
                    let skipped = &skipped;
                    ((i + 1)..n).filter_map(move |j| {
                        let (b, acc_b) = vertices[j];
                        // Uncovered pairs score 0, so they can only be skipped
                        // when 0 falls short of the threshold.
                        if self.threshold > 0.0 && !self.any_covers(acc_a, acc_b) {
                            skipped.fetch_add(1, Ordering::Relaxed);
                            return None;
                        }
                        evaluated.fetch_add(1, Ordering::Relaxed);
                        let score = self.score_counting(acc_a, acc_b, Some(failures.as_slice()));
                        (score >= self.threshold).then_some((a, b, score))
                    })
                })
                .collect()
        };

        let pool = match self.num_threads {
            Some(n) if n > 0 => rayon::ThreadPoolBuilder::new().num_threads(n).build().ok(),
            _ => None,
        };
        let mut hits = match pool {
            Some(pool) => pool.install(compute),
            None => compute(),
        };
        hits.sort_by_key(|&(a, b, _)| (a, b));

        // Single writer: every insertion happens here, in pair order.
        for (a, b, score) in hits {
            let clamped = probability::clamp(score);
            if clamped != score {
                debug!("Clamped score {} for ({}, {}) to {}", score, a, b, clamped);
            }
            match graph.find_homology_mut(a, b) {
                Some(existing) => {
                    existing.probability = probability::or(existing.probability, clamped);
                    report.edges_combined += 1;
                }
                None => {
                    graph.add_homologies(HomologyEdge::new(clamped), &[a, b])?;
                    report.edges_created += 1;
                }
            }
        }

        report.pairs_evaluated = evaluated.into_inner();
        report.pairs_skipped = skipped.into_inner();
        report.failures = self
            .sources
            .iter()
            .zip(failures)
            .map(|(r, count)| (r.source.name().to_string(), count.into_inner()))
            .collect();
        for (name, count) in &report.failures {
            if *count > 0 {
                warn!("Weight source {} failed on {} pairs (scored as 0)", name, count);
            }
        }
        report.duration = start.elapsed();

        info!(
            "Weighted {} pairs ({} skipped): {} homology edges created, {} combined in {:?}",
            report.pairs_evaluated,
            report.pairs_skipped,
            report.edges_created,
            report.edges_combined,
            report.duration
        );

        Ok(report)
    }
}

/// Reads the data rows of a tab- or whitespace-separated file.
///
/// Blank lines and `#` comments are skipped. Each row is returned with its
/// one-based line number; rows with fewer than `min_columns` fields fail.
pub(crate) fn read_rows<R: BufRead>(reader: R, path: &str, min_columns: usize) -> Result<Vec<(usize, Vec<String>)>> {
    let mut rows = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<String> = trimmed.split_whitespace().map(str::to_string).collect();
        if fields.len() < min_columns {
            return Err(SnaError::Parse {
                path: path.to_string(),
                line: index + 1,
                message: format!("expected at least {} columns, found {}", min_columns, fields.len()),
            });
        }
        rows.push((index + 1, fields));
    }
    Ok(rows)
}
