//! Error types for sna-core.

use std::fmt;

use thiserror::Error;

use crate::types::VertexId;

/// Result type alias for sna-core operations.
pub type Result<T> = std::result::Result<T, SnaError>;

/// Which half of a [`CleverGraph`](crate::graph::CleverGraph) an edge lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Interaction,
    Homology,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Interaction => write!(f, "interaction"),
            EdgeKind::Homology => write!(f, "homology"),
        }
    }
}

/// Structural violations of the dual-graph model.
///
/// These indicate a modeling error upstream and are never dropped silently.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// An edge or lookup referenced a vertex that is not in the graph.
    #[error("Invalid vertex: {vertex} is not in the graph")]
    InvalidVertex {
        /// The missing vertex id.
        vertex: VertexId,
    },

    /// Neither sub-graph admits self-loops.
    #[error("Self-loop on vertex {vertex} is not allowed")]
    SelfLoop {
        /// The vertex both endpoints referred to.
        vertex: VertexId,
    },

    /// A second edge was added over an unordered pair that already has one.
    #[error("Duplicate {kind} edge between {a} and {b}")]
    DuplicateEdge {
        /// Sub-graph the edge was added to.
        kind: EdgeKind,
        /// First endpoint.
        a: VertexId,
        /// Second endpoint.
        b: VertexId,
    },

    /// Edge probabilities must be finite and lie in [0, 1].
    #[error("Invalid probability {value}: must be within [0, 1]")]
    InvalidProbability {
        /// The rejected value.
        value: f64,
    },
}

/// Invalid pipeline configuration, rejected before any stage runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A probability threshold outside [0, 1] or not finite.
    #[error("{name} must be a probability within [0, 1], got {value}")]
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A weight that must be non-negative and finite.
    #[error("{name} must be non-negative and finite, got {value}")]
    Negative {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// A weight source could not score a pair.
///
/// The aggregator treats every variant as a zero contribution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeightError {
    /// The source has no data for this identifier.
    #[error("No data for identifier {id}")]
    UnknownIdentifier {
        /// External identifier that was looked up.
        id: String,
    },

    /// The source has data for both identifiers but not for the pair.
    #[error("No score for pair ({a}, {b})")]
    MissingPair {
        /// First identifier.
        a: String,
        /// Second identifier.
        b: String,
    },

    /// Any other source-specific failure.
    #[error("Source {source_name} unavailable: {reason}")]
    Unavailable {
        /// Name of the failing source.
        source_name: String,
        /// Description of the failure.
        reason: String,
    },
}

/// Top-level error for sna-core.
#[derive(Error, Debug)]
pub enum SnaError {
    /// Dual-graph invariant violation.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Rejected configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed line in a tabular input.
    #[error("Parse error in {path} at line {line}: {message}")]
    Parse {
        /// File being parsed.
        path: String,
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// IO error reading or writing network files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error for network documents.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
