//! Data model shared by both halves of the dual graph.
//!
//! Vertices are plain integer ids that denote the same protein in the
//! interaction graph and the homology graph. Edge payloads are small `Copy`
//! values so that stages can snapshot them cheaply.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Opaque vertex identifier, stable until a merge retires it.
pub type VertexId = u32;

/// Returns `(min, max)` so an unordered pair has a single canonical key.
#[inline]
pub fn ordered_pair(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Checks that `value` is a finite probability.
pub fn check_probability(value: f64) -> Result<f64, GraphError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(GraphError::InvalidProbability { value })
    }
}

/// Confidence that a physical interaction between two proteins is real.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionEdge {
    /// Id of the source interaction record this edge was built from.
    pub id: u64,
    pub probability: f64,
}

impl InteractionEdge {
    pub fn new(id: u64, probability: f64) -> Self {
        Self { id, probability }
    }
}

/// Confidence that two vertices are the same or a structurally equivalent entity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HomologyEdge {
    pub probability: f64,
}

impl HomologyEdge {
    pub fn new(probability: f64) -> Self {
        Self { probability }
    }
}

/// Anything that carries an edge probability.
///
/// Lets filtering and combining code work over either sub-graph.
pub trait Weighted {
    fn probability(&self) -> f64;
    fn set_probability(&mut self, probability: f64);
}

impl Weighted for InteractionEdge {
    fn probability(&self) -> f64 {
        self.probability
    }

    fn set_probability(&mut self, probability: f64) {
        self.probability = probability;
    }
}

impl Weighted for HomologyEdge {
    fn probability(&self) -> f64 {
        self.probability
    }

    fn set_probability(&mut self, probability: f64) {
        self.probability = probability;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_pair() {
        assert_eq!(ordered_pair(5, 2), (2, 5));
        assert_eq!(ordered_pair(2, 5), (2, 5));
        assert_eq!(ordered_pair(4, 4), (4, 4));
    }

    #[test]
    fn test_check_probability() {
        assert!(check_probability(0.0).is_ok());
        assert!(check_probability(1.0).is_ok());
        assert!(check_probability(-0.1).is_err());
        assert!(check_probability(1.01).is_err());
        assert!(check_probability(f64::NAN).is_err());
    }
}
