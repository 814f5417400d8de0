//! JSON network documents: loading, preparation and serialization.
//!
//! ```json
//! {
//!   "vertices": [{"id": 1, "accession": "P29392"}, {"id": 2}],
//!   "interactions": [{"id": 7, "a": 1, "b": 2, "probability": 0.4}],
//!   "homologies": [{"a": 1, "b": 2, "probability": 0.9}]
//! }
//! ```
//!
//! Raw networks often list the same interaction more than once or contain
//! self-interactions. [`Network::prepare`] cleans both up;
//! [`Network::to_graph`] is strict and rejects them.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{GraphError, Result};
use crate::graph::CleverGraph;
use crate::probability;
use crate::types::{ordered_pair, HomologyEdge, InteractionEdge, VertexId};

/// One protein and its external identifier, if known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    pub id: VertexId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accession: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Origin id of the interaction in the source database.
    pub id: u64,
    pub a: VertexId,
    pub b: VertexId,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomologyRecord {
    pub a: VertexId,
    pub b: VertexId,
    pub probability: f64,
}

/// A serialized dual graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub vertices: Vec<VertexRecord>,
    #[serde(default)]
    pub interactions: Vec<InteractionRecord>,
    #[serde(default)]
    pub homologies: Vec<HomologyRecord>,
}

/// Counts from [`Network::prepare`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrepareReport {
    pub duplicate_vertices: usize,
    pub self_interactions: usize,
    /// Interaction records folded into an earlier record for the same pair.
    pub interactions_combined: usize,
    pub self_homologies: usize,
    pub homologies_combined: usize,
}

impl Network {
    /// Read a network from a JSON file.
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let network = Self::from_reader(BufReader::new(file))?;
        debug!(
            "Read {} vertices, {} interactions, {} homologies from {}",
            network.vertices.len(),
            network.interactions.len(),
            network.homologies.len(),
            path.display()
        );
        Ok(network)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the network as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Remove self-edges and fold parallel edges with probabilistic OR.
    ///
    /// The first record for a pair keeps its position and origin id. Repeated
    /// vertex records keep the first one.
    pub fn prepare(&mut self) -> PrepareReport {
        let mut report = PrepareReport::default();

        let mut seen: HashSet<VertexId> = HashSet::new();
        let before = self.vertices.len();
        self.vertices.retain(|v| seen.insert(v.id));
        report.duplicate_vertices = before - self.vertices.len();

        let mut interactions: Vec<InteractionRecord> = Vec::with_capacity(self.interactions.len());
        let mut index: HashMap<(VertexId, VertexId), usize> = HashMap::new();
        for record in self.interactions.drain(..) {
            if record.a == record.b {
                debug!("Dropping self-interaction {} on vertex {}", record.id, record.a);
                report.self_interactions += 1;
                continue;
            }
            match index.get(&ordered_pair(record.a, record.b)) {
                Some(&i) => {
                    let kept = &mut interactions[i];
                    debug!("Folding interaction {} into {} ({}, {})", record.id, kept.id, kept.a, kept.b);
                    kept.probability = probability::or(kept.probability, record.probability);
                    report.interactions_combined += 1;
                }
                None => {
                    index.insert(ordered_pair(record.a, record.b), interactions.len());
                    interactions.push(record);
                }
            }
        }
        self.interactions = interactions;

        let mut homologies: Vec<HomologyRecord> = Vec::with_capacity(self.homologies.len());
        let mut index: HashMap<(VertexId, VertexId), usize> = HashMap::new();
        for record in self.homologies.drain(..) {
            if record.a == record.b {
                report.self_homologies += 1;
                continue;
            }
            match index.get(&ordered_pair(record.a, record.b)) {
                Some(&i) => {
                    let kept = &mut homologies[i];
                    kept.probability = probability::or(kept.probability, record.probability);
                    report.homologies_combined += 1;
                }
                None => {
                    index.insert(ordered_pair(record.a, record.b), homologies.len());
                    homologies.push(record);
                }
            }
        }
        self.homologies = homologies;

        info!(
            "Prepared network: {} self-interactions removed, {} parallel interactions combined",
            report.self_interactions, report.interactions_combined
        );
        report
    }

    /// Fold the homology records of `other` into this network.
    ///
    /// A pair already present is combined with probabilistic OR. Returns the
    /// number of records added or combined.
    pub fn absorb_homologies(&mut self, other: &Network) -> usize {
        let mut index: HashMap<(VertexId, VertexId), usize> = self
            .homologies
            .iter()
            .enumerate()
            .map(|(i, h)| (ordered_pair(h.a, h.b), i))
            .collect();
        for record in &other.homologies {
            let key = ordered_pair(record.a, record.b);
            match index.get(&key) {
                Some(&i) => {
                    let kept = &mut self.homologies[i];
                    kept.probability = probability::or(kept.probability, record.probability);
                }
                None => {
                    index.insert(key, self.homologies.len());
                    self.homologies.push(record.clone());
                }
            }
        }
        other.homologies.len()
    }

    /// Build the dual graph and the vertex -> accession map.
    ///
    /// Fails on edges to undeclared vertices, self-loops, parallel edges and
    /// probabilities outside [0, 1]. Vertices without an accession are kept
    /// but will not be weighted.
    pub fn to_graph(&self) -> std::result::Result<(CleverGraph, HashMap<VertexId, String>), GraphError> {
        let mut graph = CleverGraph::new();
        let mut accessions = HashMap::new();
        let mut missing = 0usize;

        for vertex in &self.vertices {
            if !graph.add_vertex(vertex.id) {
                warn!("Vertex {} declared twice; keeping the first record", vertex.id);
                continue;
            }
            match &vertex.accession {
                Some(accession) if !accession.is_empty() => {
                    accessions.insert(vertex.id, accession.clone());
                }
                _ => missing += 1,
            }
        }
        if missing > 0 {
            warn!("{} vertices have no accession and cannot be weighted", missing);
        }

        for record in &self.interactions {
            graph.add_interaction(record.a, record.b, InteractionEdge::new(record.id, record.probability))?;
        }
        for record in &self.homologies {
            graph.add_homology(record.a, record.b, HomologyEdge::new(record.probability))?;
        }

        Ok((graph, accessions))
    }

    /// Serialize a dual graph with vertices and edges in ascending id order.
    pub fn from_graph(graph: &CleverGraph, accessions: &HashMap<VertexId, String>) -> Self {
        Self {
            vertices: graph
                .vertices()
                .into_iter()
                .map(|id| VertexRecord {
                    id,
                    accession: accessions.get(&id).cloned(),
                })
                .collect(),
            interactions: graph
                .interactions()
                .into_iter()
                .map(|(a, b, edge)| InteractionRecord {
                    id: edge.id,
                    a,
                    b,
                    probability: edge.probability,
                })
                .collect(),
            homologies: graph
                .homologies()
                .into_iter()
                .map(|(a, b, edge)| HomologyRecord {
                    a,
                    b,
                    probability: edge.probability,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const RAW: &str = r#"{
        "vertices": [
            {"id": 1, "accession": "P29392"},
            {"id": 2, "accession": "P35495"},
            {"id": 3},
            {"id": 1, "accession": "ignored"}
        ],
        "interactions": [
            {"id": 10, "a": 1, "b": 2, "probability": 0.5},
            {"id": 11, "a": 2, "b": 2, "probability": 0.9},
            {"id": 12, "a": 2, "b": 1, "probability": 0.5},
            {"id": 13, "a": 2, "b": 3, "probability": 0.2}
        ]
    }"#;

    #[test]
    fn test_prepare_folds_and_drops() {
        let mut network = Network::from_reader(RAW.as_bytes()).unwrap();
        let report = network.prepare();

        assert_eq!(
            report,
            PrepareReport {
                duplicate_vertices: 1,
                self_interactions: 1,
                interactions_combined: 1,
                ..Default::default()
            }
        );
        assert_eq!(network.vertices.len(), 3);
        assert_eq!(network.interactions.len(), 2);
        assert_eq!(network.interactions[0].id, 10);
        assert_abs_diff_eq!(network.interactions[0].probability, 0.75);
    }

    #[test]
    fn test_to_graph_requires_prepared_input() {
        let network = Network::from_reader(RAW.as_bytes()).unwrap();
        assert!(matches!(network.to_graph(), Err(GraphError::SelfLoop { vertex: 2 })));
    }

    #[test]
    fn test_to_graph_rejects_undeclared_vertex() {
        let network = Network {
            vertices: vec![VertexRecord { id: 1, accession: None }],
            interactions: vec![InteractionRecord {
                id: 1,
                a: 1,
                b: 9,
                probability: 0.5,
            }],
            homologies: vec![],
        };
        assert!(matches!(network.to_graph(), Err(GraphError::InvalidVertex { vertex: 9 })));
    }

    #[test]
    fn test_graph_round_trip_is_sorted() {
        let mut network = Network::from_reader(RAW.as_bytes()).unwrap();
        network.prepare();
        network.homologies.push(HomologyRecord {
            a: 3,
            b: 1,
            probability: 0.6,
        });

        let (graph, accessions) = network.to_graph().unwrap();
        assert_eq!(accessions.len(), 2);
        assert!(!accessions.contains_key(&3));

        let out = Network::from_graph(&graph, &accessions);
        assert_eq!(out.vertices.iter().map(|v| v.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(out.vertices[0].accession.as_deref(), Some("P29392"));
        assert_eq!(
            out.interactions.iter().map(|i| (i.a, i.b)).collect::<Vec<_>>(),
            vec![(1, 2), (2, 3)]
        );
        assert_eq!(out.homologies[0].a, 1);
        assert_eq!(out.homologies[0].b, 3);
    }

    #[test]
    fn test_absorb_homologies() {
        let mut network = Network {
            homologies: vec![HomologyRecord {
                a: 1,
                b: 2,
                probability: 0.5,
            }],
            ..Default::default()
        };
        let other = Network {
            homologies: vec![
                HomologyRecord {
                    a: 2,
                    b: 1,
                    probability: 0.5,
                },
                HomologyRecord {
                    a: 2,
                    b: 3,
                    probability: 0.4,
                },
            ],
            ..Default::default()
        };

        assert_eq!(network.absorb_homologies(&other), 2);
        assert_eq!(network.homologies.len(), 2);
        assert_abs_diff_eq!(network.homologies[0].probability, 0.75);
    }

    #[test]
    fn test_write_and_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.json");
        let mut network = Network::from_reader(RAW.as_bytes()).unwrap();
        network.prepare();

        network.write(&path).unwrap();
        assert_eq!(Network::read(&path).unwrap(), network);
    }
}
