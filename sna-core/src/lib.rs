//! Struct-NA core: homology-driven network alignment over a dual graph.
//!
//! Two protein-interaction networks that share homologous proteins are
//! loaded into one [`CleverGraph`]: an interaction graph carrying interaction
//! confidences and a homology graph carrying similarity confidences over the
//! same vertices. Three stages then correct the interaction confidences:
//!
//! - **Weight**: score vertex pairs with pluggable [`WeightSource`]s and
//!   create homology edges ([`weight`])
//! - **Merge**: collapse cliques of duplicate vertices ([`merge`])
//! - **Cross**: reinforce interactions conserved across homologs ([`cross`])
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use sna_core::{Network, Pipeline, PipelineConfig};
//! use sna_core::weight::ClassificationWeight;
//!
//! # fn main() -> sna_core::Result<()> {
//! let mut network = Network::read(Path::new("network.json"))?;
//! network.prepare();
//! let (mut graph, accessions) = network.to_graph()?;
//!
//! let mut pipeline = Pipeline::new(PipelineConfig::default())?;
//! pipeline.add_source(ClassificationWeight::from_path(Path::new("scop.tsv"))?);
//! let report = pipeline.run(&mut graph, &accessions)?;
//!
//! Network::from_graph(&graph, &accessions).write(Path::new("aligned.json"))?;
//! println!("{} vertices retired", report.merge.map_or(0, |m| m.vertices_retired));
//! # Ok(())
//! # }
//! ```

pub mod clique;
pub mod cross;
pub mod error;
pub mod graph;
pub mod merge;
pub mod network;
pub mod pipeline;
pub mod probability;
pub mod types;
pub mod weight;

pub use clique::{BronKerbosch, Clique, CliqueFinder};
pub use cross::{CrossReport, CrossingManager};
pub use error::{ConfigError, GraphError, Result, SnaError, WeightError};
pub use graph::CleverGraph;
pub use merge::{MergeManager, MergeReport};
pub use network::Network;
pub use pipeline::{Pipeline, PipelineConfig, PipelineReport, Stage};
pub use types::{HomologyEdge, InteractionEdge, VertexId};
pub use weight::{WeightManager, WeightReport, WeightSource};

/// Version of the sna-core crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
