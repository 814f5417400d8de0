//! Dual graph model powered by petgraph.
//!
//! A [`CleverGraph`] owns two undirected graphs over one vertex-id space:
//! the interaction graph (physical protein-protein interaction evidence) and
//! the homology graph (structural/sequence similarity evidence). Every stage
//! of the pipeline borrows the same value mutably, one stage at a time.
//!
//! # Architecture
//!
//! ```text
//! Network (JSON) -> CleverGraph -> weight -> merge -> cross -> Network (JSON)
//! ```
//!
//! # Key Features
//!
//! - **Shared vertex set**: both sub-graphs always hold exactly the same vertices
//! - **Fail-fast topology**: self-loops, parallel edges and dangling endpoints are errors
//! - **Deterministic views**: vertex and edge listings are sorted by id
//! - **Bounded BFS**: hop-limited reachability over a filtered homology graph

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::algo::kosaraju_scc;
use petgraph::graphmap::UnGraphMap;

use crate::error::{EdgeKind, GraphError};
use crate::probability;
use crate::types::{check_probability, ordered_pair, HomologyEdge, InteractionEdge, VertexId, Weighted};

/// Interaction half of a [`CleverGraph`].
pub type InteractionGraph = UnGraphMap<VertexId, InteractionEdge>;

/// Homology half of a [`CleverGraph`].
pub type HomologyGraph = UnGraphMap<VertexId, HomologyEdge>;

/// Two coupled undirected graphs over a shared vertex set.
///
/// Invariants:
/// - no self-loops in either graph
/// - at most one edge per unordered vertex pair in each graph
/// - every edge endpoint is a vertex of both graphs
#[derive(Clone, Debug, Default)]
pub struct CleverGraph {
    interaction: InteractionGraph,
    homology: HomologyGraph,
}

/// What happened to the edges of a group collapsed by [`CleverGraph::collapse`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Collapse {
    /// Surviving vertex that now stands for the whole group.
    pub representative: VertexId,
    /// Group members removed from the graph.
    pub retired: Vec<VertexId>,
    /// Interaction edges re-pointed to the representative.
    pub interactions_repointed: usize,
    /// Interaction edges folded into an existing edge of the representative.
    pub interactions_combined: usize,
    /// Interaction edges between two group members, dropped.
    pub interactions_dropped: usize,
    /// Homology edges re-pointed to the representative.
    pub homologies_repointed: usize,
    /// Homology edges folded into an existing edge of the representative.
    pub homologies_combined: usize,
    /// Homology edges between two group members, dropped.
    pub homologies_dropped: usize,
}

impl CleverGraph {
    /// Create an empty dual graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dual graph holding the given vertices and no edges.
    pub fn with_vertices<I>(vertices: I) -> Self
    where
        I: IntoIterator<Item = VertexId>,
    {
        let mut graph = Self::new();
        for v in vertices {
            graph.add_vertex(v);
        }
        graph
    }

    /// Add a vertex to both sub-graphs. Returns `false` if it already existed.
    pub fn add_vertex(&mut self, v: VertexId) -> bool {
        if self.interaction.contains_node(v) {
            return false;
        }
        self.interaction.add_node(v);
        self.homology.add_node(v);
        true
    }

    /// Remove a vertex and every edge touching it in either sub-graph.
    pub fn remove_vertex(&mut self, v: VertexId) -> Result<(), GraphError> {
        self.require(v)?;
        self.interaction.remove_node(v);
        self.homology.remove_node(v);
        Ok(())
    }

    /// Check if a vertex exists.
    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.interaction.contains_node(v)
    }

    /// All vertices in ascending id order.
    pub fn vertices(&self) -> Vec<VertexId> {
        let mut vertices: Vec<VertexId> = self.interaction.nodes().collect();
        vertices.sort_unstable();
        vertices
    }

    /// Get the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.interaction.node_count()
    }

    /// Get the number of interaction edges.
    pub fn interaction_count(&self) -> usize {
        self.interaction.edge_count()
    }

    /// Get the number of homology edges.
    pub fn homology_count(&self) -> usize {
        self.homology.edge_count()
    }

    /// Smallest id greater than every vertex currently in the graph.
    pub fn next_vertex_id(&self) -> VertexId {
        self.interaction.nodes().max().map_or(0, |v| v + 1)
    }

    /// Add an interaction edge between two existing vertices.
    ///
    /// # Errors
    ///
    /// `InvalidVertex` if an endpoint is absent, `SelfLoop` if `a == b`,
    /// `DuplicateEdge` if the pair already has an interaction edge, and
    /// `InvalidProbability` if the probability is outside [0, 1].
    pub fn add_interaction(
        &mut self,
        a: VertexId,
        b: VertexId,
        edge: InteractionEdge,
    ) -> Result<(), GraphError> {
        self.check_new_edge(EdgeKind::Interaction, a, b, edge.probability)?;
        self.interaction.add_edge(a, b, edge);
        Ok(())
    }

    /// Add a homology edge between two existing vertices.
    ///
    /// Fails under the same conditions as [`add_interaction`](Self::add_interaction).
    pub fn add_homology(
        &mut self,
        a: VertexId,
        b: VertexId,
        edge: HomologyEdge,
    ) -> Result<(), GraphError> {
        self.check_new_edge(EdgeKind::Homology, a, b, edge.probability)?;
        self.homology.add_edge(a, b, edge);
        Ok(())
    }

    /// Add one homology edge, with the same weight, between every pair of `vertices`.
    ///
    /// Used to batch-insert clique-derived homology. The insertion is
    /// all-or-nothing: every pair is validated before any edge is added.
    ///
    /// # Returns
    ///
    /// Number of edges added.
    pub fn add_homologies(
        &mut self,
        edge: HomologyEdge,
        vertices: &[VertexId],
    ) -> Result<usize, GraphError> {
        let members: BTreeSet<VertexId> = vertices.iter().copied().collect();
        let members: Vec<VertexId> = members.into_iter().collect();

        let mut pairs = Vec::new();
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                self.check_new_edge(EdgeKind::Homology, a, b, edge.probability)?;
                pairs.push((a, b));
            }
        }
        if pairs.is_empty() {
            // A single vertex still has to exist.
            if let Some(&v) = members.first() {
                self.require(v)?;
            }
        }

        for &(a, b) in &pairs {
            self.homology.add_edge(a, b, edge);
        }
        Ok(pairs.len())
    }

    /// Find the interaction edge over an unordered pair.
    pub fn find_interaction(&self, a: VertexId, b: VertexId) -> Option<&InteractionEdge> {
        self.interaction.edge_weight(a, b)
    }

    /// Mutable access to the interaction edge over an unordered pair.
    pub fn find_interaction_mut(&mut self, a: VertexId, b: VertexId) -> Option<&mut InteractionEdge> {
        self.interaction.edge_weight_mut(a, b)
    }

    /// Find the homology edge over an unordered pair.
    pub fn find_homology(&self, a: VertexId, b: VertexId) -> Option<&HomologyEdge> {
        self.homology.edge_weight(a, b)
    }

    /// Mutable access to the homology edge over an unordered pair.
    pub fn find_homology_mut(&mut self, a: VertexId, b: VertexId) -> Option<&mut HomologyEdge> {
        self.homology.edge_weight_mut(a, b)
    }

    /// Remove and return the interaction edge over an unordered pair.
    pub fn remove_interaction(&mut self, a: VertexId, b: VertexId) -> Option<InteractionEdge> {
        self.interaction.remove_edge(a, b)
    }

    /// Remove and return the homology edge over an unordered pair.
    pub fn remove_homology(&mut self, a: VertexId, b: VertexId) -> Option<HomologyEdge> {
        self.homology.remove_edge(a, b)
    }

    /// Interaction partners of `v`, ascending. Empty if `v` is absent.
    pub fn interaction_neighbors(&self, v: VertexId) -> Vec<VertexId> {
        sorted_neighbors(&self.interaction, v)
    }

    /// Homology partners of `v`, ascending. Empty if `v` is absent.
    pub fn homology_neighbors(&self, v: VertexId) -> Vec<VertexId> {
        sorted_neighbors(&self.homology, v)
    }

    /// Every interaction edge as `(min, max, edge)`, sorted by endpoint pair.
    pub fn interactions(&self) -> Vec<(VertexId, VertexId, InteractionEdge)> {
        sorted_edges(&self.interaction)
    }

    /// Every homology edge as `(min, max, edge)`, sorted by endpoint pair.
    pub fn homologies(&self) -> Vec<(VertexId, VertexId, HomologyEdge)> {
        sorted_edges(&self.homology)
    }

    /// Read-only access to the interaction graph.
    pub fn interaction_graph(&self) -> &InteractionGraph {
        &self.interaction
    }

    /// Read-only access to the homology graph.
    pub fn homology_graph(&self) -> &HomologyGraph {
        &self.homology
    }

    /// Working copy of the homology graph without edges below `floor`.
    ///
    /// All vertices are kept, so isolated vertices stay visible to clique search.
    pub fn filtered_homology(&self, floor: f64) -> HomologyGraph {
        let mut filtered = HomologyGraph::with_capacity(self.vertex_count(), self.homology_count());
        for v in self.vertices() {
            filtered.add_node(v);
        }
        for (a, b, edge) in self.homologies() {
            if edge.probability >= floor {
                filtered.add_edge(a, b, edge);
            }
        }
        filtered
    }

    /// Collapse `group` into its smallest member.
    ///
    /// Every edge incident to a retired member is re-pointed to the
    /// representative; edges that land on an existing edge of the
    /// representative are folded in with probabilistic OR, and edges strictly
    /// inside the group are dropped. Both sub-graphs are handled alike.
    pub fn collapse(&mut self, group: &BTreeSet<VertexId>) -> Result<Collapse, GraphError> {
        for &v in group {
            self.require(v)?;
        }
        let representative = match group.first() {
            Some(&v) => v,
            None => return Ok(Collapse::default()),
        };

        let (i_repointed, i_combined, i_dropped) = repoint(&mut self.interaction, group, representative);
        let (h_repointed, h_combined, h_dropped) = repoint(&mut self.homology, group, representative);

        let retired: Vec<VertexId> = group.iter().copied().filter(|&v| v != representative).collect();
        for &v in &retired {
            self.interaction.remove_node(v);
            self.homology.remove_node(v);
        }

        Ok(Collapse {
            representative,
            retired,
            interactions_repointed: i_repointed,
            interactions_combined: i_combined,
            interactions_dropped: i_dropped,
            homologies_repointed: h_repointed,
            homologies_combined: h_combined,
            homologies_dropped: h_dropped,
        })
    }

    fn require(&self, v: VertexId) -> Result<(), GraphError> {
        if self.contains_vertex(v) {
            Ok(())
        } else {
            Err(GraphError::InvalidVertex { vertex: v })
        }
    }

    fn check_new_edge(
        &self,
        kind: EdgeKind,
        a: VertexId,
        b: VertexId,
        probability: f64,
    ) -> Result<(), GraphError> {
        self.require(a)?;
        self.require(b)?;
        if a == b {
            return Err(GraphError::SelfLoop { vertex: a });
        }
        let exists = match kind {
            EdgeKind::Interaction => self.interaction.contains_edge(a, b),
            EdgeKind::Homology => self.homology.contains_edge(a, b),
        };
        if exists {
            let (a, b) = ordered_pair(a, b);
            return Err(GraphError::DuplicateEdge { kind, a, b });
        }
        check_probability(probability)?;
        Ok(())
    }
}

/// Moves every edge of the non-representative group members onto `rep`.
///
/// Returns `(repointed, combined, dropped)` edge counts.
fn repoint<E>(
    graph: &mut UnGraphMap<VertexId, E>,
    group: &BTreeSet<VertexId>,
    rep: VertexId,
) -> (usize, usize, usize)
where
    E: Weighted + Copy,
{
    let (mut repointed, mut combined, mut dropped) = (0, 0, 0);

    for &member in group.iter().filter(|&&m| m != rep) {
        let mut incident: Vec<(VertexId, E)> = graph.edges(member).map(|(_, n, e)| (n, *e)).collect();
        incident.sort_unstable_by_key(|(n, _)| *n);

        for (neighbor, edge) in incident {
            graph.remove_edge(member, neighbor);
            if group.contains(&neighbor) {
                dropped += 1;
                continue;
            }
            match graph.edge_weight_mut(rep, neighbor) {
                Some(existing) => {
                    let p = probability::or(existing.probability(), edge.probability());
                    existing.set_probability(p);
                    combined += 1;
                }
                None => {
                    graph.add_edge(rep, neighbor, edge);
                    repointed += 1;
                }
            }
        }
    }

    (repointed, combined, dropped)
}

fn sorted_neighbors<E>(graph: &UnGraphMap<VertexId, E>, v: VertexId) -> Vec<VertexId> {
    if !graph.contains_node(v) {
        return vec![];
    }
    let mut neighbors: Vec<VertexId> = graph.neighbors(v).collect();
    neighbors.sort_unstable();
    neighbors
}

fn sorted_edges<E: Copy>(graph: &UnGraphMap<VertexId, E>) -> Vec<(VertexId, VertexId, E)> {
    let mut edges: Vec<(VertexId, VertexId, E)> = graph
        .all_edges()
        .map(|(a, b, e)| {
            let (a, b) = ordered_pair(a, b);
            (a, b, *e)
        })
        .collect();
    edges.sort_unstable_by_key(|(a, b, _)| (*a, *b));
    edges
}

/// All vertices within `max_hops` edges of `start`, including `start` itself.
///
/// Level-by-level BFS: O(V + E) in the worst case, usually far less since
/// the frontier stops growing after `max_hops` levels. Returns an empty set
/// if `start` is not in the graph.
pub fn within_hops<E>(graph: &UnGraphMap<VertexId, E>, start: VertexId, max_hops: u32) -> HashSet<VertexId> {
    let mut result: HashSet<VertexId> = HashSet::new();
    if !graph.contains_node(start) {
        return result;
    }
    result.insert(start);

    let mut current_level: Vec<VertexId> = vec![start];
    for _ in 0..max_hops {
        let mut next_level: Vec<VertexId> = Vec::new();
        for &node in &current_level {
            for neighbor in graph.neighbors(node) {
                if result.insert(neighbor) {
                    next_level.push(neighbor);
                }
            }
        }
        if next_level.is_empty() {
            break;
        }
        current_level = next_level;
    }

    result
}

/// Label every vertex with the index of its connected component.
///
/// Uses Kosaraju's algorithm: O(V + E). On an undirected graph the strongly
/// connected components are exactly the connected components.
pub fn component_labels<E>(graph: &UnGraphMap<VertexId, E>) -> HashMap<VertexId, usize> {
    let mut labels = HashMap::with_capacity(graph.node_count());
    for (label, component) in kosaraju_scc(graph).into_iter().enumerate() {
        for v in component {
            labels.insert(v, label);
        }
    }
    labels
}
