//! Maximal and maximum clique enumeration.
//!
//! Homology is not transitive (A~B and B~C says nothing about A~C), so
//! groups of mutually homologous vertices are cliques rather than connected
//! components. Enumeration is Bron–Kerbosch with Tomita pivoting over a
//! sorted adjacency-set copy of the input graph.
//!
//! Output order is fixed: descending cardinality, then lexicographic order of
//! the sorted member ids. Two runs over the same graph always agree.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use petgraph::graphmap::UnGraphMap;
use tracing::{debug, warn};

use crate::types::VertexId;

/// A set of pairwise-adjacent vertices, kept sorted.
pub type Clique = BTreeSet<VertexId>;

/// Above this many maximal cliques a warning is logged. Results are never truncated.
pub const LARGE_CLIQUE_COUNT: usize = 100_000;

static NO_NEIGHBORS: BTreeSet<VertexId> = BTreeSet::new();

/// Finds maximal and maximum cliques in an undirected graph.
pub trait CliqueFinder {
    /// Every clique that cannot be extended by another vertex, in canonical order.
    ///
    /// Isolated vertices are singleton cliques; the empty graph yields nothing.
    fn maximal_cliques<E>(&self, graph: &UnGraphMap<VertexId, E>) -> Vec<Clique>;

    /// The cliques of largest cardinality, in canonical order.
    fn maximum_cliques<E>(&self, graph: &UnGraphMap<VertexId, E>) -> Vec<Clique> {
        let cliques = self.maximal_cliques(graph);
        let size = cliques.first().map_or(0, BTreeSet::len);
        cliques.into_iter().take_while(|c| c.len() == size).collect()
    }
}

/// Bron–Kerbosch with pivoting.
#[derive(Debug, Clone)]
pub struct BronKerbosch {
    warn_above: usize,
}

impl BronKerbosch {
    pub fn new() -> Self {
        Self {
            warn_above: LARGE_CLIQUE_COUNT,
        }
    }

    /// Change the clique count above which a warning is logged.
    pub fn with_warning_threshold(mut self, warn_above: usize) -> Self {
        self.warn_above = warn_above;
        self
    }
}

impl Default for BronKerbosch {
    fn default() -> Self {
        Self::new()
    }
}

impl CliqueFinder for BronKerbosch {
    fn maximal_cliques<E>(&self, graph: &UnGraphMap<VertexId, E>) -> Vec<Clique> {
        let start = Instant::now();

        let adjacency: BTreeMap<VertexId, BTreeSet<VertexId>> = graph
            .nodes()
            .map(|v| (v, graph.neighbors(v).filter(|&n| n != v).collect()))
            .collect();

        let mut search = Search {
            adjacency: &adjacency,
            cliques: Vec::new(),
            calls: 0,
        };
        let candidates: BTreeSet<VertexId> = adjacency.keys().copied().collect();
        search.expand(&mut Vec::new(), candidates, BTreeSet::new());

        let calls = search.calls;
        let mut cliques = search.cliques;
        sort_cliques(&mut cliques);

        debug!(
            "Enumerated {} maximal cliques over {} vertices in {:?} ({} expansions)",
            cliques.len(),
            adjacency.len(),
            start.elapsed(),
            calls
        );
        if cliques.len() > self.warn_above {
            warn!(
                "Homology graph produced {} maximal cliques ({:?}); consider a higher floor",
                cliques.len(),
                start.elapsed()
            );
        }

        cliques
    }
}

/// Sort into canonical order: larger first, then lexicographic by sorted members.
pub fn sort_cliques(cliques: &mut [Clique]) {
    cliques.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
}

struct Search<'a> {
    adjacency: &'a BTreeMap<VertexId, BTreeSet<VertexId>>,
    cliques: Vec<Clique>,
    calls: u64,
}

impl<'a> Search<'a> {
    /// `r` is the clique under construction, `p` the candidates that extend
    /// it, `x` the vertices already explored from this branch.
    fn expand(&mut self, r: &mut Vec<VertexId>, mut p: BTreeSet<VertexId>, mut x: BTreeSet<VertexId>) {
        self.calls += 1;
        let adjacency = self.adjacency;
        let neighbors = |v: &VertexId| neighbors_of(adjacency, *v);

        if p.is_empty() {
            if x.is_empty() && !r.is_empty() {
                self.cliques.push(r.iter().copied().collect());
            }
            return;
        }

        // Tomita pivot: the vertex of P ∪ X covering most of P.
        let pivot = p
            .iter()
            .chain(x.iter())
            .copied()
            .max_by_key(|u| neighbors(u).intersection(&p).count());
        let pivot_neighbors = match pivot {
            Some(u) => neighbors(&u),
            None => &NO_NEIGHBORS,
        };
        let branches: Vec<VertexId> = p.difference(pivot_neighbors).copied().collect();

        for v in branches {
            let nv = neighbors(&v);
            let next_p: BTreeSet<VertexId> = p.intersection(nv).copied().collect();
            let next_x: BTreeSet<VertexId> = x.intersection(nv).copied().collect();

            r.push(v);
            self.expand(r, next_p, next_x);
            r.pop();

            p.remove(&v);
            x.insert(v);
        }
    }
}

fn neighbors_of(adjacency: &BTreeMap<VertexId, BTreeSet<VertexId>>, v: VertexId) -> &BTreeSet<VertexId> {
    adjacency.get(&v).unwrap_or(&NO_NEIGHBORS)
}
