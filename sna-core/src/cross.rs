//! Evidence crossing: interactions conserved across homologs reinforce each other.
//!
//! For an interaction `x = (u, s)`, another interaction `y = (v, t)` is
//! supporting evidence when `v` lies within `xi` homology hops of `u` and `t`
//! within `xi` hops of `s` (in either orientation of `y`), using only
//! homology edges of probability at least `tau`. To keep an interaction from
//! supporting itself through a homology chain, `u` and `t` must lie in
//! different components of that filtered graph, and so must `v` and `s`.
//!
//! Each interaction's new probability folds the support in with
//! probabilistic OR. All support is read from a snapshot taken before the
//! pass, and updates are applied together at the end, so the result does
//! not depend on the order interactions are visited.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::graph::{component_labels, within_hops, CleverGraph, HomologyGraph};
use crate::probability;
use crate::types::{ordered_pair, VertexId};

/// Outcome of one crossing pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrossReport {
    pub interactions_examined: usize,
    /// Interactions that received at least one piece of support.
    pub interactions_updated: usize,
    /// Total (x, y) support pairs used.
    pub contributions: usize,
    pub duration: Duration,
}

/// Raises interaction probabilities using conserved interactions among homologs.
#[derive(Debug, Clone)]
pub struct CrossingManager {
    xi: u32,
    tau: f64,
}

impl CrossingManager {
    /// # Arguments
    ///
    /// * `xi` - Maximum homology hops between corresponding endpoints
    /// * `tau` - Homology edges below this do not count as hops
    pub fn new(xi: u32, tau: f64) -> Self {
        Self { xi, tau }
    }

    /// Run one crossing pass over `graph`.
    pub fn cross(&self, graph: &mut CleverGraph) -> CrossReport {
        let start = Instant::now();
        let mut report = CrossReport::default();

        let filtered = graph.filtered_homology(self.tau);
        let components = component_labels(&filtered);
        let mut reach = Reach::new(&filtered, self.xi);

        let mut updates: Vec<(VertexId, VertexId, f64)> = Vec::new();
        for (u, s, x) in graph.interactions() {
            report.interactions_examined += 1;
            let support = self.support(graph, &mut reach, &components, u, s);
            if support.is_empty() {
                continue;
            }
            report.contributions += support.len();

            let updated = support
                .values()
                .fold(x.probability, |p, &q| probability::or(p, q));
            debug!(
                "Interaction ({}, {}): {} supporting interactions, {:.4} -> {:.4}",
                u,
                s,
                support.len(),
                x.probability,
                updated
            );
            updates.push((u, s, updated));
        }

        for (u, s, p) in updates {
            if let Some(edge) = graph.find_interaction_mut(u, s) {
                edge.probability = p;
                report.interactions_updated += 1;
            }
        }

        report.duration = start.elapsed();
        info!(
            "Cross: {} of {} interactions updated from {} supporting pairs in {:?}",
            report.interactions_updated, report.interactions_examined, report.contributions, report.duration
        );
        report
    }

    /// Supporting interactions of `(u, s)`, keyed by ordered pair, with their
    /// current probability.
    fn support(
        &self,
        graph: &CleverGraph,
        reach: &mut Reach<'_>,
        components: &HashMap<VertexId, usize>,
        u: VertexId,
        s: VertexId,
    ) -> BTreeMap<(VertexId, VertexId), f64> {
        let x = ordered_pair(u, s);
        let near_u: Vec<VertexId> = reach.get(u).iter().copied().collect();
        let near_s = reach.get(s).clone();
        let separate = |a: VertexId, b: VertexId| components.get(&a) != components.get(&b);

        let mut support = BTreeMap::new();
        // Scanning every v near u and every interaction partner t of v covers
        // both orientations of y.
        for v in near_u {
            for t in graph.interaction_neighbors(v) {
                if !near_s.contains(&t) {
                    continue;
                }
                let y = ordered_pair(v, t);
                if y == x || !separate(u, t) || !separate(v, s) {
                    continue;
                }
                if let Some(edge) = graph.find_interaction(v, t) {
                    support.insert(y, edge.probability);
                }
            }
        }
        support
    }
}

/// Memoized hop-limited neighborhoods over the filtered homology graph.
struct Reach<'a> {
    graph: &'a HomologyGraph,
    xi: u32,
    cache: HashMap<VertexId, HashSet<VertexId>>,
}

impl<'a> Reach<'a> {
    fn new(graph: &'a HomologyGraph, xi: u32) -> Self {
        Self {
            graph,
            xi,
            cache: HashMap::new(),
        }
    }

    fn get(&mut self, v: VertexId) -> &HashSet<VertexId> {
        let (graph, xi) = (self.graph, self.xi);
        self.cache.entry(v).or_insert_with(|| within_hops(graph, v, xi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HomologyEdge, InteractionEdge};
    use approx::assert_abs_diff_eq;

    /// Interactions 1-2 (0.3) and 3-4 (0.6), homologies 1~3 and 2~4.
    fn conserved_pair(homology: f64) -> CleverGraph {
        let mut graph = CleverGraph::with_vertices(1..=4);
        graph.add_interaction(1, 2, InteractionEdge::new(1, 0.3)).unwrap();
        graph.add_interaction(3, 4, InteractionEdge::new(2, 0.6)).unwrap();
        graph.add_homology(1, 3, HomologyEdge::new(homology)).unwrap();
        graph.add_homology(2, 4, HomologyEdge::new(homology)).unwrap();
        graph
    }

    #[test]
    fn test_conserved_interaction_raises_probability() {
        let mut graph = conserved_pair(0.95);
        let report = CrossingManager::new(1, 0.5).cross(&mut graph);

        assert_eq!(report.interactions_examined, 2);
        assert_eq!(report.interactions_updated, 2);
        assert_eq!(report.contributions, 2);
        assert_abs_diff_eq!(graph.find_interaction(1, 2).unwrap().probability, 0.72, epsilon = 1e-12);
        assert_abs_diff_eq!(graph.find_interaction(3, 4).unwrap().probability, 0.72, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_hops_changes_nothing() {
        let mut graph = conserved_pair(0.95);
        let before = graph.interactions();
        let report = CrossingManager::new(0, 0.5).cross(&mut graph);
        assert_eq!(report.interactions_updated, 0);
        assert_eq!(graph.interactions(), before);
    }

    #[test]
    fn test_homology_below_tau_is_not_a_hop() {
        let mut graph = conserved_pair(0.4);
        let before = graph.interactions();
        CrossingManager::new(1, 0.5).cross(&mut graph);
        assert_eq!(graph.interactions(), before);
    }

    #[test]
    fn test_reversed_orientation_counts() {
        // y = (3, 4) where 3 ~ 2 and 4 ~ 1.
        let mut graph = CleverGraph::with_vertices(1..=4);
        graph.add_interaction(1, 2, InteractionEdge::new(1, 0.3)).unwrap();
        graph.add_interaction(3, 4, InteractionEdge::new(2, 0.6)).unwrap();
        graph.add_homology(1, 4, HomologyEdge::new(0.9)).unwrap();
        graph.add_homology(2, 3, HomologyEdge::new(0.9)).unwrap();

        CrossingManager::new(1, 0.5).cross(&mut graph);
        assert_abs_diff_eq!(graph.find_interaction(1, 2).unwrap().probability, 0.72, epsilon = 1e-12);
    }

    #[test]
    fn test_overlapping_components_are_rejected() {
        // A homology chain 1~5~6~4 puts u and t in one component.
        let mut graph = conserved_pair(0.95);
        for v in [5, 6] {
            graph.add_vertex(v);
        }
        graph.add_homology(1, 5, HomologyEdge::new(0.9)).unwrap();
        graph.add_homology(5, 6, HomologyEdge::new(0.9)).unwrap();
        graph.add_homology(6, 4, HomologyEdge::new(0.9)).unwrap();
        let before = graph.interactions();

        CrossingManager::new(1, 0.5).cross(&mut graph);
        assert_eq!(graph.interactions(), before);

        // A weak link in the chain separates the components again.
        let mut graph = conserved_pair(0.95);
        for v in [5, 6] {
            graph.add_vertex(v);
        }
        graph.add_homology(1, 5, HomologyEdge::new(0.9)).unwrap();
        graph.add_homology(5, 6, HomologyEdge::new(0.1)).unwrap();
        graph.add_homology(6, 4, HomologyEdge::new(0.9)).unwrap();

        CrossingManager::new(1, 0.5).cross(&mut graph);
        assert_abs_diff_eq!(graph.find_interaction(1, 2).unwrap().probability, 0.72, epsilon = 1e-12);
    }

    #[test]
    fn test_single_component_rejects_support() {
        // 3 and 4 are each homologous to both 1 and 2.
        let mut graph = CleverGraph::with_vertices(1..=4);
        graph.add_interaction(1, 2, InteractionEdge::new(1, 0.3)).unwrap();
        graph.add_interaction(3, 4, InteractionEdge::new(2, 0.6)).unwrap();
        graph.add_homology(1, 3, HomologyEdge::new(0.9)).unwrap();
        graph.add_homology(2, 4, HomologyEdge::new(0.9)).unwrap();
        graph.add_homology(1, 4, HomologyEdge::new(0.9)).unwrap();
        graph.add_homology(2, 3, HomologyEdge::new(0.9)).unwrap();

        let before = graph.interactions();
        let report = CrossingManager::new(1, 0.5).cross(&mut graph);
        assert_eq!(report.contributions, 0);
        assert_eq!(graph.interactions(), before);
    }

    #[test]
    fn test_updates_read_from_snapshot() {
        // Three mutually conserved interactions: every one is supported by the
        // other two at their original probabilities.
        let mut graph = CleverGraph::with_vertices(1..=6);
        graph.add_interaction(1, 2, InteractionEdge::new(1, 0.1)).unwrap();
        graph.add_interaction(3, 4, InteractionEdge::new(2, 0.2)).unwrap();
        graph.add_interaction(5, 6, InteractionEdge::new(3, 0.3)).unwrap();
        graph.add_homology(1, 3, HomologyEdge::new(0.9)).unwrap();
        graph.add_homology(3, 5, HomologyEdge::new(0.9)).unwrap();
        graph.add_homology(2, 4, HomologyEdge::new(0.9)).unwrap();
        graph.add_homology(4, 6, HomologyEdge::new(0.9)).unwrap();

        let report = CrossingManager::new(2, 0.5).cross(&mut graph);
        assert_eq!(report.contributions, 6);

        let expected = |own: f64, a: f64, b: f64| probability::combine([own, a, b]);
        assert_abs_diff_eq!(
            graph.find_interaction(1, 2).unwrap().probability,
            expected(0.1, 0.2, 0.3),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            graph.find_interaction(3, 4).unwrap().probability,
            expected(0.2, 0.1, 0.3),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            graph.find_interaction(5, 6).unwrap().probability,
            expected(0.3, 0.1, 0.2),
            epsilon = 1e-12
        );
    }
}
