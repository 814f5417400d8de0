//! Degeneracy removal: collapse groups of mutually homologous vertices.
//!
//! Duplicate or paralogous proteins show up as cliques in the homology
//! graph. A clique is collapsed into one representative vertex when every
//! pair of its members is backed by a shared interaction: each member
//! interacts with exactly one vertex outside the group, and for every pair
//! of members those partners are themselves homologous with probability at
//! least `delta` (or are the same vertex).
//!
//! # Algorithm
//!
//! 1. Copy the homology graph without edges below `zeta`.
//! 2. Enumerate its maximal cliques (largest first, then by sorted ids).
//! 3. Walk the cliques once. Vertices consumed by an earlier merge are
//!    removed from later candidates; a candidate with fewer than two members
//!    left is skipped.
//! 4. Collapse each eligible candidate into its smallest member, folding
//!    parallel edges with probabilistic OR.

use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info};

use crate::clique::{BronKerbosch, Clique, CliqueFinder};
use crate::error::GraphError;
use crate::graph::CleverGraph;
use crate::types::VertexId;

/// Outcome of one merge pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    /// Maximal cliques of size two or more in the filtered homology graph.
    pub cliques: usize,
    /// Candidates that still had two or more unconsumed members.
    pub candidates_evaluated: usize,
    pub groups_merged: usize,
    pub vertices_retired: usize,
    pub interactions_combined: usize,
    /// Interactions between members of the same group.
    pub interactions_dropped: usize,
    pub homologies_combined: usize,
    pub homologies_dropped: usize,
    pub duration: Duration,
}

/// Merges homologous duplicate vertices of a [`CleverGraph`].
#[derive(Debug, Clone)]
pub struct MergeManager<F = BronKerbosch> {
    zeta: f64,
    delta: f64,
    finder: F,
}

impl MergeManager<BronKerbosch> {
    /// # Arguments
    ///
    /// * `zeta` - Homology edges below this are ignored by clique search
    /// * `delta` - Minimum homology between the interaction partners of two members
    pub fn new(zeta: f64, delta: f64) -> Self {
        Self::with_finder(zeta, delta, BronKerbosch::new())
    }
}

impl<F: CliqueFinder> MergeManager<F> {
    /// Use a different clique finder.
    pub fn with_finder(zeta: f64, delta: f64, finder: F) -> Self {
        Self { zeta, delta, finder }
    }

    /// Collapse every eligible homology clique in place.
    pub fn merge(&self, graph: &mut CleverGraph) -> Result<MergeReport, GraphError> {
        let start = Instant::now();
        let mut report = MergeReport::default();

        let filtered = graph.filtered_homology(self.zeta);
        let cliques = self.finder.maximal_cliques(&filtered);
        let mut consumed: HashSet<VertexId> = HashSet::new();

        // Cliques arrive largest first, so singletons close the list.
        for clique in cliques.iter().take_while(|c| c.len() >= 2) {
            report.cliques += 1;

            let candidate: Clique = clique.iter().copied().filter(|v| !consumed.contains(v)).collect();
            if candidate.len() < 2 {
                debug!("Skipping clique {:?}: members already merged", clique);
                continue;
            }
            report.candidates_evaluated += 1;

            if !self.is_eligible(graph, &candidate) {
                debug!("Clique {:?} is not an eligible merge group", candidate);
                continue;
            }

            let outcome = graph.collapse(&candidate)?;
            debug!(
                "Merged {:?} into {} ({} interactions combined, {} dropped)",
                outcome.retired, outcome.representative, outcome.interactions_combined, outcome.interactions_dropped
            );
            consumed.extend(candidate.iter().copied());

            report.groups_merged += 1;
            report.vertices_retired += outcome.retired.len();
            report.interactions_combined += outcome.interactions_combined;
            report.interactions_dropped += outcome.interactions_dropped;
            report.homologies_combined += outcome.homologies_combined;
            report.homologies_dropped += outcome.homologies_dropped;
        }

        report.duration = start.elapsed();
        info!(
            "Merge: {} of {} candidate cliques collapsed, {} vertices retired in {:?}",
            report.groups_merged, report.candidates_evaluated, report.vertices_retired, report.duration
        );
        Ok(report)
    }

    /// Whether `group` satisfies the merge condition for every pair of members.
    ///
    /// Partner homology is read from the full (unfiltered) homology graph.
    pub fn is_eligible(&self, graph: &CleverGraph, group: &Clique) -> bool {
        let mut partners: BTreeMap<VertexId, VertexId> = BTreeMap::new();
        for &member in group {
            match sole_external_partner(graph, member, group) {
                Some(partner) => {
                    partners.insert(member, partner);
                }
                None => return false,
            }
        }

        let partners: Vec<VertexId> = partners.into_values().collect();
        for (i, &s) in partners.iter().enumerate() {
            for &t in &partners[i + 1..] {
                if s == t {
                    continue;
                }
                match graph.find_homology(s, t) {
                    Some(edge) if edge.probability >= self.delta => {}
                    _ => return false,
                }
            }
        }
        true
    }
}

/// The only interaction partner of `v` outside `group`, if there is exactly one.
fn sole_external_partner(graph: &CleverGraph, v: VertexId, group: &Clique) -> Option<VertexId> {
    let mut external = graph
        .interaction_neighbors(v)
        .into_iter()
        .filter(|n| !group.contains(n));
    match (external.next(), external.next()) {
        (Some(partner), None) => Some(partner),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HomologyEdge, InteractionEdge};
    use approx::assert_abs_diff_eq;

    fn interaction(graph: &mut CleverGraph, a: VertexId, b: VertexId, p: f64) {
        let id = u64::from(a) * 1000 + u64::from(b);
        graph.add_interaction(a, b, InteractionEdge::new(id, p)).unwrap();
    }

    fn homology(graph: &mut CleverGraph, a: VertexId, b: VertexId, p: f64) {
        graph.add_homology(a, b, HomologyEdge::new(p)).unwrap();
    }

    #[test]
    fn test_merges_pair_with_homologous_partners() {
        // 1~2 duplicates; 1-10 and 2-11 interactions; 10~11 weakly homologous.
        let mut graph = CleverGraph::with_vertices([1, 2, 10, 11]);
        homology(&mut graph, 1, 2, 0.9);
        homology(&mut graph, 10, 11, 0.45);
        interaction(&mut graph, 1, 10, 0.5);
        interaction(&mut graph, 2, 11, 0.4);

        let report = MergeManager::new(0.5, 0.4).merge(&mut graph).unwrap();

        assert_eq!(report.groups_merged, 1);
        assert_eq!(report.vertices_retired, 1);
        assert_eq!(graph.vertices(), vec![1, 10, 11]);
        assert_abs_diff_eq!(graph.find_interaction(1, 10).unwrap().probability, 0.5);
        assert_abs_diff_eq!(graph.find_interaction(1, 11).unwrap().probability, 0.4);
        assert!(graph.find_homology(10, 11).is_some());
        assert_eq!(graph.homology_count(), 1);
    }

    #[test]
    fn test_shared_partner_combines_interactions() {
        let mut graph = CleverGraph::with_vertices([1, 2, 3]);
        homology(&mut graph, 1, 2, 0.9);
        interaction(&mut graph, 1, 3, 0.5);
        interaction(&mut graph, 2, 3, 0.5);

        MergeManager::new(0.5, 0.9).merge(&mut graph).unwrap();

        assert_eq!(graph.vertices(), vec![1, 3]);
        assert_eq!(graph.interaction_count(), 1);
        assert_abs_diff_eq!(graph.find_interaction(1, 3).unwrap().probability, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_partner_homology_below_delta_blocks_merge() {
        let mut graph = CleverGraph::with_vertices([1, 2, 10, 11]);
        homology(&mut graph, 1, 2, 0.9);
        homology(&mut graph, 10, 11, 0.3);
        interaction(&mut graph, 1, 10, 0.5);
        interaction(&mut graph, 2, 11, 0.4);
        let before = graph.clone();

        let report = MergeManager::new(0.5, 0.4).merge(&mut graph).unwrap();

        assert_eq!(report.candidates_evaluated, 1);
        assert_eq!(report.groups_merged, 0);
        assert_eq!(graph.vertices(), before.vertices());
        assert_eq!(graph.interactions(), before.interactions());
    }

    #[test]
    fn test_partners_without_homology_block_merge() {
        let mut graph = CleverGraph::with_vertices([1, 2, 10, 11]);
        homology(&mut graph, 1, 2, 0.9);
        interaction(&mut graph, 1, 10, 0.5);
        interaction(&mut graph, 2, 11, 0.4);

        let report = MergeManager::new(0.5, 0.0).merge(&mut graph).unwrap();
        assert_eq!(report.groups_merged, 0);
    }

    #[test]
    fn test_member_with_two_external_partners_blocks_merge() {
        let mut graph = CleverGraph::with_vertices([1, 2, 3, 4]);
        homology(&mut graph, 1, 2, 0.9);
        interaction(&mut graph, 1, 3, 0.5);
        interaction(&mut graph, 1, 4, 0.5);
        interaction(&mut graph, 2, 3, 0.5);

        let report = MergeManager::new(0.5, 0.5).merge(&mut graph).unwrap();
        assert_eq!(report.groups_merged, 0);
        assert_eq!(graph.vertex_count(), 4);
    }

    #[test]
    fn test_member_without_interactions_blocks_merge() {
        let mut graph = CleverGraph::with_vertices([1, 2, 3]);
        homology(&mut graph, 1, 2, 0.9);
        interaction(&mut graph, 1, 3, 0.5);

        let report = MergeManager::new(0.5, 0.5).merge(&mut graph).unwrap();
        assert_eq!(report.groups_merged, 0);
    }

    #[test]
    fn test_internal_interactions_are_ignored_then_dropped() {
        // 1 and 2 interact with each other and each with 3.
        let mut graph = CleverGraph::with_vertices([1, 2, 3]);
        homology(&mut graph, 1, 2, 0.9);
        interaction(&mut graph, 1, 2, 0.8);
        interaction(&mut graph, 1, 3, 0.5);
        interaction(&mut graph, 2, 3, 0.2);

        let report = MergeManager::new(0.5, 0.5).merge(&mut graph).unwrap();

        assert_eq!(report.groups_merged, 1);
        assert_eq!(report.interactions_dropped, 1);
        assert_eq!(graph.interaction_count(), 1);
        assert_abs_diff_eq!(graph.find_interaction(1, 3).unwrap().probability, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_triangle_requires_every_pair() {
        // 1,2,3 mutually homologous with partners 10, 11, 12.
        let mut graph = CleverGraph::with_vertices([1, 2, 3, 10, 11, 12]);
        homology(&mut graph, 1, 2, 0.9);
        homology(&mut graph, 2, 3, 0.9);
        homology(&mut graph, 1, 3, 0.9);
        interaction(&mut graph, 1, 10, 0.5);
        interaction(&mut graph, 2, 11, 0.5);
        interaction(&mut graph, 3, 12, 0.5);
        homology(&mut graph, 10, 11, 0.45);
        homology(&mut graph, 11, 12, 0.45);
        let mut partial = graph.clone();

        // Partner 10~12 missing: the triangle is ineligible.
        let report = MergeManager::new(0.5, 0.4).merge(&mut partial).unwrap();
        assert_eq!(report.groups_merged, 0);

        homology(&mut graph, 10, 12, 0.45);
        let report = MergeManager::new(0.5, 0.4).merge(&mut graph).unwrap();
        assert_eq!(report.groups_merged, 1);
        assert_eq!(report.vertices_retired, 2);
        assert_eq!(graph.interaction_neighbors(1), vec![10, 11, 12]);
    }

    #[test]
    fn test_larger_clique_wins_overlap() {
        // Triangle {1,2,3} and pair {3,4} share 3; both would be eligible alone.
        let mut graph = CleverGraph::with_vertices([1, 2, 3, 4, 10]);
        homology(&mut graph, 1, 2, 0.9);
        homology(&mut graph, 2, 3, 0.9);
        homology(&mut graph, 1, 3, 0.9);
        homology(&mut graph, 3, 4, 0.9);
        for v in [1, 2, 3, 4] {
            interaction(&mut graph, v, 10, 0.5);
        }

        let report = MergeManager::new(0.5, 0.5).merge(&mut graph).unwrap();

        assert_eq!(report.cliques, 2);
        assert_eq!(report.candidates_evaluated, 1);
        assert_eq!(report.groups_merged, 1);
        assert_eq!(report.vertices_retired, 2);
        assert_eq!(graph.vertices(), vec![1, 4, 10]);
        assert!(graph.find_homology(1, 4).is_some());
    }

    #[test]
    fn test_trimmed_candidate_is_still_merged() {
        // {1,2,3} and {3,4,5} share 3; the second is left with {4,5}.
        let mut graph = CleverGraph::with_vertices([1, 2, 3, 4, 5, 10, 11]);
        for (a, b) in [(1, 2), (2, 3), (1, 3), (3, 4), (3, 5), (4, 5)] {
            homology(&mut graph, a, b, 0.9);
        }
        for v in [1, 2, 3] {
            interaction(&mut graph, v, 10, 0.5);
        }
        for v in [4, 5] {
            interaction(&mut graph, v, 11, 0.5);
        }

        let report = MergeManager::new(0.5, 0.5).merge(&mut graph).unwrap();

        assert_eq!(report.cliques, 2);
        assert_eq!(report.candidates_evaluated, 2);
        assert_eq!(report.groups_merged, 2);
        assert_eq!(report.vertices_retired, 3);
        assert_eq!(graph.vertices(), vec![1, 4, 10, 11]);
        assert_eq!(graph.interaction_neighbors(1), vec![10]);
        assert_eq!(graph.interaction_neighbors(4), vec![11]);
        assert!(graph.find_homology(1, 4).is_some());
    }

    #[test]
    fn test_no_homology_above_zeta_is_identity() {
        let mut graph = CleverGraph::with_vertices([1, 2, 3, 4]);
        homology(&mut graph, 1, 2, 0.3);
        homology(&mut graph, 3, 4, 0.49);
        interaction(&mut graph, 1, 3, 0.5);
        interaction(&mut graph, 2, 4, 0.5);
        let before = graph.clone();

        let report = MergeManager::new(0.5, 0.0).merge(&mut graph).unwrap();

        assert_eq!(report.cliques, 0);
        assert_eq!(graph.vertices(), before.vertices());
        assert_eq!(graph.interactions(), before.interactions());
        assert_eq!(graph.homologies(), before.homologies());
    }
}
