//! Impact ranking: how many components break if one changes.

use std::collections::HashSet;

use serde::Serialize;

use compgraph_core::{ComponentGraph, ComponentId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactEntry {
    pub id: ComponentId,
    /// Distinct components with at least one edge into `id`.
    pub dependents: usize,
}

/// Number of distinct components in `graph` that depend on `id` directly.
///
/// Parallel edges from the same source count once.
pub fn impact_score(graph: &ComponentGraph, id: &str) -> usize {
    graph
        .incoming_edges(id)
        .iter()
        .map(|edge| edge.from.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Scores `ids` against `graph` and sorts them by descending score.
///
/// The sort is stable: ties keep the order of `ids`.
pub fn rank_by_impact(graph: &ComponentGraph, ids: &[ComponentId]) -> Vec<ImpactEntry> {
    let mut ranked: Vec<ImpactEntry> = ids
        .iter()
        .map(|id| ImpactEntry {
            id: id.clone(),
            dependents: impact_score(graph, id.as_str()),
        })
        .collect();
    ranked.sort_by(|a, b| b.dependents.cmp(&a.dependents));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{wf, workflows};
    use compgraph_core::EdgeType;

    #[test]
    fn test_parallel_edges_count_once() {
        let mut graph = workflows(&["a", "b"], &[("a", "b")]);
        graph.add_edge(&wf("a"), &wf("b"), EdgeType::SubflowRef).unwrap();
        assert_eq!(impact_score(&graph, wf("b").as_str()), 1);
        assert_eq!(impact_score(&graph, wf("a").as_str()), 0);
    }

    #[test]
    fn test_rank_is_descending_and_stable() {
        let graph = workflows(
            &["a", "b", "c", "d"],
            &[("a", "d"), ("b", "d"), ("a", "c")],
        );
        let ranked = rank_by_impact(&graph, &[wf("a"), wf("c"), wf("b"), wf("d")]);
        let ids: Vec<ComponentId> = ranked.iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec![wf("d"), wf("c"), wf("a"), wf("b")]);
        assert_eq!(ranked[0].dependents, 2);
    }

    #[test]
    fn test_unknown_ids_score_zero() {
        let graph = workflows(&["a"], &[]);
        let ranked = rank_by_impact(&graph, &[wf("ghost")]);
        assert_eq!(ranked[0].dependents, 0);
    }
}
