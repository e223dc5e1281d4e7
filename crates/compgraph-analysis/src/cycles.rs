//! Cycle detection.

use petgraph::algo::{is_cyclic_directed, tarjan_scc};

use compgraph_core::{ComponentGraph, ComponentId};

/// Returns every dependency cycle in the graph.
///
/// A cycle is a strongly connected component with more than one member, or
/// a single component with an edge to itself. Members of each cycle are
/// sorted, and so is the list of cycles.
pub fn find_cycles(graph: &ComponentGraph) -> Vec<Vec<ComponentId>> {
    let (pg, _) = graph.to_petgraph();

    let mut cycles: Vec<Vec<ComponentId>> = tarjan_scc(&pg)
        .into_iter()
        .filter(|scc| scc.len() > 1 || pg.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut ids: Vec<ComponentId> = scc.into_iter().map(|ix| pg[ix].clone()).collect();
            ids.sort();
            ids
        })
        .collect();
    cycles.sort();
    cycles
}

/// `true` when the graph has no dependency cycle, self-loops included.
pub fn is_acyclic(graph: &ComponentGraph) -> bool {
    let (pg, _) = graph.to_petgraph();
    !is_cyclic_directed(&pg)
}
