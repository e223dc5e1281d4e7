//! Dependency resolution.
//!
//! Both walks are iterative depth-first searches over outgoing edges, so
//! deep dependency chains cannot overflow the stack. Cycles never fail a
//! walk: the transitive closure relies on a visited set, and deployment
//! ordering skips (and reports) the edges that would close a cycle.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use compgraph_core::{ComponentGraph, ComponentId, GraphEdge, GraphNode};

/// Everything `id` depends on, directly or transitively.
///
/// Nodes come back in post-order, so every dependency precedes the nodes
/// that depend on it. The start node is excluded and no node appears twice.
/// Edges whose target is missing from the graph are skipped. An unknown
/// `id` yields an empty list.
pub fn transitive_dependencies<'g>(graph: &'g ComponentGraph, id: &str) -> Vec<&'g GraphNode> {
    let Some((start, _)) = graph.get_entry(id) else {
        return Vec::new();
    };
    let start = start.as_str();

    let mut visited: HashSet<&'g str> = HashSet::from([start]);
    let mut closure = Vec::new();
    let mut stack: Vec<(&'g str, usize)> = vec![(start, 0)];

    while let Some(&(current, next)) = stack.last() {
        match graph.outgoing_edges(current).get(next) {
            Some(edge) => {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                let target = edge.to.as_str();
                if graph.has_node(target) && visited.insert(target) {
                    stack.push((target, 0));
                }
            }
            None => {
                stack.pop();
                if current != start {
                    if let Some(node) = graph.get_node(current) {
                        closure.push(node);
                    }
                }
            }
        }
    }

    closure
}

/// A deployment sequence plus the edges that had to be ignored to produce
/// it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOrder {
    /// Requested ids, dependencies first.
    pub order: Vec<ComponentId>,
    /// Back-edges that closed a cycle within the requested set.
    pub skipped_edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Orders `ids` so that each component comes after the components it
/// depends on.
///
/// Only edges between requested ids are considered. Ids are visited in the
/// order given, which fixes the relative order of unconstrained components.
/// Duplicate ids collapse to their first occurrence, and ids absent from the
/// graph are still emitted (they simply have no dependencies).
///
/// An edge into a node that is still on the DFS stack closes a cycle. It is
/// skipped, logged at warn level, and returned in
/// [`DeploymentOrder::skipped_edges`].
pub fn deployment_order(graph: &ComponentGraph, ids: &[ComponentId]) -> DeploymentOrder {
    let mut subset: HashMap<&str, &ComponentId> = HashMap::with_capacity(ids.len());
    for id in ids {
        subset.entry(id.as_str()).or_insert(id);
    }

    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(subset.len());
    let mut result = DeploymentOrder::default();

    for root in ids {
        if marks.contains_key(root.as_str()) {
            continue;
        }
        marks.insert(root.as_str(), Mark::Visiting);
        let mut stack: Vec<(&ComponentId, usize)> = vec![(root, 0)];

        while let Some(&(current, next)) = stack.last() {
            let Some(edge) = graph.outgoing_edges(current.as_str()).get(next) else {
                stack.pop();
                marks.insert(current.as_str(), Mark::Done);
                result.order.push(current.clone());
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            let Some(&target) = subset.get(edge.to.as_str()) else {
                continue;
            };
            match marks.get(target.as_str()) {
                None => {
                    marks.insert(target.as_str(), Mark::Visiting);
                    stack.push((target, 0));
                }
                Some(Mark::Visiting) => {
                    tracing::warn!(
                        from = %edge.from,
                        to = %edge.to,
                        edge_type = %edge.edge_type,
                        "dependency cycle, skipping back-edge"
                    );
                    result.skipped_edges.push(edge.clone());
                }
                Some(Mark::Done) => {}
            }
        }
    }

    result
}

/// Deployment order over every node of the graph, in insertion order.
pub fn full_deployment_order(graph: &ComponentGraph) -> DeploymentOrder {
    let ids: Vec<ComponentId> = graph.node_ids().cloned().collect();
    deployment_order(graph, &ids)
}
