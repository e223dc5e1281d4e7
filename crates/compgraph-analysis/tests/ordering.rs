//! Property tests for dependency resolution over random graphs.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use serde_json::json;

use compgraph_analysis::{deployment_order, find_cycles, transitive_dependencies};
use compgraph_core::{ComponentGraph, ComponentId, ComponentRef, ComponentType, EdgeType, GraphNode, Origin};

fn id(n: usize) -> ComponentId {
    ComponentId::new(format!("core/sys-flows/w{n}@1.0.0"))
}

fn build(size: usize, edges: &[(usize, usize)]) -> ComponentGraph {
    let mut graph = ComponentGraph::new();
    for n in 0..size {
        let key = format!("w{n}");
        let reference = ComponentRef::new("core", "sys-flows", &key, "1.0.0").unwrap();
        graph.add_node(GraphNode::new(
            reference,
            ComponentType::Workflow,
            json!({ "key": key }),
            Origin::Local,
        ));
    }
    for &(from, to) in edges {
        graph
            .add_edge(&id(from % size), &id(to % size), EdgeType::SubflowRef)
            .unwrap();
    }
    graph
}

fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..12).prop_flat_map(|size| {
        (
            Just(size),
            prop::collection::vec((0..size, 0..size), 0..30),
        )
    })
}

proptest! {
    #[test]
    fn order_contains_each_requested_id_once(
        (size, edges) in graph_strategy(),
        picks in prop::collection::vec(0usize..16, 0..20),
    ) {
        let graph = build(size, &edges);
        // Indices past `size` name components absent from the graph.
        let requested: Vec<ComponentId> = picks.iter().map(|&n| id(n)).collect();
        let order = deployment_order(&graph, &requested);

        let expected: HashSet<&ComponentId> = requested.iter().collect();
        let actual: HashSet<&ComponentId> = order.order.iter().collect();
        prop_assert_eq!(order.order.len(), expected.len());
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn acyclic_order_respects_every_edge(
        size in 1usize..12,
        raw in prop::collection::vec((0usize..12, 0usize..12), 0..30),
    ) {
        // Only forward edges (high index -> low index) keep the graph acyclic.
        let edges: Vec<(usize, usize)> = raw
            .into_iter()
            .map(|(a, b)| (a % size, b % size))
            .filter(|(a, b)| a > b)
            .collect();
        let graph = build(size, &edges);
        prop_assert!(find_cycles(&graph).is_empty());

        let requested: Vec<ComponentId> = (0..size).map(id).collect();
        let order = deployment_order(&graph, &requested);
        prop_assert!(order.skipped_edges.is_empty());

        let position: HashMap<&ComponentId, usize> =
            order.order.iter().enumerate().map(|(i, id)| (id, i)).collect();
        for (from, to) in &edges {
            prop_assert!(position[&id(*to)] < position[&id(*from)]);
        }
    }

    #[test]
    fn closure_is_duplicate_free_and_excludes_start(
        (size, edges) in graph_strategy(),
        start in 0usize..12,
    ) {
        let graph = build(size, &edges);
        let start = id(start % size);
        let closure = transitive_dependencies(&graph, start.as_str());

        let ids: Vec<ComponentId> = closure.iter().map(|n| n.id()).collect();
        let distinct: HashSet<&ComponentId> = ids.iter().collect();
        prop_assert_eq!(distinct.len(), ids.len());
        prop_assert!(!distinct.contains(&start));
    }
}
