//! Graph builders shared by the unit tests.

use serde_json::json;

use compgraph_core::{ComponentGraph, ComponentId, ComponentRef, ComponentType, GraphNode, Origin};

pub(crate) fn node(key: &str, component_type: ComponentType, origin: Origin) -> GraphNode {
    let reference =
        ComponentRef::new("core", component_type.flow(), key, "1.0.0").expect("valid reference");
    GraphNode::new(reference, component_type, json!({ "key": key }), origin)
}

pub(crate) fn id(key: &str, component_type: ComponentType) -> ComponentId {
    ComponentId::new(format!("core/{}/{}@1.0.0", component_type.flow(), key))
}

/// Shorthand for workflow ids, the type used by the resolver tests.
pub(crate) fn wf(key: &str) -> ComponentId {
    id(key, ComponentType::Workflow)
}

/// Builds a local graph of workflows wired by subflow edges.
pub(crate) fn workflows(keys: &[&str], edges: &[(&str, &str)]) -> ComponentGraph {
    let mut graph = ComponentGraph::new();
    for key in keys {
        graph.add_node(node(key, ComponentType::Workflow, Origin::Local));
    }
    for (from, to) in edges {
        graph
            .add_edge(&wf(from), &wf(to), compgraph_core::EdgeType::SubflowRef)
            .expect("endpoints exist");
    }
    graph
}
