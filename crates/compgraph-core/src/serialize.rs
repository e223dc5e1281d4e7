//! Exchange format for [`ComponentGraph`].
//!
//! [`SerializedGraph`] mirrors the store's internal layout (nodes, outgoing
//! index, incoming index, metadata) so a graph written by one process can be
//! reconstructed field for field by another. It is an exchange format, not a
//! versioned store.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::edge::GraphEdge;
use crate::error::CoreError;
use crate::graph::ComponentGraph;
use crate::id::ComponentId;
use crate::node::GraphNode;

/// A graph broken into its four top-level parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedGraph {
    pub nodes: IndexMap<ComponentId, GraphNode>,
    pub outgoing: IndexMap<ComponentId, Vec<GraphEdge>>,
    pub incoming: IndexMap<ComponentId, Vec<GraphEdge>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ComponentGraph {
    /// Snapshots the graph into its serializable form.
    pub fn to_serialized(&self) -> SerializedGraph {
        SerializedGraph {
            nodes: self.nodes.clone(),
            outgoing: self.outgoing.clone(),
            incoming: self.incoming.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Rebuilds a graph from its serialized form.
    ///
    /// Validates that node keys match node references and that every edge
    /// is filed under the right endpoint and points at existing nodes, so
    /// the structural invariant of the store holds after loading.
    pub fn from_serialized(serialized: SerializedGraph) -> Result<Self, CoreError> {
        let SerializedGraph {
            nodes,
            mut outgoing,
            mut incoming,
            metadata,
        } = serialized;

        for (id, node) in &nodes {
            if node.id() != *id {
                return Err(invalid(format!(
                    "node filed under {} has reference {}",
                    id,
                    node.id()
                )));
            }
        }

        for (key, edges) in &outgoing {
            for edge in edges {
                if edge.from != *key {
                    return Err(invalid(format!(
                        "edge {} filed under outgoing {}",
                        edge.id, key
                    )));
                }
                check_endpoints(&nodes, edge)?;
            }
        }
        for (key, edges) in &incoming {
            for edge in edges {
                if edge.to != *key {
                    return Err(invalid(format!(
                        "edge {} filed under incoming {}",
                        edge.id, key
                    )));
                }
                check_endpoints(&nodes, edge)?;
            }
        }

        let outgoing_total: usize = outgoing.values().map(Vec::len).sum();
        let incoming_total: usize = incoming.values().map(Vec::len).sum();
        if outgoing_total != incoming_total {
            return Err(invalid(format!(
                "adjacency indexes disagree: {} outgoing vs {} incoming edges",
                outgoing_total, incoming_total
            )));
        }

        for id in nodes.keys() {
            outgoing.entry(id.clone()).or_default();
            incoming.entry(id.clone()).or_default();
        }

        Ok(ComponentGraph {
            nodes,
            outgoing,
            incoming,
            metadata,
        })
    }

    /// Serializes the graph to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(&self.to_serialized())?)
    }

    /// Parses and validates a graph from JSON.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let serialized: SerializedGraph = serde_json::from_str(json)?;
        Self::from_serialized(serialized)
    }
}

fn check_endpoints(
    nodes: &IndexMap<ComponentId, GraphNode>,
    edge: &GraphEdge,
) -> Result<(), CoreError> {
    for endpoint in [&edge.from, &edge.to] {
        if !nodes.contains_key(endpoint) {
            return Err(CoreError::MissingEndpoint {
                from: edge.from.clone(),
                to: edge.to.clone(),
                missing: endpoint.clone(),
            });
        }
    }
    Ok(())
}

fn invalid(reason: String) -> CoreError {
    CoreError::InvalidSerializedGraph { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ComponentRef;
    use crate::types::{ComponentType, EdgeType, Origin};
    use serde_json::json;

    fn sample_graph() -> ComponentGraph {
        let mut graph = ComponentGraph::new();
        let w = GraphNode::new(
            ComponentRef::new("core", "sys-flows", "onboarding", "1.0.0").unwrap(),
            ComponentType::Workflow,
            json!({ "attributes": { "states": [] } }),
            Origin::Local,
        )
        .with_hashes(Some("api".into()), Some("cfg".into()))
        .with_metadata("filePath", "Workflows/onboarding.json");
        let t = GraphNode::new(
            ComponentRef::new("core", "sys-tasks", "send-email", "1.0.0").unwrap(),
            ComponentType::Task,
            json!({ "attributes": { "type": "6" } }),
            Origin::Local,
        );
        let (wid, tid) = (w.id(), t.id());
        graph.add_node(w);
        graph.add_node(t);
        graph.add_edge(&wid, &tid, EdgeType::TaskRef).unwrap();
        graph.set_metadata("source", "local");
        graph
    }

    #[test]
    fn json_reconstructs_identical_graph() {
        let graph = sample_graph();
        let json = graph.to_json().unwrap();
        let back = ComponentGraph::from_json(&json).unwrap();
        assert_eq!(back, graph);
        assert_eq!(back.to_json().unwrap(), json);
    }

    #[test]
    fn serialized_form_has_four_parts() {
        let value = serde_json::to_value(sample_graph().to_serialized()).unwrap();
        assert!(value["nodes"].is_object());
        assert!(value["outgoing"].is_object());
        assert!(value["incoming"].is_object());
        assert_eq!(value["metadata"]["source"], "local");
    }

    #[test]
    fn dangling_edge_is_rejected() {
        let mut serialized = sample_graph().to_serialized();
        serialized
            .nodes
            .shift_remove("core/sys-tasks/send-email@1.0.0");
        let err = ComponentGraph::from_serialized(serialized).unwrap_err();
        assert!(matches!(err, CoreError::MissingEndpoint { .. }));
    }

    #[test]
    fn misfiled_node_is_rejected() {
        let mut serialized = sample_graph().to_serialized();
        let node = serialized
            .nodes
            .shift_remove("core/sys-tasks/send-email@1.0.0")
            .unwrap();
        serialized
            .nodes
            .insert(ComponentId::new("core/sys-tasks/other@1.0.0"), node);
        let err = ComponentGraph::from_serialized(serialized).unwrap_err();
        assert!(matches!(err, CoreError::InvalidSerializedGraph { .. }));
    }
}
