//! ComponentGraph: the in-memory graph store.
//!
//! [`ComponentGraph`] is a directed multigraph of [`GraphNode`]s keyed by
//! [`ComponentId`], with two adjacency indexes:
//! - **outgoing** (by source): the components a node depends on.
//! - **incoming** (by target): the components that depend on a node.
//!
//! Every edge is stored once in each index. All maps are insertion ordered so
//! that iteration (and therefore every derived ordering) is deterministic.
//!
//! The store is synchronous and performs no I/O. It is `Send + Sync` but not
//! internally synchronized: concurrent writers need their own lock, or separate
//! graphs combined with [`ComponentGraph::merge`].

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::edge::GraphEdge;
use crate::error::CoreError;
use crate::id::{ComponentId, ComponentRef};
use crate::node::GraphNode;
use crate::types::{ComponentType, EdgeType, Origin};

/// The component dependency graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentGraph {
    pub(crate) nodes: IndexMap<ComponentId, GraphNode>,
    pub(crate) outgoing: IndexMap<ComponentId, Vec<GraphEdge>>,
    pub(crate) incoming: IndexMap<ComponentId, Vec<GraphEdge>>,
    pub(crate) metadata: BTreeMap<String, serde_json::Value>,
}

/// Node and edge counts with per-type and per-origin breakdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes_by_type: BTreeMap<ComponentType, usize>,
    pub nodes_by_origin: BTreeMap<Origin, usize>,
    pub edges_by_type: BTreeMap<EdgeType, usize>,
}

/// What [`ComponentGraph::merge`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub nodes_added: usize,
    /// Nodes present in both graphs; the target's copy was kept.
    pub nodes_kept: usize,
    pub edges_added: usize,
    /// Edges whose `(from, to, type)` triple already existed in the target.
    pub edges_skipped: usize,
}

impl ComponentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Inserts a node, replacing any node with the same id.
    ///
    /// Existing edges of a replaced node are kept. Empty adjacency lists are
    /// created for new ids. Returns the replaced node, if any.
    pub fn add_node(&mut self, node: GraphNode) -> Option<GraphNode> {
        let id = node.id();
        self.outgoing.entry(id.clone()).or_default();
        self.incoming.entry(id.clone()).or_default();
        self.nodes.insert(id, node)
    }

    /// Inserts an edge `from -> to`.
    ///
    /// Both endpoints must already be in the graph; otherwise this is a
    /// builder bug and [`CoreError::MissingEndpoint`] is returned. Edges with
    /// an existing triple are still inserted (multigraph), with an ordinal
    /// suffix on their id.
    pub fn add_edge(
        &mut self,
        from: &ComponentId,
        to: &ComponentId,
        edge_type: EdgeType,
    ) -> Result<GraphEdge, CoreError> {
        for endpoint in [from, to] {
            if !self.nodes.contains_key(endpoint) {
                return Err(CoreError::MissingEndpoint {
                    from: from.clone(),
                    to: to.clone(),
                    missing: endpoint.clone(),
                });
            }
        }

        let ordinal = self
            .outgoing_edges(from.as_str())
            .iter()
            .filter(|e| e.matches(from, to, edge_type))
            .count();
        let edge = GraphEdge {
            id: GraphEdge::make_id(from, to, edge_type, ordinal),
            from: from.clone(),
            to: to.clone(),
            edge_type,
        };
        self.insert_edge_unchecked(edge.clone());
        Ok(edge)
    }

    /// Inserts an edge unless one with the same `(from, to, type)` triple
    /// exists. Returns `true` if an edge was added.
    pub fn add_edge_dedup(
        &mut self,
        from: &ComponentId,
        to: &ComponentId,
        edge_type: EdgeType,
    ) -> Result<bool, CoreError> {
        if self.has_edge(from, to, edge_type) {
            return Ok(false);
        }
        self.add_edge(from, to, edge_type)?;
        Ok(true)
    }

    fn insert_edge_unchecked(&mut self, edge: GraphEdge) {
        self.incoming
            .entry(edge.to.clone())
            .or_default()
            .push(edge.clone());
        self.outgoing.entry(edge.from.clone()).or_default().push(edge);
    }

    /// Removes a node together with every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Option<GraphNode> {
        let node = self.nodes.shift_remove(id)?;

        if let Some(out) = self.outgoing.shift_remove(id) {
            for edge in out {
                if let Some(list) = self.incoming.get_mut(edge.to.as_str()) {
                    list.retain(|e| e.id != edge.id);
                }
            }
        }
        if let Some(inc) = self.incoming.shift_remove(id) {
            for edge in inc {
                if let Some(list) = self.outgoing.get_mut(edge.from.as_str()) {
                    list.retain(|e| e.id != edge.id);
                }
            }
        }
        Some(node)
    }

    /// Sets a graph-level metadata entry (carried through serialization).
    pub fn set_metadata(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Returns the stored id alongside the node, borrowing both from the graph.
    pub fn get_entry(&self, id: &str) -> Option<(&ComponentId, &GraphNode)> {
        self.nodes.get_key_value(id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterates nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Iterates node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.nodes.keys()
    }

    /// Iterates every edge once, grouped by source in node order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.outgoing.values().flatten()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn has_edge(&self, from: &ComponentId, to: &ComponentId, edge_type: EdgeType) -> bool {
        self.outgoing_edges(from.as_str())
            .iter()
            .any(|e| e.matches(from, to, edge_type))
    }

    /// Edges leaving `id`. Empty for unknown ids.
    pub fn outgoing_edges(&self, id: &str) -> &[GraphEdge] {
        self.outgoing.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Edges arriving at `id`. Empty for unknown ids.
    pub fn incoming_edges(&self, id: &str) -> &[GraphEdge] {
        self.incoming.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Nodes `id` depends on directly, one entry per edge.
    ///
    /// Edges whose target is no longer in the graph are skipped.
    pub fn dependencies(&self, id: &str) -> Vec<&GraphNode> {
        self.outgoing_edges(id)
            .iter()
            .filter_map(|e| self.nodes.get(&e.to))
            .collect()
    }

    /// Nodes that depend on `id` directly, one entry per edge.
    ///
    /// Edges whose source is no longer in the graph are skipped.
    pub fn dependents(&self, id: &str) -> Vec<&GraphNode> {
        self.incoming_edges(id)
            .iter()
            .filter_map(|e| self.nodes.get(&e.from))
            .collect()
    }

    /// All versions of the logical component named by `reference`.
    ///
    /// The reference's own version is ignored.
    pub fn find_nodes_by_ref(&self, reference: &ComponentRef) -> Vec<&GraphNode> {
        let prefix = reference.logical_prefix();
        self.nodes
            .iter()
            .filter(|(id, _)| id.as_str().starts_with(&prefix))
            .map(|(_, node)| node)
            .collect()
    }

    /// Computes node/edge counts with type and origin breakdowns.
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            ..GraphStats::default()
        };
        for node in self.nodes.values() {
            *stats.nodes_by_type.entry(node.component_type).or_default() += 1;
            *stats.nodes_by_origin.entry(node.origin).or_default() += 1;
        }
        for edge in self.edges() {
            *stats.edges_by_type.entry(edge.edge_type).or_default() += 1;
        }
        stats
    }

    // -----------------------------------------------------------------------
    // Whole-graph operations
    // -----------------------------------------------------------------------

    /// Unions `other` into `self`.
    ///
    /// On node id conflicts the node already in `self` is kept. Edges are
    /// de-duplicated on their `(from, to, type)` triple. Graph metadata from
    /// `other` fills keys missing in `self`.
    pub fn merge(&mut self, other: &ComponentGraph) -> MergeSummary {
        let mut summary = MergeSummary::default();

        for (id, node) in &other.nodes {
            if self.nodes.contains_key(id) {
                summary.nodes_kept += 1;
            } else {
                self.add_node(node.clone());
                summary.nodes_added += 1;
            }
        }

        for edge in other.edges() {
            if self.has_edge(&edge.from, &edge.to, edge.edge_type) {
                summary.edges_skipped += 1;
                continue;
            }
            // Endpoints exist: every node of `other` is now in `self`.
            self.insert_edge_unchecked(GraphEdge {
                id: GraphEdge::make_id(&edge.from, &edge.to, edge.edge_type, 0),
                from: edge.from.clone(),
                to: edge.to.clone(),
                edge_type: edge.edge_type,
            });
            summary.edges_added += 1;
        }

        for (key, value) in &other.metadata {
            self.metadata
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        summary
    }

    /// Exports the graph to a petgraph `DiGraph` for algorithm reuse.
    ///
    /// Node weights are component ids, edge weights the relationship type.
    /// Returns the graph and the id-to-index mapping.
    pub fn to_petgraph(&self) -> (DiGraph<ComponentId, EdgeType>, HashMap<ComponentId, NodeIndex>) {
        let mut graph = DiGraph::with_capacity(self.node_count(), self.edge_count());
        let mut indices = HashMap::with_capacity(self.node_count());

        for id in self.nodes.keys() {
            indices.insert(id.clone(), graph.add_node(id.clone()));
        }
        for edge in self.edges() {
            if let (Some(&a), Some(&b)) = (indices.get(&edge.from), indices.get(&edge.to)) {
                graph.add_edge(a, b, edge.edge_type);
            }
        }
        (graph, indices)
    }
}
