//! Typed dependency edges.
//!
//! An edge `from -> to` means "`from` depends on `to`". The graph is a
//! multigraph: the same ordered pair may be connected by several edges of
//! different [`EdgeType`]s.

use serde::{Deserialize, Serialize};

use crate::id::ComponentId;
use crate::types::EdgeType;

/// A directed dependency between two components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub from: ComponentId,
    pub to: ComponentId,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
}

impl GraphEdge {
    /// Returns `true` if this edge connects the same ordered pair with the
    /// same relationship as `(from, to, edge_type)`.
    pub fn matches(&self, from: &ComponentId, to: &ComponentId, edge_type: EdgeType) -> bool {
        self.edge_type == edge_type && &self.from == from && &self.to == to
    }

    /// Deterministic edge id: `from->to[type]`, with `#n` appended for the
    /// n-th additional edge carrying the same triple.
    pub fn make_id(from: &ComponentId, to: &ComponentId, edge_type: EdgeType, ordinal: usize) -> String {
        if ordinal == 0 {
            format!("{}->{}[{}]", from, to, edge_type)
        } else {
            format!("{}->{}[{}]#{}", from, to, edge_type, ordinal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_ids_are_deterministic() {
        let a = ComponentId::new("core/sys-flows/a@1.0.0");
        let b = ComponentId::new("core/sys-tasks/b@1.0.0");
        assert_eq!(
            GraphEdge::make_id(&a, &b, EdgeType::TaskRef, 0),
            "core/sys-flows/a@1.0.0->core/sys-tasks/b@1.0.0[task-ref]"
        );
        assert!(GraphEdge::make_id(&a, &b, EdgeType::TaskRef, 2).ends_with("#2"));
    }

    #[test]
    fn matches_requires_full_triple() {
        let a = ComponentId::new("core/sys-flows/a@1.0.0");
        let b = ComponentId::new("core/sys-tasks/b@1.0.0");
        let edge = GraphEdge {
            id: GraphEdge::make_id(&a, &b, EdgeType::TaskRef, 0),
            from: a.clone(),
            to: b.clone(),
            edge_type: EdgeType::TaskRef,
        };
        assert!(edge.matches(&a, &b, EdgeType::TaskRef));
        assert!(!edge.matches(&a, &b, EdgeType::SchemaRef));
        assert!(!edge.matches(&b, &a, EdgeType::TaskRef));
    }
}
