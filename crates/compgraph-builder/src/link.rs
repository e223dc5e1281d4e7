//! Edge wiring.
//!
//! Runs the reference extractor over every node's definition and connects
//! each node to the components it references. Edges carry the type of the
//! target node as stored in the graph, so a reference found under a
//! misleading field name still gets the right edge type.

use serde::Serialize;

use compgraph_content::{extract_references, RefDefaults};
use compgraph_core::{ComponentGraph, ComponentId, ComponentType, CoreError};

/// A reference whose target is not in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingTarget {
    pub from: ComponentId,
    pub to: ComponentId,
    /// The type the reference asked for.
    pub component_type: ComponentType,
}

/// A reference-like value that failed normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedRef {
    pub from: ComponentId,
    /// Dotted field path inside the definition body.
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSummary {
    pub edges_added: usize,
    pub missing_targets: Vec<MissingTarget>,
    pub unresolved: Vec<UnresolvedRef>,
}

/// Adds an edge for every reference between nodes already in `graph`.
///
/// Exact `(from, to, type)` duplicates are not re-added, so linking twice is
/// harmless. References to absent components are reported, not inserted.
pub fn link_references(
    graph: &mut ComponentGraph,
    defaults: &RefDefaults,
) -> Result<LinkSummary, CoreError> {
    let extractions: Vec<_> = graph
        .nodes()
        .map(|node| (node.id(), extract_references(&node.definition, defaults)))
        .collect();

    let mut summary = LinkSummary::default();
    for (from, extraction) in extractions {
        for path in extraction.unresolved {
            summary.unresolved.push(UnresolvedRef {
                from: from.clone(),
                path,
            });
        }

        for found in extraction.refs {
            let to = found.reference.id();
            let Some(target) = graph.get_node(to.as_str()) else {
                tracing::debug!(%from, %to, "reference target not in graph");
                summary.missing_targets.push(MissingTarget {
                    from: from.clone(),
                    to,
                    component_type: found.component_type,
                });
                continue;
            };
            let edge_type = target.component_type.edge_type();
            if graph.add_edge_dedup(&from, &to, edge_type)? {
                summary.edges_added += 1;
            }
        }
    }

    Ok(summary)
}
