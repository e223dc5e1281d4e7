//! Deployment planning.
//!
//! Combines a drift report, an impact ranking of the components that need
//! review, and a dependency-respecting order for everything that changed.

use serde::Serialize;

use compgraph_core::{ComponentGraph, ComponentId, GraphEdge};

use crate::drift::{diff_graphs, DriftReport};
use crate::impact::{rank_by_impact, ImpactEntry};
use crate::resolve::deployment_order;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPlan {
    pub report: DriftReport,
    /// New and API-drifted components ranked by local dependents.
    pub impact: Vec<ImpactEntry>,
    /// Every changed component, dependencies first.
    pub order: Vec<ComponentId>,
    /// Cycle edges ignored while ordering.
    pub skipped_edges: Vec<GraphEdge>,
}

impl DeploymentPlan {
    /// Returns true if there is nothing to deploy.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Plans the deployment of `local` over `runtime`.
///
/// Impact and ordering are computed against the local graph, which is the
/// state being deployed.
pub fn plan_deployment(local: &ComponentGraph, runtime: &ComponentGraph) -> DeploymentPlan {
    let report = diff_graphs(local, runtime);
    let impact = rank_by_impact(local, &report.attention());
    let ordered = deployment_order(local, &report.changed());

    DeploymentPlan {
        report,
        impact,
        order: ordered.order,
        skipped_edges: ordered.skipped_edges,
    }
}
