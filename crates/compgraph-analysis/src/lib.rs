//! Analyses over completed component graphs.
//!
//! Everything here is synchronous and read-only with respect to the graphs
//! it is given:
//! - [`resolve`]: transitive dependency closures and cycle-tolerant
//!   deployment ordering over a subset of nodes
//! - [`cycles`]: strongly connected components via petgraph
//! - [`drift`]: local vs runtime comparison by content hash
//! - [`impact`]: ranking by number of dependents
//! - [`plan`]: the above bundled into one deployment plan

pub mod cycles;
pub mod drift;
pub mod impact;
pub mod plan;
pub mod resolve;

#[cfg(test)]
mod fixtures;

pub use cycles::{find_cycles, is_acyclic};
pub use drift::{classify_pair, diff_graphs, Classification, DriftReport};
pub use impact::{impact_score, rank_by_impact, ImpactEntry};
pub use plan::{plan_deployment, DeploymentPlan};
pub use resolve::{
    deployment_order, full_deployment_order, transitive_dependencies, DeploymentOrder,
};
