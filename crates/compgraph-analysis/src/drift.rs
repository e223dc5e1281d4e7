//! Drift detection between a local graph and a runtime graph.
//!
//! Components present on both sides are compared by content hash. An API
//! hash mismatch wins over a config hash mismatch, so a component lands in
//! exactly one bucket. A missing hash on one side counts as a mismatch;
//! missing on both sides counts as equal.

use std::collections::HashSet;

use serde::Serialize;

use compgraph_core::{ComponentGraph, ComponentId, GraphNode};

/// Where a single component stands after a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    /// Present locally, not deployed.
    New,
    /// Deployed, no longer present locally.
    RuntimeOnly,
    /// Caller-facing shape changed.
    ApiDrift,
    /// Only behavior settings changed.
    ConfigDrift,
    Unchanged,
}

/// Partition of the union of both graphs' ids.
///
/// `only_runtime` follows runtime insertion order; every other list follows
/// local insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    pub only_local: Vec<ComponentId>,
    pub only_runtime: Vec<ComponentId>,
    pub api_drift: Vec<ComponentId>,
    pub config_drift: Vec<ComponentId>,
    pub unchanged: Vec<ComponentId>,
}

impl DriftReport {
    /// Classification of one id, or `None` if neither graph had it.
    pub fn classification(&self, id: &str) -> Option<Classification> {
        let buckets = [
            (&self.only_local, Classification::New),
            (&self.only_runtime, Classification::RuntimeOnly),
            (&self.api_drift, Classification::ApiDrift),
            (&self.config_drift, Classification::ConfigDrift),
            (&self.unchanged, Classification::Unchanged),
        ];
        buckets
            .into_iter()
            .find(|(ids, _)| ids.iter().any(|i| i.as_str() == id))
            .map(|(_, class)| class)
    }

    /// Components that must be deployed: new, API drift, then config drift.
    pub fn changed(&self) -> Vec<ComponentId> {
        self.only_local
            .iter()
            .chain(&self.api_drift)
            .chain(&self.config_drift)
            .cloned()
            .collect()
    }

    /// Components that deserve review before deploying: new components and
    /// API drift. Config drift is excluded.
    pub fn attention(&self) -> Vec<ComponentId> {
        self.only_local
            .iter()
            .chain(&self.api_drift)
            .cloned()
            .collect()
    }

    /// Returns true if nothing differs between the two graphs.
    pub fn is_clean(&self) -> bool {
        self.only_local.is_empty()
            && self.only_runtime.is_empty()
            && self.api_drift.is_empty()
            && self.config_drift.is_empty()
    }

    /// Number of components that are not unchanged.
    pub fn total(&self) -> usize {
        self.only_local.len() + self.only_runtime.len() + self.api_drift.len() + self.config_drift.len()
    }
}

/// Compares two nodes sharing an id.
pub fn classify_pair(local: &GraphNode, runtime: &GraphNode) -> Classification {
    if local.api_hash != runtime.api_hash {
        Classification::ApiDrift
    } else if local.config_hash != runtime.config_hash {
        Classification::ConfigDrift
    } else {
        Classification::Unchanged
    }
}

/// Partitions the components of `local` and `runtime`.
pub fn diff_graphs(local: &ComponentGraph, runtime: &ComponentGraph) -> DriftReport {
    let mut report = DriftReport::default();

    for node in local.nodes() {
        let id = node.id();
        match runtime.get_node(id.as_str()) {
            None => report.only_local.push(id),
            Some(deployed) => match classify_pair(node, deployed) {
                Classification::ApiDrift => report.api_drift.push(id),
                Classification::ConfigDrift => report.config_drift.push(id),
                _ => report.unchanged.push(id),
            },
        }
    }

    let local_ids: HashSet<&str> = local.node_ids().map(ComponentId::as_str).collect();
    report.only_runtime = runtime
        .node_ids()
        .filter(|id| !local_ids.contains(id.as_str()))
        .cloned()
        .collect();

    tracing::debug!(
        only_local = report.only_local.len(),
        only_runtime = report.only_runtime.len(),
        api_drift = report.api_drift.len(),
        config_drift = report.config_drift.len(),
        unchanged = report.unchanged.len(),
        "diffed graphs"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{id, node};
    use compgraph_core::{ComponentType, Origin};

    fn hashed(key: &str, origin: Origin, api: Option<&str>, config: Option<&str>) -> GraphNode {
        node(key, ComponentType::Schema, origin)
            .with_hashes(api.map(str::to_string), config.map(str::to_string))
    }

    fn pair(local: GraphNode, runtime: GraphNode) -> (ComponentGraph, ComponentGraph) {
        let mut l = ComponentGraph::new();
        l.add_node(local);
        let mut r = ComponentGraph::new();
        r.add_node(runtime);
        (l, r)
    }

    #[test]
    fn test_api_drift_takes_precedence() {
        let (l, r) = pair(
            hashed("s1", Origin::Local, Some("a1"), Some("c")),
            hashed("s1", Origin::Runtime, Some("a2"), Some("c")),
        );
        let report = diff_graphs(&l, &r);
        let s1 = id("s1", ComponentType::Schema);
        assert_eq!(report.api_drift, vec![s1.clone()]);
        assert!(report.config_drift.is_empty());
        assert_eq!(report.classification(s1.as_str()), Some(Classification::ApiDrift));

        let (l, r) = pair(
            hashed("s1", Origin::Local, Some("a1"), Some("c1")),
            hashed("s1", Origin::Runtime, Some("a2"), Some("c2")),
        );
        assert_eq!(diff_graphs(&l, &r).api_drift, vec![s1]);
    }

    #[test]
    fn test_config_drift() {
        let (l, r) = pair(
            hashed("s1", Origin::Local, Some("a"), Some("c1")),
            hashed("s1", Origin::Runtime, Some("a"), Some("c2")),
        );
        let report = diff_graphs(&l, &r);
        assert_eq!(report.config_drift.len(), 1);
        assert!(report.attention().is_empty());
        assert_eq!(report.changed().len(), 1);
    }

    #[test]
    fn test_missing_hashes() {
        let local = hashed("s1", Origin::Local, None, None);
        assert_eq!(
            classify_pair(&local, &hashed("s1", Origin::Runtime, None, None)),
            Classification::Unchanged
        );
        assert_eq!(
            classify_pair(&local, &hashed("s1", Origin::Runtime, Some("a"), None)),
            Classification::ApiDrift
        );
        assert_eq!(
            classify_pair(&local, &hashed("s1", Origin::Runtime, None, Some("c"))),
            Classification::ConfigDrift
        );
    }

    #[test]
    fn test_identical_graphs_are_unchanged() {
        let mut l = ComponentGraph::new();
        for key in ["a", "b", "c"] {
            l.add_node(hashed(key, Origin::Local, Some(key), Some("cfg")));
        }
        let r = l.clone();
        let report = diff_graphs(&l, &r);
        assert!(report.is_clean());
        assert_eq!(report.total(), 0);
        assert_eq!(report.unchanged.len(), 3);
    }

    #[test]
    fn test_partition_orders() {
        let mut l = ComponentGraph::new();
        l.add_node(hashed("b", Origin::Local, None, None));
        l.add_node(hashed("a", Origin::Local, None, None));
        let mut r = ComponentGraph::new();
        r.add_node(hashed("z", Origin::Runtime, None, None));
        r.add_node(hashed("y", Origin::Runtime, None, None));

        let report = diff_graphs(&l, &r);
        let schema = |k: &str| id(k, ComponentType::Schema);
        assert_eq!(report.only_local, vec![schema("b"), schema("a")]);
        assert_eq!(report.only_runtime, vec![schema("z"), schema("y")]);
        assert_eq!(
            report.classification(schema("y").as_str()),
            Some(Classification::RuntimeOnly)
        );
        assert_eq!(report.classification("core/sys-schemas/none@1.0.0"), None);
    }
}
