//! Graph nodes.
//!
//! A [`GraphNode`] owns its component definition outright. Builders hand the
//! node its own `serde_json::Value`, so nothing outside the graph can mutate
//! a stored definition; changes are modeled as replacing the node.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::{ComponentId, ComponentRef};
use crate::types::{ComponentType, Origin};

/// Metadata key for the file a local node was read from.
pub const META_FILE_PATH: &str = "filePath";
/// Metadata key for the runtime instance id of a runtime node.
pub const META_INSTANCE_ID: &str = "instanceId";

/// One versioned component in a [`ComponentGraph`](crate::graph::ComponentGraph).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    #[serde(rename = "ref")]
    pub reference: ComponentRef,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    /// Full component definition as read from its source.
    pub definition: serde_json::Value,
    pub origin: Origin,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    /// Origin-specific metadata (`filePath`, `instanceId`, ...).
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl GraphNode {
    /// Creates a node with no tags, hashes or metadata.
    pub fn new(
        reference: ComponentRef,
        component_type: ComponentType,
        definition: serde_json::Value,
        origin: Origin,
    ) -> Self {
        GraphNode {
            reference,
            component_type,
            definition,
            origin,
            tags: Vec::new(),
            api_hash: None,
            config_hash: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.reference.id()
    }

    pub fn with_hashes(mut self, api_hash: Option<String>, config_hash: Option<String>) -> Self {
        self.api_hash = api_hash;
        self.config_hash = config_hash;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Returns a metadata entry as a string, if present and a string.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_ref() -> ComponentRef {
        ComponentRef::new("core", "sys-tasks", "send-email", "1.0.0").unwrap()
    }

    #[test]
    fn node_id_comes_from_reference() {
        let node = GraphNode::new(task_ref(), ComponentType::Task, json!({}), Origin::Local);
        assert_eq!(node.id().as_str(), "core/sys-tasks/send-email@1.0.0");
    }

    #[test]
    fn builder_methods_fill_optional_fields() {
        let node = GraphNode::new(task_ref(), ComponentType::Task, json!({}), Origin::Runtime)
            .with_hashes(Some("a".into()), None)
            .with_tags(vec!["billing".into()])
            .with_metadata(META_INSTANCE_ID, "7f1c");

        assert_eq!(node.api_hash.as_deref(), Some("a"));
        assert_eq!(node.config_hash, None);
        assert_eq!(node.tags, vec!["billing".to_string()]);
        assert_eq!(node.metadata_str(META_INSTANCE_ID), Some("7f1c"));
    }

    #[test]
    fn serialized_field_names() {
        let node = GraphNode::new(task_ref(), ComponentType::Task, json!({"a": 1}), Origin::Local)
            .with_hashes(Some("h".into()), None);
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["ref"]["key"], "send-email");
        assert_eq!(value["type"], "task");
        assert_eq!(value["apiHash"], "h");
        assert!(value.get("configHash").is_none());
    }
}
