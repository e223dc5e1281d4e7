//! Local graph builder.
//!
//! Turns the definition files under a root directory into a
//! [`ComponentGraph`] with `local` origin. Each file's identity comes from
//! its own `domain`/`flow`/`key`/`version` fields, falling back to the
//! configured defaults and, for the key, the file stem. The component type
//! comes from, in order:
//! 1. a reserved `flow` (`sys-tasks`, ...)
//! 2. a top-level `type` naming a component type
//! 3. the first directory name that infers a type (`Tasks/`, `Views/`, ...)
//! 4. `workflow`, when the file declares a custom flow

use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use compgraph_content::{hash_component, RefDefaults};
use compgraph_core::{
    ComponentGraph, ComponentRef, ComponentType, GraphNode, Origin, META_FILE_PATH,
};

use crate::config::LocalConfig;
use crate::error::BuilderError;
use crate::link::{link_references, LinkSummary};
use crate::source::{ComponentSource, FsComponentSource, SourceRecord};

/// A file that produced no node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct LocalBuild {
    pub graph: ComponentGraph,
    pub skipped: Vec<SkippedFile>,
    pub links: LinkSummary,
}

/// Builds a local graph from the directory named in `config`.
pub fn build_local_graph_from_config(
    config: &LocalConfig,
    defaults: &RefDefaults,
) -> Result<LocalBuild, BuilderError> {
    let source = FsComponentSource::new(config.include_hidden);
    build_local_graph(&source, &config.root, defaults)
}

/// Builds a local graph from every record `source` yields under `root`.
///
/// When two files declare the same component, the first one in scan order
/// wins and the other is skipped.
pub fn build_local_graph(
    source: &dyn ComponentSource,
    root: &Path,
    defaults: &RefDefaults,
) -> Result<LocalBuild, BuilderError> {
    let scan = source.scan(root)?;

    let mut graph = ComponentGraph::new();
    let mut skipped: Vec<SkippedFile> = scan
        .failures
        .into_iter()
        .map(|f| SkippedFile {
            path: f.path,
            reason: f.reason,
        })
        .collect();

    for record in scan.records {
        let node = match local_node(&record, defaults) {
            Ok(node) => node,
            Err(reason) => {
                tracing::warn!(path = %record.path.display(), %reason, "skipping local component");
                skipped.push(SkippedFile {
                    path: record.path,
                    reason,
                });
                continue;
            }
        };

        let id = node.id();
        if let Some(existing) = graph.get_node(id.as_str()) {
            let reason = format!(
                "duplicate of {} declared in {}",
                id,
                existing.metadata_str(META_FILE_PATH).unwrap_or("?")
            );
            tracing::warn!(path = %record.path.display(), %reason, "skipping local component");
            skipped.push(SkippedFile {
                path: record.path,
                reason,
            });
            continue;
        }
        tracing::debug!(%id, path = %record.path.display(), "local component");
        graph.add_node(node);
    }

    let links = link_references(&mut graph, defaults)?;
    graph.set_metadata("origin", Origin::Local.to_string());
    graph.set_metadata("root", root.display().to_string());

    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        skipped = skipped.len(),
        missing_targets = links.missing_targets.len(),
        "built local graph"
    );

    Ok(LocalBuild {
        graph,
        skipped,
        links,
    })
}

fn local_node(record: &SourceRecord, defaults: &RefDefaults) -> Result<GraphNode, String> {
    let def = &record.definition;
    let declared_flow = str_field(def, "flow");

    let component_type = declared_flow
        .and_then(ComponentType::from_flow)
        .or_else(|| str_field(def, "type").and_then(|t| t.parse().ok()))
        .or_else(|| type_from_directories(&record.path))
        .or_else(|| declared_flow.map(|_| ComponentType::Workflow))
        .ok_or_else(|| "cannot infer component type".to_string())?;

    let stem = record.path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let reference = ComponentRef::new(
        str_field(def, "domain").unwrap_or(&defaults.default_domain),
        declared_flow.unwrap_or(component_type.flow()),
        str_field(def, "key").unwrap_or(stem),
        str_field(def, "version").unwrap_or(&defaults.default_version),
    )
    .ok_or_else(|| "incomplete component identity".to_string())?;

    let hashes = hash_component(component_type, def);
    Ok(
        GraphNode::new(reference, component_type, def.clone(), Origin::Local)
            .with_hashes(hashes.api_hash, hashes.config_hash)
            .with_tags(string_list(def, "tags"))
            .with_metadata(META_FILE_PATH, record.path.display().to_string()),
    )
}

fn type_from_directories(path: &Path) -> Option<ComponentType> {
    path.parent()?.components().find_map(|c| match c {
        Component::Normal(name) => name.to_str().and_then(ComponentType::infer),
        _ => None,
    })
}

fn str_field<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    value
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn string_list(value: &Value, name: &str) -> Vec<String> {
    value
        .get(name)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(path: &str, definition: Value) -> SourceRecord {
        SourceRecord {
            path: PathBuf::from(path),
            definition,
        }
    }

    fn defaults() -> RefDefaults {
        RefDefaults::default()
    }

    #[test]
    fn test_identity_from_definition() {
        let node = local_node(
            &record(
                "anything/file.json",
                json!({ "key": "Send-Email", "domain": "banking", "flow": "sys-tasks", "version": "2.0.0" }),
            ),
            &defaults(),
        )
        .unwrap();
        assert_eq!(node.id().as_str(), "banking/sys-tasks/send-email@2.0.0");
        assert_eq!(node.component_type, ComponentType::Task);
        assert_eq!(node.metadata_str(META_FILE_PATH), Some("anything/file.json"));
    }

    #[test]
    fn test_identity_from_directory_and_stem() {
        let node = local_node(
            &record("Schemas/customer.json", json!({ "attributes": {} })),
            &defaults(),
        )
        .unwrap();
        assert_eq!(node.id().as_str(), "core/sys-schemas/customer@1.0.0");
        assert_eq!(node.component_type, ComponentType::Schema);
    }

    #[test]
    fn test_declared_type_field() {
        let node =
            local_node(&record("misc/x.json", json!({ "type": "View" })), &defaults()).unwrap();
        assert_eq!(node.component_type, ComponentType::View);
        assert_eq!(node.reference.flow, "sys-views");
    }

    #[test]
    fn test_custom_flow_is_a_workflow() {
        let node = local_node(
            &record("misc/loan.json", json!({ "key": "loan", "flow": "loan-process" })),
            &defaults(),
        )
        .unwrap();
        assert_eq!(node.component_type, ComponentType::Workflow);
        assert_eq!(node.reference.flow, "loan-process");
    }

    #[test]
    fn test_untyped_file_is_rejected() {
        let err =
            local_node(&record("misc/x.json", json!({ "key": "x" })), &defaults()).unwrap_err();
        assert_eq!(err, "cannot infer component type");
    }

    #[test]
    fn test_hashes_and_tags_are_set() {
        let node = local_node(
            &record(
                "Tasks/t.json",
                json!({ "tags": ["core", 3, "email"], "attributes": { "type": "6", "config": { "a": 1 } } }),
            ),
            &defaults(),
        )
        .unwrap();
        assert!(node.api_hash.is_some());
        assert!(node.config_hash.is_some());
        assert_eq!(node.tags, vec!["core".to_string(), "email".to_string()]);
    }
}
