//! Runtime graph builder.
//!
//! Fetches every configured component type from a [`RuntimeAdapter`]
//! concurrently, one task per type, each bounded by the type deadline. A
//! type fails as a whole if any of its pages fails; the other types are
//! unaffected. The outcome of every type is recorded in the
//! [`RuntimeBuildReport`], so an empty type and a failed type are never
//! confused.

use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use compgraph_content::{hash_component, RefDefaults};
use compgraph_core::{
    ComponentGraph, ComponentRef, ComponentType, GraphNode, Origin, META_INSTANCE_ID,
};

use crate::adapter::{is_empty_body, PageRequest, RawRecord, RuntimeAdapter};
use crate::config::RuntimeConfig;
use crate::error::{AdapterError, BuilderError};
use crate::link::{link_references, LinkSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum TypeOutcome {
    /// Every page was retrieved. `records` may legitimately be zero.
    Fetched { records: usize },
    /// The type could not be retrieved; it contributes no nodes.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeReport {
    pub component_type: ComponentType,
    #[serde(flatten)]
    pub outcome: TypeOutcome,
}

/// A listed record that produced no node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedRecord {
    pub component_type: ComponentType,
    pub instance_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeBuildReport {
    pub run_id: Uuid,
    pub env: String,
    pub domain: String,
    pub types: Vec<TypeReport>,
    pub dropped: Vec<DroppedRecord>,
    pub links: LinkSummary,
}

impl RuntimeBuildReport {
    pub fn failed_types(&self) -> Vec<ComponentType> {
        self.types
            .iter()
            .filter(|t| matches!(t.outcome, TypeOutcome::Failed { .. }))
            .map(|t| t.component_type)
            .collect()
    }

    pub fn outcome(&self, component_type: ComponentType) -> Option<&TypeOutcome> {
        self.types
            .iter()
            .find(|t| t.component_type == component_type)
            .map(|t| &t.outcome)
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeBuild {
    pub graph: ComponentGraph,
    pub report: RuntimeBuildReport,
}

/// Records of one type with their bodies resolved.
struct TypeFetch {
    listed: usize,
    records: Vec<RawRecord>,
    dropped: Vec<DroppedRecord>,
}

/// Builds a runtime graph for `config.env` and `config.domain`.
///
/// Fails only when the connection check fails; everything after that is
/// reported per type and per record.
pub async fn build_runtime_graph(
    adapter: &dyn RuntimeAdapter,
    config: &RuntimeConfig,
    defaults: &RefDefaults,
) -> Result<RuntimeBuild, BuilderError> {
    let run_id = Uuid::new_v4();
    if !adapter.test_connection(&config.env).await {
        return Err(BuilderError::Unreachable(format!(
            "environment '{}' at {}",
            config.env, config.base_url
        )));
    }
    tracing::info!(%run_id, env = %config.env, domain = %config.domain, "building runtime graph");

    let fetches = join_all(
        config
            .types
            .iter()
            .map(|&ty| fetch_type_with_deadline(adapter, ty, config)),
    )
    .await;

    let mut graph = ComponentGraph::new();
    let mut types = Vec::with_capacity(fetches.len());
    let mut dropped = Vec::new();

    for (&component_type, fetch) in config.types.iter().zip(fetches) {
        let fetch = match fetch {
            Ok(fetch) => fetch,
            Err(reason) => {
                tracing::warn!(%component_type, %reason, "component type failed");
                types.push(TypeReport {
                    component_type,
                    outcome: TypeOutcome::Failed { reason },
                });
                continue;
            }
        };

        types.push(TypeReport {
            component_type,
            outcome: TypeOutcome::Fetched {
                records: fetch.listed,
            },
        });
        dropped.extend(fetch.dropped);

        for record in fetch.records {
            match runtime_node(component_type, &record, config, defaults) {
                Some(node) if graph.has_node(node.id().as_str()) => {
                    let reason = "duplicate component id";
                    dropped.push(drop_record(component_type, &record, reason));
                }
                Some(node) => {
                    graph.add_node(node);
                }
                None => {
                    let reason = "incomplete component identity";
                    dropped.push(drop_record(component_type, &record, reason));
                }
            }
        }
    }

    let links = link_references(&mut graph, defaults)?;
    graph.set_metadata("origin", Origin::Runtime.to_string());
    graph.set_metadata("env", config.env.clone());
    graph.set_metadata("domain", config.domain.clone());
    graph.set_metadata("runId", run_id.to_string());

    let report = RuntimeBuildReport {
        run_id,
        env: config.env.clone(),
        domain: config.domain.clone(),
        types,
        dropped,
        links,
    };
    tracing::info!(
        %run_id,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        dropped = report.dropped.len(),
        failed_types = report.failed_types().len(),
        "built runtime graph"
    );

    Ok(RuntimeBuild { graph, report })
}

async fn fetch_type_with_deadline(
    adapter: &dyn RuntimeAdapter,
    component_type: ComponentType,
    config: &RuntimeConfig,
) -> Result<TypeFetch, String> {
    let deadline = config.type_deadline();
    match tokio::time::timeout(deadline, fetch_type(adapter, component_type, config)).await {
        Ok(Ok(fetch)) => Ok(fetch),
        Ok(Err(err)) => Err(err.to_string()),
        Err(_) => Err(format!("deadline of {}ms exceeded", config.type_deadline_ms)),
    }
}

async fn fetch_type(
    adapter: &dyn RuntimeAdapter,
    component_type: ComponentType,
    config: &RuntimeConfig,
) -> Result<TypeFetch, AdapterError> {
    let mut listed = Vec::new();
    let mut page = 1;
    loop {
        let request = PageRequest {
            page,
            page_size: config.page_size,
            filter: None,
        };
        let result = adapter
            .fetch_components_by_type(component_type, &config.env, &config.domain, &request)
            .await?;
        let exhausted = result.items.is_empty() || !result.has_next;
        listed.extend(result.items);
        if exhausted {
            break;
        }
        if page >= config.max_pages {
            tracing::warn!(%component_type, max_pages = config.max_pages, "page limit reached");
            break;
        }
        page += 1;
    }
    tracing::debug!(%component_type, records = listed.len(), pages = page, "listed component type");

    let mut fetch = TypeFetch {
        listed: listed.len(),
        records: Vec::with_capacity(listed.len()),
        dropped: Vec::new(),
    };
    for record in listed {
        match resolve_body(adapter, component_type, config, record).await {
            Ok(record) => fetch.records.push(record),
            Err(dropped) => {
                tracing::warn!(
                    %component_type,
                    instance_id = %dropped.instance_id,
                    reason = %dropped.reason,
                    "dropping runtime record"
                );
                fetch.dropped.push(dropped);
            }
        }
    }
    Ok(fetch)
}

/// Ensures `record` carries a body: first from the listing, then by
/// fetching the record by id, then from a body location in its metadata.
async fn resolve_body(
    adapter: &dyn RuntimeAdapter,
    component_type: ComponentType,
    config: &RuntimeConfig,
    mut record: RawRecord,
) -> Result<RawRecord, DroppedRecord> {
    if !record.has_empty_body() {
        return Ok(record);
    }

    match adapter
        .fetch_component(component_type, &config.env, &config.domain, &record.id)
        .await
    {
        Ok(Some(full)) if !full.has_empty_body() => {
            tracing::debug!(%component_type, instance_id = %record.id, "body recovered by id");
            record.attributes = full.attributes;
            return Ok(record);
        }
        Ok(_) => {}
        Err(err) => {
            tracing::debug!(
                %component_type,
                instance_id = %record.id,
                error = %err,
                "fetch by id failed"
            );
        }
    }

    if let Some(location) = record.body_location().map(str::to_string) {
        match adapter.fetch_body(&location).await {
            Ok(Some(body)) if !is_empty_body(&body) => {
                tracing::debug!(
                    %component_type,
                    instance_id = %record.id,
                    %location,
                    "body recovered from location"
                );
                record.attributes = body;
                return Ok(record);
            }
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(
                    %component_type,
                    instance_id = %record.id,
                    error = %err,
                    "body fetch failed"
                );
            }
        }
    }

    Err(drop_record(component_type, &record, "definition body unavailable"))
}

fn drop_record(component_type: ComponentType, record: &RawRecord, reason: &str) -> DroppedRecord {
    DroppedRecord {
        component_type,
        instance_id: record.id.clone(),
        reason: reason.to_string(),
    }
}

/// Builds the node for a runtime record, or `None` if its identity is
/// incomplete.
///
/// The definition mirrors the layout of a local file (identity fields plus
/// `attributes`), so both origins hash the same content the same way.
fn runtime_node(
    component_type: ComponentType,
    record: &RawRecord,
    config: &RuntimeConfig,
    defaults: &RefDefaults,
) -> Option<GraphNode> {
    let reference = ComponentRef::new(
        non_empty(record.domain.as_deref()).unwrap_or(&config.domain),
        non_empty(record.flow.as_deref()).unwrap_or(component_type.flow()),
        &record.key,
        non_empty(record.version.as_deref()).unwrap_or(&defaults.default_version),
    )?;

    let definition = json!({
        "key": reference.key,
        "domain": reference.domain,
        "flow": reference.flow,
        "version": reference.version,
        "tags": record.tags,
        "attributes": record.attributes,
    });
    let hashes = hash_component(component_type, &definition);

    Some(
        GraphNode::new(reference, component_type, definition, Origin::Runtime)
            .with_hashes(hashes.api_hash, hashes.config_hash)
            .with_tags(record.tags.clone())
            .with_metadata(META_INSTANCE_ID, record.id.clone()),
    )
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
