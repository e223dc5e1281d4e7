//! Runtime adapters.
//!
//! [`RuntimeAdapter`] is the seam between the runtime builder and a deployed
//! environment. [`HttpRuntimeAdapter`] talks to the runtime's REST API;
//! tests substitute in-process implementations.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use compgraph_core::ComponentType;

use crate::config::RuntimeConfig;
use crate::error::AdapterError;

/// One page of a listing request. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<RawRecord>,
    pub has_next: bool,
}

/// A component instance as the runtime returns it.
///
/// `attributes` holds the definition body; it may be absent or empty in
/// listings, in which case the builder fetches it separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRecord {
    pub id: String,
    pub key: String,
    pub flow: Option<String>,
    pub domain: Option<String>,
    #[serde(alias = "flowVersion")]
    pub version: Option<String>,
    #[serde(alias = "data")]
    pub attributes: Value,
    pub tags: Vec<String>,
    pub metadata: Map<String, Value>,
}

impl RawRecord {
    /// `true` when the record carries no definition body.
    pub fn has_empty_body(&self) -> bool {
        is_empty_body(&self.attributes)
    }

    /// Where the body can be fetched from, when the runtime says so.
    pub fn body_location(&self) -> Option<&str> {
        ["bodyLocation", "href"]
            .iter()
            .find_map(|k| self.metadata.get(*k).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
    }
}

/// `null` and `{}` count as no body.
pub(crate) fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[async_trait]
pub trait RuntimeAdapter: Send + Sync {
    /// Lists one page of components of `component_type`.
    async fn fetch_components_by_type(
        &self,
        component_type: ComponentType,
        env: &str,
        domain: &str,
        request: &PageRequest,
    ) -> Result<Page, AdapterError>;

    /// Fetches a single component by instance id. `Ok(None)` if unknown.
    async fn fetch_component(
        &self,
        component_type: ComponentType,
        env: &str,
        domain: &str,
        id: &str,
    ) -> Result<Option<RawRecord>, AdapterError>;

    /// Fetches a definition body from a location given in record metadata.
    async fn fetch_body(&self, location: &str) -> Result<Option<Value>, AdapterError>;

    /// Returns `true` if the runtime answers for `env`.
    async fn test_connection(&self, env: &str) -> bool;
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<RawRecord>,
    has_next: Option<bool>,
    #[serde(default)]
    links: Option<ListLinks>,
}

#[derive(Debug, Default, Deserialize)]
struct ListLinks {
    next: Option<String>,
}

/// [`RuntimeAdapter`] over the runtime's HTTP API.
///
/// Runtime requests carry an `X-Environment` header. The bearer token, when
/// configured, is only sent to URLs under `base_url`; body locations on
/// other hosts are fetched without it. The underlying client enforces the
/// configured per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpRuntimeAdapter {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
    request_timeout: Duration,
}

impl HttpRuntimeAdapter {
    pub fn new(config: &RuntimeConfig) -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AdapterError::Transport(e.to_string()))?;
        Ok(HttpRuntimeAdapter {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            request_timeout: config.request_timeout(),
        })
    }

    fn instances_url(&self, component_type: ComponentType, domain: &str) -> String {
        format!(
            "{}/api/v1/{}/workflows/{}/instances",
            self.base_url,
            domain,
            component_type.flow()
        )
    }

    fn resolve_location(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else {
            format!("{}/{}", self.base_url, location.trim_start_matches('/'))
        }
    }

    fn get(&self, url: &str, env: Option<&str>) -> reqwest::RequestBuilder {
        let mut req = self.client.get(url);
        if let Some(env) = env {
            req = req.header("X-Environment", env);
        }
        if let Some(token) = self.api_token.as_ref().filter(|_| self.sends_token_to(url)) {
            req = req.bearer_auth(token);
        }
        req
    }

    /// `true` if `url` is `base_url` itself or a path/query beneath it.
    fn sends_token_to(&self, url: &str) -> bool {
        url.strip_prefix(self.base_url.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?']))
    }

    /// Sends `req` and decodes the JSON body. A 404 yields `Ok(None)`;
    /// callers for which a missing resource is a failure must map it.
    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<Option<T>, AdapterError> {
        let response = req.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| AdapterError::Decode(format!("{}: {}", url, e)))
    }

    fn transport_error(&self, err: reqwest::Error) -> AdapterError {
        if err.is_timeout() {
            AdapterError::Timeout(self.request_timeout)
        } else {
            AdapterError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl RuntimeAdapter for HttpRuntimeAdapter {
    async fn fetch_components_by_type(
        &self,
        component_type: ComponentType,
        env: &str,
        domain: &str,
        request: &PageRequest,
    ) -> Result<Page, AdapterError> {
        let url = self.instances_url(component_type, domain);
        let mut query = vec![
            ("page", request.page.to_string()),
            ("pageSize", request.page_size.to_string()),
        ];
        if let Some(filter) = &request.filter {
            query.push(("filter", filter.clone()));
        }

        let req = self.get(&url, Some(env)).query(&query);
        // A listing endpoint that does not exist is a failure, not an empty page.
        let Some(body) = self.send_json::<ListResponse>(&url, req).await? else {
            return Err(AdapterError::Status { status: 404, url });
        };

        let has_next = body
            .has_next
            .unwrap_or_else(|| body.links.as_ref().is_some_and(|l| l.next.is_some()));
        Ok(Page {
            items: body.items,
            has_next,
        })
    }

    async fn fetch_component(
        &self,
        component_type: ComponentType,
        env: &str,
        domain: &str,
        id: &str,
    ) -> Result<Option<RawRecord>, AdapterError> {
        let url = format!("{}/{}", self.instances_url(component_type, domain), id);
        let req = self.get(&url, Some(env));
        self.send_json(&url, req).await
    }

    async fn fetch_body(&self, location: &str) -> Result<Option<Value>, AdapterError> {
        let url = self.resolve_location(location);
        let req = self.get(&url, None);
        self.send_json(&url, req).await
    }

    async fn test_connection(&self, env: &str) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.get(&url, Some(env)).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::debug!(%url, error = %err, "health check failed");
                false
            }
        }
    }
}
