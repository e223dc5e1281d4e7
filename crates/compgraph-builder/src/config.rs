//! Builder configuration.
//!
//! Loaded from `compgraph.toml`. Every section and field is optional; a
//! missing file section falls back to its defaults. Nothing in the library
//! reads the environment: the binary applies overrides with
//! [`CompgraphConfig::apply_overrides`] and passes the result down.
//!
//! ```toml
//! [defaults]
//! default_domain = "core"
//! default_version = "1.0.0"
//!
//! [runtime]
//! base_url = "http://localhost:4201"
//! env = "dev"
//! types = ["workflow", "task"]
//!
//! [local]
//! root = "./components"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use compgraph_content::RefDefaults;
use compgraph_core::ComponentType;

use crate::error::BuilderError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompgraphConfig {
    pub defaults: RefDefaults,
    pub runtime: RuntimeConfig,
    pub local: LocalConfig,
}

/// Where and how to fetch deployed components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub base_url: String,
    pub env: String,
    pub domain: String,
    pub page_size: u32,
    /// Upper bound on pages fetched per component type.
    pub max_pages: u32,
    pub request_timeout_ms: u64,
    /// Deadline for fetching every page of one component type.
    pub type_deadline_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    pub types: Vec<ComponentType>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            base_url: "http://localhost:4201".to_string(),
            env: "dev".to_string(),
            domain: compgraph_content::DEFAULT_DOMAIN.to_string(),
            page_size: 100,
            max_pages: 1000,
            request_timeout_ms: 10_000,
            type_deadline_ms: 60_000,
            api_token: None,
            types: ComponentType::ALL.to_vec(),
        }
    }
}

impl RuntimeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn type_deadline(&self) -> Duration {
        Duration::from_millis(self.type_deadline_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    pub root: PathBuf,
    /// Also walk directories whose name starts with a dot.
    pub include_hidden: bool,
}

impl Default for LocalConfig {
    fn default() -> Self {
        LocalConfig {
            root: PathBuf::from("."),
            include_hidden: false,
        }
    }
}

impl CompgraphConfig {
    /// Reads and parses a TOML config file.
    pub fn load(path: &Path) -> Result<Self, BuilderError> {
        let content = std::fs::read_to_string(path).map_err(|e| BuilderError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, BuilderError> {
        toml::from_str(content).map_err(|e| BuilderError::Config(e.to_string()))
    }

    /// Replaces the API token and base URL when a value is given.
    pub fn apply_overrides(&mut self, api_token: Option<String>, base_url: Option<String>) {
        if let Some(token) = api_token.filter(|t| !t.is_empty()) {
            self.runtime.api_token = Some(token);
        }
        if let Some(url) = base_url.filter(|u| !u.is_empty()) {
            self.runtime.base_url = url;
        }
    }
}
