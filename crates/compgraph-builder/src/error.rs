//! Error types for graph builders and runtime adapters.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use compgraph_core::CoreError;

/// Failures talking to a runtime.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The runtime answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// The response body was not the expected JSON shape.
    #[error("malformed response: {0}")]
    Decode(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Failures that abort a whole build.
///
/// Per-record and per-type problems are not errors: they are collected in
/// the build report instead.
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(String),

    /// The runtime failed its connection check before any fetch.
    #[error("runtime unreachable: {0}")]
    Unreachable(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl BuilderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuilderError::Io {
            path: path.into(),
            source,
        }
    }
}
