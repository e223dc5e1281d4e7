//! Core error types for compgraph-core.
//!
//! Uses `thiserror` for structured, matchable variants. Normalization
//! failures are not errors (they yield `None`); the variants here are
//! contract violations inside the graph store and malformed serialized
//! graphs.

use thiserror::Error;

use crate::id::ComponentId;

/// Errors produced by graph store operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An edge was inserted before one of its endpoint nodes.
    #[error("edge {from} -> {to} references missing node {missing}")]
    MissingEndpoint {
        from: ComponentId,
        to: ComponentId,
        missing: ComponentId,
    },

    /// A node id was not found in the graph.
    #[error("node not found: {id}")]
    NodeNotFound { id: ComponentId },

    /// A serialized graph could not be reconstructed.
    #[error("invalid serialized graph: {reason}")]
    InvalidSerializedGraph { reason: String },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
