//! Data model and graph store for versioned component graphs.
//!
//! # Modules
//!
//! - [`id`]: ComponentRef tuple and its canonical ComponentId string
//! - [`types`]: ComponentType, EdgeType and Origin classifications
//! - [`node`]: GraphNode, an owned component definition plus hashes
//! - [`edge`]: GraphEdge, a typed dependency
//! - [`graph`]: ComponentGraph, the in-memory multigraph store
//! - [`serialize`]: SerializedGraph exchange format
//! - [`error`]: CoreError

pub mod edge;
pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod serialize;
pub mod types;

// Re-export commonly used types
pub use edge::GraphEdge;
pub use error::CoreError;
pub use graph::{ComponentGraph, GraphStats, MergeSummary};
pub use id::{ComponentId, ComponentRef};
pub use node::{GraphNode, META_FILE_PATH, META_INSTANCE_ID};
pub use serialize::SerializedGraph;
pub use types::{ComponentType, EdgeType, Origin};
