//! Graph builders.
//!
//! Two producers of [`compgraph_core::ComponentGraph`]:
//! - [`local`]: definition files on disk, through a [`source::ComponentSource`]
//! - [`runtime`]: a deployed environment, through an [`adapter::RuntimeAdapter`]
//!
//! Both hash every definition with `compgraph-content` and wire edges with
//! [`link::link_references`], so the two graphs are directly comparable.
//! Configuration is passed in explicitly; see [`config`].

pub mod adapter;
pub mod config;
pub mod error;
pub mod link;
pub mod local;
pub mod runtime;
pub mod source;

pub use adapter::{HttpRuntimeAdapter, Page, PageRequest, RawRecord, RuntimeAdapter};
pub use config::{CompgraphConfig, LocalConfig, RuntimeConfig};
pub use error::{AdapterError, BuilderError};
pub use link::{link_references, LinkSummary, MissingTarget, UnresolvedRef};
pub use local::{build_local_graph, build_local_graph_from_config, LocalBuild, SkippedFile};
pub use runtime::{
    build_runtime_graph, DroppedRecord, RuntimeBuild, RuntimeBuildReport, TypeOutcome, TypeReport,
};
pub use source::{ComponentSource, FsComponentSource, SourceFailure, SourceRecord, SourceScan};
