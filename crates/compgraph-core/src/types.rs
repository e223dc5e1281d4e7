//! Component, edge and origin classifications.
//!
//! [`ComponentType`] names the six kinds of versioned components the runtime
//! deploys. Each kind lives under a reserved flow (`sys-tasks`, `sys-flows`,
//! ...) and is the target of exactly one [`EdgeType`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of a versioned component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Workflow,
    Task,
    Schema,
    View,
    Function,
    Extension,
}

/// Fragment vocabulary used for directory-name and field-name inference.
///
/// Order matters: the first fragment contained in the input wins, and the
/// workflow fragments come last because `flow` is a substring of many
/// unrelated names.
const FRAGMENTS: &[(&str, ComponentType)] = &[
    ("task", ComponentType::Task),
    ("schema", ComponentType::Schema),
    ("view", ComponentType::View),
    ("function", ComponentType::Function),
    ("extension", ComponentType::Extension),
    ("workflow", ComponentType::Workflow),
    ("flow", ComponentType::Workflow),
];

impl ComponentType {
    /// All component types, in the order the runtime builder fetches them.
    pub const ALL: [ComponentType; 6] = [
        ComponentType::Workflow,
        ComponentType::Task,
        ComponentType::Schema,
        ComponentType::View,
        ComponentType::Function,
        ComponentType::Extension,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Workflow => "workflow",
            ComponentType::Task => "task",
            ComponentType::Schema => "schema",
            ComponentType::View => "view",
            ComponentType::Function => "function",
            ComponentType::Extension => "extension",
        }
    }

    /// The reserved flow that components of this type are deployed under.
    pub fn flow(&self) -> &'static str {
        match self {
            ComponentType::Workflow => "sys-flows",
            ComponentType::Task => "sys-tasks",
            ComponentType::Schema => "sys-schemas",
            ComponentType::View => "sys-views",
            ComponentType::Function => "sys-functions",
            ComponentType::Extension => "sys-extensions",
        }
    }

    /// Maps a reserved flow name back to its component type.
    ///
    /// Matching is case-insensitive and exact; user-defined flows return
    /// `None`.
    pub fn from_flow(flow: &str) -> Option<Self> {
        let flow = flow.to_ascii_lowercase();
        ComponentType::ALL.into_iter().find(|t| t.flow() == flow)
    }

    /// Infers a component type from a free-form name by substring match
    /// against the fragment vocabulary (`task`, `schema`, `view`,
    /// `function`, `extension`, `workflow`/`flow`).
    ///
    /// Used for directory names (`Tasks`, `sys-schemas`), field names
    /// (`task`, `subFlow`) and dotted ancestor paths.
    pub fn infer(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        FRAGMENTS
            .iter()
            .find(|(fragment, _)| lower.contains(fragment))
            .map(|(_, ty)| *ty)
    }

    /// The edge type used when a component references one of this type.
    pub fn edge_type(&self) -> EdgeType {
        EdgeType::for_target(*self)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        ComponentType::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("unknown component type '{}'", s))
    }
}

/// Relationship named by a graph edge, derived from the target's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeType {
    TaskRef,
    SchemaRef,
    ViewRef,
    FunctionRef,
    ExtensionRef,
    SubflowRef,
}

impl EdgeType {
    pub fn for_target(target: ComponentType) -> Self {
        match target {
            ComponentType::Workflow => EdgeType::SubflowRef,
            ComponentType::Task => EdgeType::TaskRef,
            ComponentType::Schema => EdgeType::SchemaRef,
            ComponentType::View => EdgeType::ViewRef,
            ComponentType::Function => EdgeType::FunctionRef,
            ComponentType::Extension => EdgeType::ExtensionRef,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::TaskRef => "task-ref",
            EdgeType::SchemaRef => "schema-ref",
            EdgeType::ViewRef => "view-ref",
            EdgeType::FunctionRef => "function-ref",
            EdgeType::ExtensionRef => "extension-ref",
            EdgeType::SubflowRef => "subflow-ref",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which source of truth produced a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Local,
    Runtime,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Local => f.write_str("local"),
            Origin::Runtime => f.write_str("runtime"),
        }
    }
}
