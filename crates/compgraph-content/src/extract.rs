//! Reference extraction from component definitions.
//!
//! [`extract_references`] walks a definition tree and records every object
//! that normalizes to a reference. A resolved reference is a leaf: the walk
//! does not descend into it. The component type of each reference is
//! inferred from, in order:
//! 1. the name of the field holding it (`task`, `view`, `subFlow`, ...)
//! 2. the dotted path of ancestor field names
//! 3. the reserved flow the reference itself names (`sys-tasks`, ...)
//! 4. `workflow`
//!
//! Descriptive and code-carrying fields (labels, captions, mapping code and
//! locations, timers, version strategies) are skipped entirely.

use std::collections::HashSet;

use serde_json::Value;

use compgraph_core::{ComponentId, ComponentRef, ComponentType};

use crate::normalize::{looks_like_ref, normalize, RefDefaults};

/// One reference found in a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRef {
    pub reference: ComponentRef,
    pub component_type: ComponentType,
}

/// The result of walking one definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Distinct references in first-discovery order.
    pub refs: Vec<ExtractedRef>,
    /// Dotted paths of reference-like objects that failed normalization.
    pub unresolved: Vec<String>,
}

/// Field names that can never hold a reference, compared with case and
/// `-`/`_` separators ignored.
const EXCLUDED_FIELDS: &[&str] = &[
    "label",
    "labels",
    "caption",
    "captions",
    "code",
    "location",
    "timer",
    "versionstrategy",
];

fn is_excluded(field: &str) -> bool {
    let folded: String = field
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect();
    EXCLUDED_FIELDS.contains(&folded.as_str())
}

/// Returns the definition body: the `attributes` object when present,
/// otherwise the definition itself.
pub fn definition_body(definition: &Value) -> &Value {
    match definition.get("attributes") {
        Some(attributes @ Value::Object(_)) => attributes,
        _ => definition,
    }
}

/// Extracts every distinct reference embedded in `definition`.
///
/// The root object is never treated as a reference to itself, even when it
/// carries its own `key`/`domain`/`flow`/`version` identity.
pub fn extract_references(definition: &Value, defaults: &RefDefaults) -> Extraction {
    let mut walker = Walker {
        defaults,
        path: Vec::new(),
        seen: HashSet::new(),
        out: Extraction::default(),
    };
    walker.walk_children(definition_body(definition), None);
    walker.out
}

struct Walker<'d> {
    defaults: &'d RefDefaults,
    /// Field names from the body root down to the current value.
    path: Vec<String>,
    seen: HashSet<ComponentId>,
    out: Extraction,
}

impl Walker<'_> {
    fn walk(&mut self, value: &Value, field: Option<&str>) {
        match value {
            Value::Object(_) => {
                if let Some(normalized) = normalize(value, self.defaults) {
                    let component_type = self
                        .infer_type(field)
                        .or(normalized.implied_type)
                        .unwrap_or(ComponentType::Workflow);
                    self.record(normalized.reference, component_type);
                    return;
                }
                if looks_like_ref(value) {
                    let path = self.path.join(".");
                    tracing::debug!(path = %path, "unresolved reference candidate");
                    self.out.unresolved.push(path);
                }
                self.walk_children(value, field);
            }
            Value::Array(_) => self.walk_children(value, field),
            _ => {}
        }
    }

    /// Walks the members of an object or array without trying to normalize
    /// the container itself. Array elements inherit the array's field name.
    fn walk_children(&mut self, value: &Value, field: Option<&str>) {
        match value {
            Value::Object(map) => {
                for (name, child) in map {
                    if is_excluded(name) {
                        continue;
                    }
                    self.path.push(name.clone());
                    self.walk(child, Some(name));
                    self.path.pop();
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(item, field);
                }
            }
            _ => {}
        }
    }

    fn infer_type(&self, field: Option<&str>) -> Option<ComponentType> {
        field
            .and_then(ComponentType::infer)
            .or_else(|| ComponentType::infer(&self.path.join(".")))
    }

    fn record(&mut self, reference: ComponentRef, component_type: ComponentType) {
        if self.seen.insert(reference.id()) {
            self.out.refs.push(ExtractedRef {
                reference,
                component_type,
            });
        }
    }
}
