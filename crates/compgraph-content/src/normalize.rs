//! Reference normalization.
//!
//! Component definitions point at each other in three encodings:
//! - an explicit tuple object: `{"key", "domain", "flow", "version"}`
//! - a path object: `{"ref": "Tasks/send-email.json"}` (also `path`, `$ref`)
//! - a string: `core/sys-tasks/send-email@1.0.0` or `Tasks/send-email.json`
//!
//! [`sniff`] classifies a JSON value into a [`RawRef`] and [`resolve`] turns
//! that into a canonical [`ComponentRef`]. No other module inspects reference
//! shapes. A value that matches no shape is "not a reference" and yields
//! `None`; it is never an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use compgraph_core::{ComponentRef, ComponentType};

pub const DEFAULT_DOMAIN: &str = "core";
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Defaults applied to path references, which carry neither a domain nor a
/// version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefDefaults {
    pub default_domain: String,
    pub default_version: String,
}

impl Default for RefDefaults {
    fn default() -> Self {
        RefDefaults {
            default_domain: DEFAULT_DOMAIN.to_string(),
            default_version: DEFAULT_VERSION.to_string(),
        }
    }
}

/// A reference in one of its accepted encodings, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawRef<'a> {
    /// Object carrying all four tuple fields.
    Explicit {
        domain: &'a str,
        flow: &'a str,
        key: &'a str,
        version: &'a str,
    },
    /// Path-like string, from a `{"ref": ...}` object or a bare string.
    Path(&'a str),
    /// `domain/flow/key@version` string.
    Qualified(&'a str),
}

/// A normalized reference plus the component type the reference itself
/// implies (the directory of a path, or a reserved flow name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRef {
    pub reference: ComponentRef,
    pub implied_type: Option<ComponentType>,
}

const TUPLE_FIELDS: [&str; 4] = ["domain", "flow", "key", "version"];
const PATH_FIELDS: [&str; 3] = ["ref", "path", "$ref"];

/// Classifies `value` into a reference shape without validating it.
pub fn sniff(value: &Value) -> Option<RawRef<'_>> {
    match value {
        Value::Object(map) => {
            if let (Some(domain), Some(flow), Some(key), Some(version)) = (
                str_field(map, "domain"),
                str_field(map, "flow"),
                str_field(map, "key"),
                str_field(map, "version"),
            ) {
                return Some(RawRef::Explicit {
                    domain,
                    flow,
                    key,
                    version,
                });
            }
            PATH_FIELDS
                .iter()
                .find_map(|f| str_field(map, f))
                .and_then(sniff_str)
        }
        Value::String(s) => sniff_str(s),
        _ => None,
    }
}

fn str_field<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    map.get(name).and_then(Value::as_str)
}

fn sniff_str(s: &str) -> Option<RawRef<'_>> {
    let s = s.trim();
    if is_qualified(s) {
        Some(RawRef::Qualified(s))
    } else if s.contains('/') || s.contains('\\') {
        Some(RawRef::Path(s))
    } else {
        None
    }
}

fn is_qualified(s: &str) -> bool {
    match s.rsplit_once('@') {
        Some((path, version)) => {
            !version.is_empty() && !version.contains('/') && path.split('/').count() == 3
        }
        None => false,
    }
}

/// Normalizes a classified reference.
///
/// Returns `None` when a required field is empty or a path's component type
/// cannot be inferred from its first segment.
pub fn resolve(raw: RawRef<'_>, defaults: &RefDefaults) -> Option<NormalizedRef> {
    match raw {
        RawRef::Explicit {
            domain,
            flow,
            key,
            version,
        } => {
            let reference = ComponentRef::new(domain, flow, key, version)?;
            let implied_type = ComponentType::from_flow(&reference.flow);
            Some(NormalizedRef {
                reference,
                implied_type,
            })
        }
        RawRef::Qualified(s) => {
            let (path, version) = s.rsplit_once('@')?;
            let mut parts = path.splitn(3, '/');
            let (domain, flow, key) = (parts.next()?, parts.next()?, parts.next()?);
            let reference = ComponentRef::new(domain, flow, key, version)?;
            let implied_type = ComponentType::from_flow(&reference.flow);
            Some(NormalizedRef {
                reference,
                implied_type,
            })
        }
        RawRef::Path(s) => {
            let segments: Vec<&str> = s
                .split(['/', '\\'])
                .filter(|seg| !seg.is_empty() && *seg != ".")
                .collect();
            if segments.len() < 2 {
                return None;
            }
            let component_type = ComponentType::infer(segments[0])?;
            let file = segments[segments.len() - 1];
            let key = strip_json_extension(file);
            let reference = ComponentRef::new(
                &defaults.default_domain,
                component_type.flow(),
                key,
                &defaults.default_version,
            )?;
            Some(NormalizedRef {
                reference,
                implied_type: Some(component_type),
            })
        }
    }
}

fn strip_json_extension(file: &str) -> &str {
    let len = file.len();
    if len >= 5 && file.is_char_boundary(len - 5) && file[len - 5..].eq_ignore_ascii_case(".json") {
        &file[..len - 5]
    } else {
        file
    }
}

/// Sniffs and normalizes `value` in one step.
pub fn normalize(value: &Value, defaults: &RefDefaults) -> Option<NormalizedRef> {
    sniff(value).and_then(|raw| resolve(raw, defaults))
}

/// Returns `true` for objects that look like a reference attempt: a `ref`
/// (or `path`, `$ref`) string, or a `key` alongside at least one other tuple field.
///
/// Used to report candidates that failed normalization instead of silently
/// ignoring them.
pub fn looks_like_ref(value: &Value) -> bool {
    let Value::Object(map) = value else {
        return false;
    };
    if PATH_FIELDS
        .iter()
        .any(|f| map.get(*f).is_some_and(Value::is_string))
    {
        return true;
    }
    map.contains_key("key")
        && TUPLE_FIELDS
            .iter()
            .filter(|f| **f != "key")
            .any(|f| map.contains_key(*f))
}
