//! Deterministic content hashing for component definitions using blake3.
//!
//! Each component gets two digests:
//! - **API hash**: the parts of a definition callers depend on (workflow
//!   states and transitions, task parameters and outputs, schema bodies,
//!   view bodies). A change here can break consumers.
//! - **Config hash**: behavior that does not change the contract (timeouts,
//!   feature and extension lists, type-specific config blocks).
//!
//! # Determinism
//!
//! Signatures are serialized with [`canonical_json`], which sorts object keys
//! recursively, so logically equal definitions hash identically regardless of
//! key insertion order. State and transition lists are sorted by their
//! canonical form, since reordering them does not change the contract.

use serde::Serialize;
use serde_json::{Map, Value};

use compgraph_core::ComponentType;

use crate::extract::definition_body;

const TASK_API_FIELDS: &[&str] = &[
    "type",
    "parameters",
    "inputs",
    "output",
    "outputs",
    "outputSchema",
];
const CONFIG_FIELDS: &[&str] = &["timeout", "features", "extensions", "functions", "config"];
const FUNCTION_CONFIG_FIELDS: &[&str] = &["task", "scope"];
const EXTENSION_CONFIG_FIELDS: &[&str] = &["task", "scope", "type"];

/// Both digests of one component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentHashes {
    pub api_hash: Option<String>,
    pub config_hash: Option<String>,
}

/// Hashes a component's API signature and config in one pass.
pub fn hash_component(component_type: ComponentType, definition: &Value) -> ContentHashes {
    ContentHashes {
        api_hash: hash_api_signature(component_type, definition),
        config_hash: hash_config(component_type, definition),
    }
}

/// Digest of [`api_signature`], or `None` for types without one.
pub fn hash_api_signature(component_type: ComponentType, definition: &Value) -> Option<String> {
    api_signature(component_type, definition).map(|sig| stable_hash(&sig))
}

/// Digest of [`config_signature`], or `None` when there is no config.
pub fn hash_config(component_type: ComponentType, definition: &Value) -> Option<String> {
    config_signature(component_type, definition).map(|sig| stable_hash(&sig))
}

/// Extracts the caller-facing shape of a definition.
///
/// Functions and extensions have no API signature and return `None`.
pub fn api_signature(component_type: ComponentType, definition: &Value) -> Option<Value> {
    let body = definition_body(definition);
    match component_type {
        ComponentType::Workflow => Some(workflow_signature(body)),
        ComponentType::Task => Some(Value::Object(pick(body, TASK_API_FIELDS))),
        ComponentType::Schema => Some(Value::Object(pick(body, &["schema"]))),
        ComponentType::View => {
            let mut sig = pick(body, &["type"]);
            if let Some(content) = body.get("content").or_else(|| body.get("view")) {
                sig.insert("content".to_string(), content.clone());
            }
            Some(Value::Object(sig))
        }
        ComponentType::Function | ComponentType::Extension => None,
    }
}

fn workflow_signature(body: &Value) -> Value {
    let mut states: Vec<Value> = array(body, "states")
        .iter()
        .map(|state| {
            let mut sig = pick(state, &["key", "stateType"]);
            let mut transitions: Vec<Value> = array(state, "transitions")
                .iter()
                .map(|t| Value::Object(pick(t, &["key", "target", "triggerType"])))
                .collect();
            sort_canonical(&mut transitions);
            sig.insert("transitions".to_string(), Value::Array(transitions));
            Value::Object(sig)
        })
        .collect();
    sort_canonical(&mut states);

    let mut sig = Map::new();
    sig.insert("states".to_string(), Value::Array(states));
    if let Some(start) = body.get("startTransition") {
        sig.insert(
            "startTransition".to_string(),
            Value::Object(pick(start, &["key", "target"])),
        );
    }
    Value::Object(sig)
}

/// Extracts behavior-only settings of a definition.
///
/// Returns `None` when the definition carries none of them.
pub fn config_signature(component_type: ComponentType, definition: &Value) -> Option<Value> {
    let body = definition_body(definition);
    let mut sig = pick(body, CONFIG_FIELDS);
    let extra: &[&str] = match component_type {
        ComponentType::Function => FUNCTION_CONFIG_FIELDS,
        ComponentType::Extension => EXTENSION_CONFIG_FIELDS,
        _ => &[],
    };
    sig.extend(pick(body, extra));

    if sig.is_empty() {
        None
    } else {
        Some(Value::Object(sig))
    }
}

fn pick(value: &Value, fields: &[&str]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|f| value.get(*f).map(|v| (f.to_string(), v.clone())))
        .collect()
}

fn array<'a>(value: &'a Value, field: &str) -> &'a [Value] {
    value
        .get(field)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn sort_canonical(items: &mut [Value]) {
    items.sort_by_cached_key(canonical_json);
}

/// Serializes `value` as compact JSON with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// blake3 digest of the canonical form of `value`, as lowercase hex.
pub fn stable_hash(value: &Value) -> String {
    blake3::hash(canonical_json(value).as_bytes())
        .to_hex()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn workflow(label: &str, timeout: u64) -> Value {
        json!({
            "key": "onboarding",
            "attributes": {
                "labels": [{ "label": label, "language": "en-US" }],
                "timeout": { "duration": timeout },
                "startTransition": { "key": "start", "target": "collect", "labels": [] },
                "states": [
                    {
                        "key": "collect",
                        "stateType": 1,
                        "labels": [{ "label": label }],
                        "transitions": [
                            { "key": "submit", "target": "done", "triggerType": 0, "labels": [] }
                        ]
                    },
                    { "key": "done", "stateType": 3, "transitions": [] }
                ]
            }
        })
    }

    #[test]
    fn canonical_json_sorts_keys_recursively() {
        let value = json!({ "b": { "z": 1, "a": [ { "y": true, "x": null } ] }, "a": "s" });
        assert_eq!(
            canonical_json(&value),
            r#"{"a":"s","b":{"a":[{"x":null,"y":true}],"z":1}}"#
        );
    }

    #[test]
    fn labels_do_not_affect_api_hash() {
        let a = hash_api_signature(ComponentType::Workflow, &workflow("Hello", 10));
        let b = hash_api_signature(ComponentType::Workflow, &workflow("Merhaba", 10));
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn timeout_is_config_not_api() {
        let a = workflow("Hello", 10);
        let b = workflow("Hello", 20);
        assert_eq!(
            hash_api_signature(ComponentType::Workflow, &a),
            hash_api_signature(ComponentType::Workflow, &b)
        );
        assert_ne!(
            hash_config(ComponentType::Workflow, &a),
            hash_config(ComponentType::Workflow, &b)
        );
    }

    #[test]
    fn transition_target_change_is_api_drift() {
        let a = workflow("Hello", 10);
        let mut b = a.clone();
        b["attributes"]["states"][0]["transitions"][0]["target"] = json!("collect");
        assert_ne!(
            hash_api_signature(ComponentType::Workflow, &a),
            hash_api_signature(ComponentType::Workflow, &b)
        );
    }

    #[test]
    fn state_order_does_not_matter() {
        let a = workflow("Hello", 10);
        let mut b = a.clone();
        b["attributes"]["states"]
            .as_array_mut()
            .unwrap()
            .reverse();
        assert_eq!(
            hash_api_signature(ComponentType::Workflow, &a),
            hash_api_signature(ComponentType::Workflow, &b)
        );
    }

    #[test]
    fn task_signature_uses_declared_shape() {
        let a = json!({ "attributes": { "type": "6", "parameters": ["to"], "config": { "url": "a" } } });
        let b = json!({ "attributes": { "type": "6", "parameters": ["to"], "config": { "url": "b" } } });
        assert_eq!(
            hash_api_signature(ComponentType::Task, &a),
            hash_api_signature(ComponentType::Task, &b)
        );
        assert_ne!(hash_config(ComponentType::Task, &a), hash_config(ComponentType::Task, &b));
    }

    #[test]
    fn schema_and_view_bodies() {
        let schema = json!({ "attributes": { "type": "workflow", "schema": { "type": "object" } } });
        let sig = api_signature(ComponentType::Schema, &schema).unwrap();
        assert_eq!(sig, json!({ "schema": { "type": "object" } }));

        let view = json!({ "attributes": { "type": "json", "content": "{}", "display": "full-page" } });
        let sig = api_signature(ComponentType::View, &view).unwrap();
        assert_eq!(sig, json!({ "type": "json", "content": "{}" }));
    }

    #[test]
    fn unrecognized_types_have_no_api_hash() {
        let function = json!({ "attributes": { "scope": "I", "task": { "key": "t" } } });
        assert_eq!(hash_api_signature(ComponentType::Function, &function), None);
        assert!(hash_config(ComponentType::Function, &function).is_some());
    }

    #[test]
    fn empty_config_yields_none() {
        let schema = json!({ "attributes": { "schema": {} } });
        assert_eq!(hash_config(ComponentType::Schema, &schema), None);
    }

    #[test]
    fn hash_is_hex_blake3() {
        let digest = stable_hash(&json!({}));
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, blake3::hash(b"{}").to_hex().to_string());
    }
}
