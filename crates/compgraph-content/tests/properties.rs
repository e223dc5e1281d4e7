//! Property tests for hashing and extraction.

use proptest::prelude::*;
use serde_json::{json, Value};

use compgraph_content::{
    extract_references, hash_api_signature, hash_config, RefDefaults,
};
use compgraph_core::ComponentType;

/// Renders `pairs` as JSON object text in the given member order.
fn object_text(pairs: &[(String, i64)], reverse: bool) -> String {
    let mut members: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{}:{}", json!(k), v))
        .collect();
    if reverse {
        members.reverse();
    }
    format!("{{{}}}", members.join(","))
}

fn task_text(parameters: &str, config: &str) -> Value {
    let text = format!(
        r#"{{"key":"send-email","attributes":{{"type":"6","parameters":{},"config":{}}}}}"#,
        parameters, config
    );
    serde_json::from_str(&text).unwrap()
}

/// Each inner vec holds the target state indices of one state's transitions.
fn states_and_order() -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<usize>)> {
    prop::collection::vec(prop::collection::vec(0usize..6, 1..4), 1..6).prop_flat_map(|states| {
        let order: Vec<usize> = (0..states.len()).collect();
        (Just(states), Just(order).prop_shuffle())
    })
}

fn workflow(states: &[Vec<usize>], order: &[usize], reverse_transitions: bool) -> Value {
    let states: Vec<Value> = order
        .iter()
        .map(|&i| {
            let mut transitions: Vec<Value> = states[i]
                .iter()
                .enumerate()
                .map(|(n, target)| {
                    json!({ "key": format!("t{n}"), "target": format!("s{target}"), "triggerType": 0 })
                })
                .collect();
            if reverse_transitions {
                transitions.reverse();
            }
            json!({ "key": format!("s{i}"), "stateType": 1, "transitions": transitions })
        })
        .collect();
    json!({
        "key": "onboarding",
        "attributes": {
            "states": states,
            "startTransition": { "key": "start", "target": "s0" }
        }
    })
}

proptest! {
    #[test]
    fn workflow_hash_ignores_state_and_transition_order((states, order) in states_and_order()) {
        let natural: Vec<usize> = (0..states.len()).collect();
        let a = workflow(&states, &natural, false);
        let b = workflow(&states, &order, true);

        let hash_a = hash_api_signature(ComponentType::Workflow, &a);
        prop_assert!(hash_a.is_some());
        prop_assert_eq!(&hash_a, &hash_api_signature(ComponentType::Workflow, &b));

        let mut retargeted = b.clone();
        retargeted["attributes"]["states"][0]["transitions"][0]["target"] = json!("elsewhere");
        prop_assert_ne!(&hash_a, &hash_api_signature(ComponentType::Workflow, &retargeted));
    }

    #[test]
    fn task_hashes_ignore_member_order_in_source_text(
        pairs in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..12)
    ) {
        let pairs: Vec<(String, i64)> = pairs.into_iter().collect();
        let a = task_text(&object_text(&pairs, false), &object_text(&pairs, false));
        let b = task_text(&object_text(&pairs, true), &object_text(&pairs, true));

        prop_assert_eq!(
            hash_api_signature(ComponentType::Task, &a),
            hash_api_signature(ComponentType::Task, &b)
        );
        prop_assert_eq!(
            hash_config(ComponentType::Task, &a),
            hash_config(ComponentType::Task, &b)
        );
    }

    #[test]
    fn extraction_is_pure(keys in prop::collection::vec("[a-z][a-z0-9-]{0,10}", 1..8)) {
        let tasks: Vec<Value> = keys
            .iter()
            .map(|k| json!({ "task": { "ref": format!("Tasks/{k}.json") } }))
            .collect();
        let definition = json!({ "attributes": { "states": [{ "onEntries": tasks }] } });
        let defaults = RefDefaults::default();

        let first = extract_references(&definition, &defaults);
        let second = extract_references(&definition, &defaults);
        prop_assert_eq!(&first, &second);

        let mut distinct = keys.clone();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(first.refs.len(), distinct.len());
        prop_assert!(first.refs.iter().all(|r| r.component_type == ComponentType::Task));
    }
}
