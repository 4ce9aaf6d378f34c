//! Document-level check: an `eventAction` may occur only once across all
//! `events` arrays of a response, and likewise across `asEventActor`
//! arrays. JSON Schema cannot express this, so it runs over the document
//! itself after schema classification.

use std::collections::HashSet;

use rdapct_core::pointer;
use rdapct_core::{DiagnosticRecord, QueryContext};
use serde_json::Value;

/// Arrays checked for repeated event actions, with their codes.
pub const EVENT_ARRAYS: [(&str, i32); 2] = [("events", -10912), ("asEventActor", -11310)];

const EVENT_ACTION: &str = "eventAction";

/// Records for every event whose action already occurred earlier in
/// document order in an array named `array_name`. Returns the pointer of
/// each repeated `eventAction` alongside its record.
pub fn duplicate_event_actions(
    document: &Value,
    array_name: &str,
    code: i32,
    query: Option<&QueryContext>,
) -> Vec<(String, DiagnosticRecord)> {
    let mut events = Vec::new();
    collect_events(document, pointer::ROOT, array_name, &mut events);

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (event_pointer, action) in events {
        if seen.insert(action.clone()) {
            continue;
        }
        let action_pointer = pointer::join(&event_pointer, EVENT_ACTION);
        let record = DiagnosticRecord::builder()
            .code(code)
            .value(format!("{action_pointer}:{action}"))
            .message("An eventAction value exists more than once within the events array.")
            .context(query.cloned())
            .build();
        out.push((action_pointer, record));
    }
    out
}

/// Depth-first walk collecting `(event pointer, action)` for objects with
/// a string `eventAction` inside arrays named `array_name`.
fn collect_events(value: &Value, at: &str, array_name: &str, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_pointer = pointer::join(at, key);
                if key == array_name {
                    if let Value::Array(items) = child {
                        for (i, item) in items.iter().enumerate() {
                            if let Some(action) = item.get(EVENT_ACTION).and_then(Value::as_str) {
                                out.push((pointer::join(&child_pointer, &i.to_string()), action.to_string()));
                            }
                        }
                    }
                }
                collect_events(child, &child_pointer, array_name, out);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_events(item, &pointer::join(at, &i.to_string()), array_name, out);
            }
        }
        _ => {}
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        #[test]
        fn repeats_equal_length_minus_distinct(actions in proptest::collection::vec("[a-c]", 0..12)) {
            let events: Vec<Value> = actions.iter().map(|a| json!({"eventAction": a})).collect();
            let doc = json!({"events": events});
            let found = duplicate_event_actions(&doc, "events", -10912, None);
            let distinct: HashSet<&String> = actions.iter().collect();
            prop_assert_eq!(found.len(), actions.len() - distinct.len());
        }
    }
}
