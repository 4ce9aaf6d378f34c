//! # Load-Time Metadata Audit
//!
//! Rules fail hard when a schema lacks the metadata they need. The audit
//! walks an index once, before any document is classified, and lists every
//! metadata key a rule could request for an element but that neither the
//! element, its container ancestors (references, array items, combinator
//! branches) nor the object declaring it provide.
//!
//! The audit is conservative with respect to the parent-schema fallback:
//! a gap it reports may still be covered at classification time by a
//! named ancestor further up the document.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use rdapct_schema::formats::names;
use rdapct_schema::{ElementId, SchemaIndex, SchemaKind};
use serde::Serialize;

/// A metadata key a rule may request but no schema element provides.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MetadataGap {
    /// `<document>#<pointer>` of the element.
    pub location: String,
    pub key: String,
}

impl fmt::Display for MetadataGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: missing '{}'", self.location, self.key)
    }
}

/// Every gap in `index`, sorted by location then key.
pub fn audit(index: &SchemaIndex) -> Vec<MetadataGap> {
    let owners = owners(index);
    let mut gaps = BTreeSet::new();

    for element in index.iter() {
        for key in requested_keys(index, element.id()) {
            if !provided(index, &owners, element.id(), &key) {
                gaps.insert(MetadataGap {
                    location: element.location(),
                    key,
                });
            }
        }
    }
    gaps.into_iter().collect()
}

/// Keys rules may look up for failures violating `id`.
fn requested_keys(index: &SchemaIndex, id: ElementId) -> Vec<String> {
    let element = index.element(id);
    let mut keys = Vec::new();
    match element.kind() {
        SchemaKind::Object {
            required,
            dependencies,
            additional_properties,
            ..
        } => {
            keys.push("structureInvalid".to_string());
            keys.extend(required.iter().map(|p| format!("{p}Missing")));
            keys.extend(dependencies.values().flatten().map(|p| format!("{p}Missing")));
            if !additional_properties {
                keys.push("unknownKeys".to_string());
            }
        }
        SchemaKind::Array {
            contains, unique_items, ..
        } => {
            keys.push("structureInvalid".to_string());
            if *unique_items {
                keys.push("duplicateItemsErrorCode".to_string());
            }
            let const_contains = contains
                .map(|c| matches!(index.element(index.deref(c)).kind(), SchemaKind::Const(_)))
                .unwrap_or(false);
            if const_contains {
                keys.push("errorCode".to_string());
            }
        }
        SchemaKind::String { format, .. } => {
            keys.push("errorCode".to_string());
            if format.as_deref() == Some(names::IDN_HOSTNAME) {
                keys.extend(["labelTooLong", "domainTooLong", "lessThanTwoLabels"].map(str::to_string));
            }
        }
        SchemaKind::Number { .. }
        | SchemaKind::Boolean
        | SchemaKind::Null
        | SchemaKind::Const(_)
        | SchemaKind::Enum(_) => keys.push("errorCode".to_string()),
        SchemaKind::Combinator { .. } | SchemaKind::Reference { .. } | SchemaKind::Any => {}
    }
    if let Some(group) = element.metadata("validationName").and_then(|v| v.as_text()) {
        keys.push(group.to_string());
    }
    keys
}

/// For each element, the elements that wrap it (container edges) or
/// declare it as a property.
fn owners(index: &SchemaIndex) -> HashMap<ElementId, Vec<ElementId>> {
    let mut owners: HashMap<ElementId, Vec<ElementId>> = HashMap::new();
    for element in index.iter() {
        let wrapped: Vec<ElementId> = match element.kind() {
            SchemaKind::Object { properties, .. } => properties.values().copied().collect(),
            SchemaKind::Array { items, contains, .. } => items.iter().chain(contains.iter()).copied().collect(),
            SchemaKind::Combinator { branches, .. } => branches.clone(),
            SchemaKind::Reference {
                resolved: Some(target), ..
            } => vec![*target],
            _ => Vec::new(),
        };
        for child in wrapped {
            owners.entry(child).or_default().push(element.id());
        }
    }
    owners
}

fn provided(index: &SchemaIndex, owners: &HashMap<ElementId, Vec<ElementId>>, id: ElementId, key: &str) -> bool {
    let mut stack = vec![id];
    let mut seen = BTreeSet::new();
    while let Some(current) = stack.pop() {
        if !seen.insert(current.index()) {
            continue;
        }
        if index.element(current).has_metadata(key) {
            return true;
        }
        if let Some(up) = owners.get(&current) {
            stack.extend(up.iter().copied());
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complete_schema_has_no_gaps() {
        let index = SchemaIndex::from_document(
            "d.json",
            &json!({
                "type": "object",
                "properties": {
                    "ldhName": {"type": "string", "errorCode": -46101}
                },
                "required": ["ldhName"],
                "additionalProperties": false,
                "ldhNameMissing": -46100,
                "unknownKeys": -46102,
                "structureInvalid": -46103
            }),
        )
        .unwrap();
        assert!(audit(&index).is_empty());
    }

    #[test]
    fn test_missing_keys_are_reported() {
        let index = SchemaIndex::from_document(
            "d.json",
            &json!({
                "type": "object",
                "properties": {
                    "ldhName": {"type": "string"},
                    "dsData": {"type": "array", "uniqueItems": true, "items": {"type": "string"}}
                },
                "required": ["ldhName"],
                "structureInvalid": -1,
                "errorCode": -2
            }),
        )
        .unwrap();
        let gaps = audit(&index);
        let keys: Vec<&str> = gaps.iter().map(|g| g.key.as_str()).collect();
        assert!(keys.contains(&"ldhNameMissing"));
        assert!(keys.contains(&"duplicateItemsErrorCode"));
        assert!(!keys.contains(&"errorCode"));
        assert!(!keys.contains(&"unknownKeys"));
    }

    #[test]
    fn test_container_ancestors_provide_keys() {
        let index = SchemaIndex::from_document(
            "d.json",
            &json!({
                "definitions": {
                    "handle": {"type": "string"}
                },
                "type": "object",
                "properties": {
                    "handles": {
                        "type": "array",
                        "items": {"$ref": "#/definitions/handle"},
                        "errorCode": -5,
                        "structureInvalid": -6
                    }
                },
                "structureInvalid": -7
            }),
        )
        .unwrap();
        assert!(audit(&index).is_empty());
    }

    #[test]
    fn test_gap_display() {
        let gap = MetadataGap {
            location: "d.json#/properties/x".to_string(),
            key: "errorCode".to_string(),
        };
        assert_eq!(gap.to_string(), "d.json#/properties/x: missing 'errorCode'");
    }
}
