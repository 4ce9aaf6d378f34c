//! # Parent-Schema Resolution
//!
//! Diagnostic codes are attached where schema authors declare them,
//! usually on the object schema that declares the failing property rather
//! than on the leaf value schema. The resolver finds that object for a
//! document pointer, and [`lookup`] searches the places a code may live.

use rdapct_core::pointer;
use rdapct_schema::{ElementId, Failure, MetaValue, SchemaIndex};

use crate::error::ClassifyError;

/// Name of the nearest enclosing named schema for a document pointer, or
/// `None` for the document root.
///
/// Scans from the second-to-last segment towards the root, skipping array
/// indices. `#/entities/0/vcardArray` yields `entities`; `#/ldhName` and
/// `#/0/1` yield `None`.
pub fn parent_schema_name(document_pointer: &str) -> Option<String> {
    let segments = pointer::segments(document_pointer);
    if segments.len() < 2 {
        return None;
    }
    segments[1..segments.len() - 1]
        .iter()
        .rev()
        .find(|s| !pointer::is_index(s))
        .cloned()
}

/// Schema element named by [`parent_schema_name`], falling back to the
/// document root when there is no name or the name is not declared.
pub fn resolve_parent(index: &SchemaIndex, root: ElementId, document_pointer: &str) -> ElementId {
    parent_schema_name(document_pointer)
        .and_then(|name| index.find_by_name(root, &name))
        .unwrap_or_else(|| index.deref(root))
}

/// Find metadata for a failure.
///
/// Checks, in order: the violated element; the elements above it on the
/// schema trail while the edge reaching the current element is a container
/// edge (combinator branch, items, contains, reference); the resolved
/// parent.
pub fn lookup<'a>(
    index: &'a SchemaIndex,
    failure: &Failure,
    parent: ElementId,
    key: &str,
) -> Option<&'a MetaValue> {
    if let Some(value) = index.metadata(failure.violated(), key) {
        return Some(value);
    }
    let trail = failure.trail();
    let mut i = trail.len();
    while i > 1 && trail[i - 1].edge.is_container() {
        i -= 1;
        if let Some(value) = index.metadata(trail[i - 1].element, key) {
            return Some(value);
        }
    }
    index.metadata(parent, key)
}

/// [`lookup`] for an integer code. Absence is a schema defect.
pub fn lookup_code(
    index: &SchemaIndex,
    failure: &Failure,
    parent: ElementId,
    key: &str,
) -> Result<i32, ClassifyError> {
    lookup(index, failure, parent, key)
        .and_then(MetaValue::as_code)
        .ok_or_else(|| ClassifyError::MissingMetadata {
            key: key.to_string(),
            pointer: failure.pointer().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdapct_schema::{EdgeKind, TrailStep};
    use serde_json::json;

    #[test]
    fn test_parent_name_uses_second_to_last_segment() {
        assert_eq!(parent_schema_name("#/secureDNS/dsData").as_deref(), Some("secureDNS"));
        assert_eq!(parent_schema_name("#/a/b/c").as_deref(), Some("b"));
    }

    #[test]
    fn test_parent_name_skips_indices() {
        assert_eq!(parent_schema_name("#/entities/0/roles/1").as_deref(), Some("roles"));
        assert_eq!(parent_schema_name("#/entities/0/handle").as_deref(), Some("entities"));
        assert_eq!(parent_schema_name("#/entities/0/1").as_deref(), Some("entities"));
        assert_eq!(parent_schema_name("#/notices/0").as_deref(), Some("notices"));
    }

    #[test]
    fn test_parent_name_root() {
        assert_eq!(parent_schema_name("#"), None);
        assert_eq!(parent_schema_name("#/ldhName"), None);
        assert_eq!(parent_schema_name("#/0/1"), None);
    }

    #[test]
    fn test_parent_name_unescapes() {
        assert_eq!(parent_schema_name("#/a~1b/c").as_deref(), Some("a/b"));
    }

    fn index() -> SchemaIndex {
        SchemaIndex::from_document(
            "d.json",
            &json!({
                "type": "object",
                "properties": {
                    "secureDNS": {
                        "type": "object",
                        "properties": {"dsData": {"type": "array", "items": {"type": "string"}}},
                        "errorCode": -12000
                    }
                },
                "errorCode": -1
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_parent_finds_named_element() {
        let index = index();
        let root = index.root("d.json").unwrap();
        let parent = resolve_parent(&index, root, "#/secureDNS/dsData");
        assert_eq!(index.element(parent).name(), Some("secureDNS"));
        let parent = resolve_parent(&index, root, "#/secureDNS/dsData/0");
        assert_eq!(index.element(parent).name(), Some("dsData"));
        assert_eq!(resolve_parent(&index, root, "#/unknown/x"), root);
        assert_eq!(resolve_parent(&index, root, "#/ldhName"), root);
    }

    #[test]
    fn test_lookup_climbs_container_edges_only() {
        let index = index();
        let root = index.root("d.json").unwrap();
        let target = index.navigate(root, "/properties/secureDNS/properties/dsData/items/type");
        let failure = Failure::new("#/secureDNS/dsData/0", target.element, "expected type: String, found: Integer")
            .with_trail(target.trail.clone());
        // items -> dsData (no code), then the property edge stops the climb
        let secure_dns = index.find_by_name(root, "secureDNS").unwrap();
        assert_eq!(lookup_code(&index, &failure, secure_dns, "errorCode").unwrap(), -12000);
        assert_eq!(lookup_code(&index, &failure, root, "errorCode").unwrap(), -1);

        let ds_data = resolve_parent(&index, root, failure.pointer());
        assert!(lookup_code(&index, &failure, ds_data, "errorCode").is_err());
    }

    #[test]
    fn test_missing_metadata_is_an_error() {
        let index = index();
        let root = index.root("d.json").unwrap();
        let failure = Failure::new("#", root, "required key [x] not found").with_trail(vec![TrailStep {
            element: root,
            edge: EdgeKind::Root,
        }]);
        let err = lookup_code(&index, &failure, root, "xMissing").unwrap_err();
        assert!(matches!(err, ClassifyError::MissingMetadata { ref key, .. } if key == "xMissing"));
    }
}
