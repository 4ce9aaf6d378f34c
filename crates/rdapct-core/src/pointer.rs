//! # JSON Pointers
//!
//! Pointers in this workspace are RFC 6901 pointers prefixed with the
//! document-root marker `#`, e.g. `#/entities/0/vcardArray/1`. The root
//! itself is `#`.
//!
//! Functions here split pointers into unescaped segments, query values in
//! a document, and render queried values the way diagnostics expect them:
//! strings raw, everything else as compact JSON.

use serde_json::Value;

/// Marker for the document root.
pub const ROOT: &str = "#";

/// Normalise a pointer to the `#`-prefixed form.
///
/// Accepts `""`, `"/a/b"`, `"#"` and `"#/a/b"`.
pub fn normalize(pointer: &str) -> String {
    if pointer.is_empty() || pointer == ROOT {
        ROOT.to_string()
    } else if let Some(rest) = pointer.strip_prefix(ROOT) {
        format!("{ROOT}{rest}")
    } else if pointer.starts_with('/') {
        format!("{ROOT}{pointer}")
    } else {
        format!("{ROOT}/{pointer}")
    }
}

/// The RFC 6901 part of a pointer, without the leading `#`.
pub fn to_rfc6901(pointer: &str) -> &str {
    pointer.strip_prefix(ROOT).unwrap_or(pointer)
}

/// Undo RFC 6901 escaping of a single segment.
pub fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Escape a single segment for inclusion in a pointer.
pub fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// All segments of a pointer, including the leading `#`, unescaped.
///
/// `#/a/0/b` yields `["#", "a", "0", "b"]`.
pub fn segments(pointer: &str) -> Vec<String> {
    let normalized = normalize(pointer);
    normalized.split('/').map(unescape).collect()
}

/// Append a segment to a pointer.
pub fn join(pointer: &str, segment: &str) -> String {
    let base = normalize(pointer);
    format!("{base}/{}", escape(segment))
}

/// Whether a segment is an array index: a non-negative base-10 integer.
pub fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Look up the value a pointer designates.
pub fn query<'a>(document: &'a Value, pointer: &str) -> Option<&'a Value> {
    document.pointer(to_rfc6901(&normalize(pointer)))
}

/// Render a value for use inside a diagnostic value or message.
///
/// Strings are rendered without quotes; other values as compact JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render the value at `pointer`, or `null` when the pointer is dangling.
pub fn render_at(document: &Value, pointer: &str) -> String {
    query(document, pointer).map(render).unwrap_or_else(|| "null".to_string())
}

/// `"<pointer>:<rendered value>"`, the usual diagnostic value.
pub fn pointer_value(document: &Value, pointer: &str) -> String {
    format!("{pointer}:{}", render_at(document, pointer))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalize_is_idempotent(p in "[#/a-z0-9~]{0,24}") {
            let once = normalize(&p);
            prop_assert_eq!(normalize(&once), once.clone());
            prop_assert!(once.starts_with('#'));
        }

        #[test]
        fn join_then_segments_recovers_name(name in "[a-zA-Z0-9_~/]{1,12}") {
            let p = join("#/entities/0", &name);
            let segs = segments(&p);
            prop_assert_eq!(segs.last().cloned(), Some(name));
            prop_assert_eq!(segs.len(), 4);
        }
    }
}
