//! Rules about the shape of objects and arrays.

use rdapct_core::pointer;
use rdapct_core::DiagnosticRecord;
use rdapct_schema::SchemaKind;

use super::{capture, RuleContext, BASIC_TYPE, DEPENDENT_KEY, REQUIRED_KEY, UNKNOWN_KEY};
use crate::error::ClassifyError;

/// Code for any failure below a `vcardArray`.
pub const VCARD_SYNTAX_CODE: i32 = -12305;

const VCARD_ARRAY: &str = "vcardArray";

pub(super) fn unknown_key_matches(cx: &RuleContext<'_>) -> bool {
    UNKNOWN_KEY.is_match(cx.failure.detail())
}

pub(super) fn unknown_key(cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
    let Some(key) = capture(&UNKNOWN_KEY, cx, 1) else {
        return Ok(Vec::new());
    };
    let key_pointer = pointer::join(cx.failure.pointer(), &key);
    let value = format!("{key_pointer}:{}", pointer::render_at(cx.document, &key_pointer));
    let permitted = cx.violated().property_names().join(", ");
    Ok(vec![cx.record(
        cx.code("unknownKeys")?,
        value,
        format!("The name in the name/value pair is not of: {permitted}."),
    )])
}

pub(super) fn structural_leaf_matches(cx: &RuleContext<'_>) -> bool {
    match cx.violated().kind() {
        SchemaKind::Object { .. } => BASIC_TYPE.is_match(cx.failure.detail()),
        SchemaKind::Combinator { .. } => cx.failure.is_leaf(),
        _ => false,
    }
}

/// The generic "structure not syntactically valid" record.
pub(super) fn structure_invalid(cx: &RuleContext<'_>) -> Result<DiagnosticRecord, ClassifyError> {
    Ok(cx.record(
        cx.code("structureInvalid")?,
        cx.pointer_value(),
        format!("The {} structure is not syntactically valid.", cx.failure.pointer()),
    ))
}

pub(super) fn missing_key_matches(cx: &RuleContext<'_>) -> bool {
    REQUIRED_KEY.is_match(cx.failure.detail())
}

pub(super) fn missing_key(cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
    let Some(key) = capture(&REQUIRED_KEY, cx, 1) else {
        return Ok(Vec::new());
    };
    Ok(vec![cx.record(
        cx.code(&format!("{key}Missing"))?,
        cx.rendered_value(),
        format!("The {key} element does not exist."),
    )])
}

pub(super) fn dependencies_matches(cx: &RuleContext<'_>) -> bool {
    cx.failure.keyword() == Some("dependencies")
        && cx.violated().is_object()
        && DEPENDENT_KEY.is_match(cx.failure.detail())
}

pub(super) fn dependencies(cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
    let Some(key) = capture(&DEPENDENT_KEY, cx, 1) else {
        return Ok(Vec::new());
    };
    let governing = match cx.violated().kind() {
        SchemaKind::Object { dependencies, .. } => dependencies
            .iter()
            .filter(|(_, required)| required.contains(&key))
            .map(|(property, _)| property.as_str())
            .last(),
        _ => None,
    }
    .unwrap_or("parent");
    Ok(vec![cx.record(
        cx.code(&format!("{key}Missing"))?,
        cx.rendered_value(),
        format!("A {governing} structure was found but an {key} was not."),
    )])
}

pub(super) fn unique_items_matches(cx: &RuleContext<'_>) -> bool {
    cx.failure.keyword() == Some("uniqueItems")
}

pub(super) fn unique_items(cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
    Ok(vec![cx.record(
        cx.code("duplicateItemsErrorCode")?,
        cx.pointer_value(),
        format!("A {} value appeared more than once.", cx.failure.pointer()),
    )])
}

pub(super) fn vcard_matches(cx: &RuleContext<'_>) -> bool {
    pointer::segments(cx.failure.pointer()).iter().any(|s| s == VCARD_ARRAY)
}

pub(super) fn vcard(cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
    let entry = vcard_entry_pointer(cx.failure.pointer());
    Ok(vec![cx.record(
        VCARD_SYNTAX_CODE,
        pointer::pointer_value(cx.document, &entry),
        "The value for the JSON name value is not a syntactically valid vcardArray.",
    )])
}

/// Truncate a pointer below `vcardArray` to the vcard property entry,
/// `…/vcardArray/1/<n>`.
pub(crate) fn vcard_entry_pointer(failure_pointer: &str) -> String {
    let segments = pointer::segments(failure_pointer);
    let Some(at) = segments.iter().position(|s| s == VCARD_ARRAY) else {
        return failure_pointer.to_string();
    };
    let end = (at + 3).min(segments.len());
    segments[1..end]
        .iter()
        .fold(pointer::ROOT.to_string(), |acc, segment| pointer::join(&acc, segment))
}
