//! Rules about scalar values: types, numbers, enumerations, constants and
//! patterns.

use rdapct_core::pointer;
use rdapct_core::DiagnosticRecord;
use rdapct_schema::formats::ip;
use rdapct_schema::SchemaKind;
use serde_json::Value;

use super::format::IPV4_SYNTAX_CODE;
use super::structure::structure_invalid;
use super::{capture, RuleContext, BASIC_TYPE, ENUM_MISMATCH, PATTERN_MISMATCH};
use crate::error::ClassifyError;

const IPV4_SYNTAX_MESSAGE: &str = "The IPv4 address is not syntactically valid in dot-decimal notation.";

pub(super) fn basic_type_matches(cx: &RuleContext<'_>) -> bool {
    BASIC_TYPE.is_match(cx.failure.detail())
        && matches!(
            cx.violated().kind(),
            SchemaKind::String { .. } | SchemaKind::Boolean | SchemaKind::Null | SchemaKind::Array { .. }
        )
}

pub(super) fn basic_type(cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
    if cx.violated().is_array() {
        return structure_invalid(cx).map(|r| vec![r]);
    }
    let expected = capture(&BASIC_TYPE, cx, 1).unwrap_or_default().to_lowercase();
    Ok(vec![cx.record(
        cx.code("errorCode")?,
        cx.pointer_value(),
        cx.message_or(format!("The JSON value is not a {expected}.")),
    )])
}

pub(super) fn number_matches(cx: &RuleContext<'_>) -> bool {
    matches!(cx.violated().kind(), SchemaKind::Number { .. })
}

pub(super) fn number(cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
    let SchemaKind::Number {
        integer,
        minimum,
        maximum,
    } = cx.violated().kind()
    else {
        return Ok(Vec::new());
    };
    let kind = if *integer { "integer" } else { "number" };
    let message = match (minimum, maximum) {
        (Some(min), Some(max)) => format!(
            "The JSON value is not a {kind} between {} and {}.",
            render_bound(*min),
            render_bound(*max)
        ),
        _ => format!("The JSON value is not a {kind}."),
    };
    Ok(vec![cx.record(cx.code("errorCode")?, cx.pointer_value(), message)])
}

/// Whole bounds without a fractional part.
fn render_bound(bound: f64) -> String {
    if bound.fract() == 0.0 && bound.abs() < 1e15 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}

pub(super) fn enum_matches(cx: &RuleContext<'_>) -> bool {
    matches!(cx.violated().kind(), SchemaKind::Enum(_)) && ENUM_MISMATCH.is_match(cx.failure.detail())
}

pub(super) fn enumeration(cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
    let violated = cx.violated();
    let SchemaKind::Enum(values) = violated.kind() else {
        return Ok(Vec::new());
    };
    let location = cx
        .failure
        .schema_location()
        .map(str::to_string)
        .unwrap_or_else(|| violated.location());
    let catalog = cx.datasets.catalog_label(&location).unwrap_or(location);
    let permitted: Vec<String> = values.iter().map(pointer::render).collect();
    Ok(vec![cx.record(
        cx.code("errorCode")?,
        cx.pointer_value(),
        format!(
            "The JSON string is not included as a Value with Type=\"{catalog}\" dataset ([{}]).",
            permitted.join(", ")
        ),
    )])
}

pub(super) fn const_matches(cx: &RuleContext<'_>) -> bool {
    matches!(cx.violated().kind(), SchemaKind::Const(_))
}

pub(super) fn constant(cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
    let SchemaKind::Const(expected) = cx.violated().kind() else {
        return Ok(Vec::new());
    };
    Ok(vec![cx.record(
        cx.code("errorCode")?,
        cx.pointer_value(),
        format!("The JSON value is not {}.", pointer::render(expected)),
    )])
}

/// The constant an array's `contains` schema requires, if it is one.
fn contained_const<'a>(cx: &RuleContext<'a>) -> Option<&'a Value> {
    let SchemaKind::Array {
        contains: Some(contains),
        ..
    } = cx.violated().kind()
    else {
        return None;
    };
    match cx.index.element(cx.index.deref(*contains)).kind() {
        SchemaKind::Const(value) => Some(value),
        _ => None,
    }
}

pub(super) fn contains_const_matches(cx: &RuleContext<'_>) -> bool {
    cx.failure.keyword() == Some("contains") && contained_const(cx).is_some()
}

pub(super) fn contains_const(cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
    let Some(expected) = contained_const(cx) else {
        return Ok(Vec::new());
    };
    Ok(vec![cx.record(
        cx.code("errorCode")?,
        cx.pointer_value(),
        format!("The JSON array does not include {}.", pointer::render(expected)),
    )])
}

/// Whether a pattern failure is really a malformed IPv4 address: the
/// declared pattern is the dot-decimal pattern and the value is non-blank.
///
/// The element's own `errorCode` is not consulted. Any element carrying the
/// dot-decimal pattern is reinterpreted, not only the nameserver `v4` items
/// coded -11406.
pub fn ipv4_reinterpretation_applies(pattern: Option<&str>, subject: &str) -> bool {
    pattern == Some(ip::IPV4_DOT_DECIMAL_PATTERN) && ip::looks_like_ip_attempt(subject)
}

fn pattern_failure(cx: &RuleContext<'_>) -> bool {
    matches!(cx.violated().kind(), SchemaKind::String { pattern: Some(_), .. })
        && PATTERN_MISMATCH.is_match(cx.failure.detail())
}

pub(super) fn pattern_matches(cx: &RuleContext<'_>) -> bool {
    pattern_failure(cx) && !ipv4_reinterpretation_applies(cx.violated().pattern(), &cx.rendered_value())
}

pub(super) fn pattern(cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
    let location = cx
        .failure
        .schema_location()
        .map(str::to_string)
        .unwrap_or_else(|| cx.violated().location());
    Ok(vec![cx.record(
        cx.code("errorCode")?,
        cx.pointer_value(),
        format!(
            "The value of the JSON string data in the {} does not conform to {location} syntax.",
            cx.failure.pointer()
        ),
    )])
}

pub(super) fn ipv4_pattern_matches(cx: &RuleContext<'_>) -> bool {
    pattern_failure(cx) && ipv4_reinterpretation_applies(cx.violated().pattern(), &cx.rendered_value())
}

pub(super) fn ipv4_pattern(cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
    let subject = cx.rendered_value();
    // A value that fails the dot-decimal pattern but passes strict syntax
    // cannot occur with the shipped pattern; keep the declared code then.
    let code = if ip::is_valid_ipv4_syntax(&subject) {
        cx.code("errorCode")?
    } else {
        IPV4_SYNTAX_CODE
    };
    Ok(vec![cx.record(code, cx.pointer_value(), IPV4_SYNTAX_MESSAGE)])
}
