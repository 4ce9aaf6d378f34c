//! # Classification Rules
//!
//! Each [`Rule`] pairs a predicate over one leaf [`Failure`] with a
//! production that emits zero or more [`DiagnosticRecord`]s. Rules are
//! evaluated in the fixed order of [`Rule::standard`] and never observe
//! each other: a leaf that satisfies several predicates produces the
//! records of every one of them.
//!
//! Rules that must not fire together (the generic pattern rule and the
//! IPv4 reinterpretation) share a pure predicate instead of relying on
//! evaluation order.
//!
//! ## Metadata
//!
//! The code a rule emits comes from schema metadata, looked up through
//! [`RuleContext::code`]. A missing key aborts classification with
//! [`ClassifyError::MissingMetadata`].

mod format;
mod structure;
mod value;

use std::sync::LazyLock;

use rdapct_core::dataset::DatasetService;
use rdapct_core::pointer;
use rdapct_core::{DiagnosticRecord, QueryContext};
use rdapct_schema::{ElementId, Failure, SchemaElement, SchemaIndex};
use regex::Regex;
use serde_json::Value;

use crate::error::ClassifyError;
use crate::resolver;

pub use format::FormatTarget;
pub use value::ipv4_reinterpretation_applies;

pub(crate) static UNKNOWN_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"extraneous key \[(.+)\] is not permitted").expect("static regex"));
pub(crate) static BASIC_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"expected type: (.+), found: (.+)").expect("static regex"));
pub(crate) static REQUIRED_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"required key \[(.+)\] not found").expect("static regex"));
pub(crate) static DEPENDENT_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"property \[(.+)\] is required").expect("static regex"));
pub(crate) static PATTERN_MISMATCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"string \[(.*)\] does not match pattern (.+)").expect("static regex"));
pub(crate) static ENUM_MISMATCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.+) is not a valid enum value").expect("static regex"));

/// Everything a rule may consult while classifying one leaf.
pub struct RuleContext<'a> {
    pub index: &'a SchemaIndex,
    /// Root schema of the validated document.
    pub root: ElementId,
    pub failure: &'a Failure,
    /// Resolved parent schema of the failure.
    pub parent: ElementId,
    pub document: &'a Value,
    pub datasets: &'a dyn DatasetService,
    pub query: Option<&'a QueryContext>,
}

impl<'a> RuleContext<'a> {
    /// Context for `failure`, resolving its parent schema.
    pub fn new(
        index: &'a SchemaIndex,
        root: ElementId,
        failure: &'a Failure,
        document: &'a Value,
        datasets: &'a dyn DatasetService,
        query: Option<&'a QueryContext>,
    ) -> Self {
        let parent = resolver::resolve_parent(index, root, failure.pointer());
        Self {
            index,
            root,
            failure,
            parent,
            document,
            datasets,
            query,
        }
    }

    pub fn violated(&self) -> &'a SchemaElement {
        self.index.element(self.failure.violated())
    }

    /// Integer code stored under `key`.
    pub fn code(&self, key: &str) -> Result<i32, ClassifyError> {
        resolver::lookup_code(self.index, self.failure, self.parent, key)
    }

    /// Text metadata stored under `key`, if any.
    pub fn text(&self, key: &str) -> Option<&'a str> {
        resolver::lookup(self.index, self.failure, self.parent, key).and_then(|v| v.as_text())
    }

    /// The `errorMsg` override, or `default`.
    pub fn message_or(&self, default: String) -> String {
        self.text("errorMsg").map(str::to_string).unwrap_or(default)
    }

    /// `"<pointer>:<value>"` for the failure.
    pub fn pointer_value(&self) -> String {
        pointer::pointer_value(self.document, self.failure.pointer())
    }

    /// The offending value rendered on its own.
    pub fn rendered_value(&self) -> String {
        pointer::render_at(self.document, self.failure.pointer())
    }

    pub fn record(&self, code: i32, value: impl Into<String>, message: impl Into<String>) -> DiagnosticRecord {
        DiagnosticRecord::builder()
            .code(code)
            .value(value)
            .message(message)
            .context(self.query.cloned())
            .build()
    }
}

/// One classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// `extraneous key [k] is not permitted`.
    UnknownKey,
    /// Type mismatch on a string, boolean, null or array schema.
    BasicType,
    /// Any failure of a number schema.
    Number,
    /// Type mismatch on an object schema, or a childless combinator failure.
    StructuralLeaf,
    /// Value outside an enumeration.
    Enum,
    /// `required key [k] not found`.
    MissingKey,
    /// Value differs from a `const`.
    Const,
    /// Array lacks an element equal to its `contains` constant.
    ContainsConst,
    /// `dependencies` violation.
    Dependencies,
    /// Generic pattern mismatch.
    Pattern,
    /// Dot-decimal pattern mismatch reinterpreted as an IPv4 syntax error.
    Ipv4Pattern,
    Format(FormatTarget),
    UniqueItems,
    /// Any failure inside a `vcardArray`.
    VcardArray,
}

impl Rule {
    /// The full rule list in evaluation order.
    pub fn standard() -> Vec<Rule> {
        let mut rules = vec![
            Rule::UnknownKey,
            Rule::BasicType,
            Rule::Number,
            Rule::StructuralLeaf,
            Rule::Enum,
            Rule::MissingKey,
            Rule::Const,
            Rule::ContainsConst,
            Rule::Dependencies,
            Rule::Pattern,
            Rule::Ipv4Pattern,
        ];
        rules.extend(FormatTarget::ALL.iter().copied().map(Rule::Format));
        rules.push(Rule::UniqueItems);
        rules.push(Rule::VcardArray);
        rules
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Rule::UnknownKey => "unknown-key",
            Rule::BasicType => "basic-type",
            Rule::Number => "number",
            Rule::StructuralLeaf => "structural-leaf",
            Rule::Enum => "enum",
            Rule::MissingKey => "missing-key",
            Rule::Const => "const",
            Rule::ContainsConst => "contains-const",
            Rule::Dependencies => "dependencies",
            Rule::Pattern => "pattern",
            Rule::Ipv4Pattern => "ipv4-pattern",
            Rule::Format(target) => target.format_name(),
            Rule::UniqueItems => "unique-items",
            Rule::VcardArray => "vcard-array",
        }
    }

    pub fn matches(&self, cx: &RuleContext<'_>) -> bool {
        match self {
            Rule::UnknownKey => structure::unknown_key_matches(cx),
            Rule::BasicType => value::basic_type_matches(cx),
            Rule::Number => value::number_matches(cx),
            Rule::StructuralLeaf => structure::structural_leaf_matches(cx),
            Rule::Enum => value::enum_matches(cx),
            Rule::MissingKey => structure::missing_key_matches(cx),
            Rule::Const => value::const_matches(cx),
            Rule::ContainsConst => value::contains_const_matches(cx),
            Rule::Dependencies => structure::dependencies_matches(cx),
            Rule::Pattern => value::pattern_matches(cx),
            Rule::Ipv4Pattern => value::ipv4_pattern_matches(cx),
            Rule::Format(target) => target.matches(cx),
            Rule::UniqueItems => structure::unique_items_matches(cx),
            Rule::VcardArray => structure::vcard_matches(cx),
        }
    }

    /// Produce this rule's records. Only called when [`Rule::matches`]
    /// holds.
    pub fn apply(&self, cx: &RuleContext<'_>) -> Result<Vec<DiagnosticRecord>, ClassifyError> {
        match self {
            Rule::UnknownKey => structure::unknown_key(cx),
            Rule::BasicType => value::basic_type(cx),
            Rule::Number => value::number(cx),
            Rule::StructuralLeaf => structure::structure_invalid(cx).map(|r| vec![r]),
            Rule::Enum => value::enumeration(cx),
            Rule::MissingKey => structure::missing_key(cx),
            Rule::Const => value::constant(cx),
            Rule::ContainsConst => value::contains_const(cx),
            Rule::Dependencies => structure::dependencies(cx),
            Rule::Pattern => value::pattern(cx),
            Rule::Ipv4Pattern => value::ipv4_pattern(cx),
            Rule::Format(target) => target.apply(cx),
            Rule::UniqueItems => structure::unique_items(cx),
            Rule::VcardArray => structure::vcard(cx),
        }
    }
}

/// Root-level rule, evaluated once on the unflattened top failure: an
/// object or array shape mismatch always yields a structural record.
pub fn root_structure(cx: &RuleContext<'_>) -> Result<Option<DiagnosticRecord>, ClassifyError> {
    let violated = cx.violated();
    if (violated.is_object() || violated.is_array()) && BASIC_TYPE.is_match(cx.failure.detail()) {
        return structure::structure_invalid(cx).map(Some);
    }
    Ok(None)
}

/// Captured group `n` of `re` in the failure detail.
pub(crate) fn capture(re: &Regex, cx: &RuleContext<'_>, n: usize) -> Option<String> {
    re.captures(cx.failure.detail())
        .and_then(|c| c.get(n))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order_starts_with_unknown_key_and_ends_with_vcard() {
        let rules = Rule::standard();
        assert_eq!(rules.first(), Some(&Rule::UnknownKey));
        assert_eq!(rules.last(), Some(&Rule::VcardArray));
        assert!(rules.contains(&Rule::Format(FormatTarget::IdnHostname)));
        let pattern = rules.iter().position(|r| *r == Rule::Pattern);
        let ipv4 = rules.iter().position(|r| *r == Rule::Ipv4Pattern);
        assert!(pattern < ipv4);
    }

    #[test]
    fn test_rule_names_are_unique() {
        let rules = Rule::standard();
        let names: std::collections::BTreeSet<_> = rules.iter().map(Rule::name).collect();
        assert_eq!(names.len(), rules.len());
    }

    #[test]
    fn test_message_patterns() {
        let caps = UNKNOWN_KEY.captures("extraneous key [foo] is not permitted").unwrap();
        assert_eq!(&caps[1], "foo");
        let caps = BASIC_TYPE.captures("expected type: String, found: Integer").unwrap();
        assert_eq!(&caps[1], "String");
        assert_eq!(&caps[2], "Integer");
        let caps = PATTERN_MISMATCH
            .captures("string [999.999.1.1] does not match pattern ^[0-9.]+$")
            .unwrap();
        assert_eq!(&caps[1], "999.999.1.1");
        assert!(REQUIRED_KEY.is_match("required key [ldhName] not found"));
        assert!(DEPENDENT_KEY.is_match("property [dsData] is required"));
    }
}
