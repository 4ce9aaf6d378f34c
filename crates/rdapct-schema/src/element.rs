//! # Schema Elements
//!
//! One node of an indexed schema document. Elements live in the arena
//! owned by [`SchemaIndex`](crate::SchemaIndex) and refer to each other by
//! [`ElementId`].
//!
//! Custom metadata is every keyword the JSON Schema vocabulary does not
//! define whose value is an integer or a string (`errorCode`,
//! `structureInvalid`, `ldhNameMissing`, `validationName`, ...). Keys are
//! free text chosen by schema authors and are looked up by constructed
//! name.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;

/// Handle of an element inside a [`SchemaIndex`](crate::SchemaIndex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A custom metadata value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Int(i64),
    Text(String),
}

impl MetaValue {
    /// The value as a diagnostic code, if it is an integer that fits.
    pub fn as_code(&self) -> Option<i32> {
        match self {
            MetaValue::Int(i) => i32::try_from(*i).ok(),
            MetaValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            MetaValue::Int(_) => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Int(i) => write!(f, "{i}"),
            MetaValue::Text(s) => f.write_str(s),
        }
    }
}

/// Combinator keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinatorMode {
    AllOf,
    AnyOf,
    OneOf,
}

impl CombinatorMode {
    pub fn keyword(self) -> &'static str {
        match self {
            CombinatorMode::AllOf => "allOf",
            CombinatorMode::AnyOf => "anyOf",
            CombinatorMode::OneOf => "oneOf",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "allOf" => Some(CombinatorMode::AllOf),
            "anyOf" => Some(CombinatorMode::AnyOf),
            "oneOf" => Some(CombinatorMode::OneOf),
            _ => None,
        }
    }
}

/// Declared value kind of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String {
        pattern: Option<String>,
        /// Identity of the attached format strategy.
        format: Option<String>,
    },
    Number {
        integer: bool,
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Boolean,
    Null,
    Object {
        properties: BTreeMap<String, ElementId>,
        required: Vec<String>,
        /// Property → properties it requires.
        dependencies: BTreeMap<String, BTreeSet<String>>,
        /// `false` when `additionalProperties: false`.
        additional_properties: bool,
    },
    Array {
        items: Option<ElementId>,
        contains: Option<ElementId>,
        unique_items: bool,
    },
    Const(Value),
    Enum(Vec<Value>),
    Combinator {
        mode: CombinatorMode,
        branches: Vec<ElementId>,
    },
    Reference {
        /// The `$ref` as written.
        target: String,
        resolved: Option<ElementId>,
    },
    Any,
}

impl SchemaKind {
    /// Short kind name used in logs and audit reports.
    pub fn name(&self) -> &'static str {
        match self {
            SchemaKind::String { .. } => "string",
            SchemaKind::Number { integer: true, .. } => "integer",
            SchemaKind::Number { .. } => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Null => "null",
            SchemaKind::Object { .. } => "object",
            SchemaKind::Array { .. } => "array",
            SchemaKind::Const(_) => "const",
            SchemaKind::Enum(_) => "enum",
            SchemaKind::Combinator { .. } => "combinator",
            SchemaKind::Reference { .. } => "reference",
            SchemaKind::Any => "any",
        }
    }
}

/// One node of an indexed schema document.
#[derive(Debug, Clone)]
pub struct SchemaElement {
    pub(crate) id: ElementId,
    pub(crate) kind: SchemaKind,
    pub(crate) metadata: BTreeMap<String, MetaValue>,
    pub(crate) definitions: BTreeMap<String, ElementId>,
    pub(crate) document: String,
    pub(crate) pointer: String,
    pub(crate) name: Option<String>,
}

impl SchemaElement {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// Filename of the document declaring this element.
    pub fn document(&self) -> &str {
        &self.document
    }

    /// RFC 6901 pointer of the element inside its document (`""` for the
    /// document root).
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// `<document>#<pointer>`.
    pub fn location(&self) -> String {
        format!("{}#{}", self.document, self.pointer)
    }

    /// Local name: the property or definition name this element was
    /// declared under.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn metadata(&self, key: &str) -> Option<&MetaValue> {
        self.metadata.get(key)
    }

    pub fn has_metadata(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }

    pub fn metadata_keys(&self) -> impl Iterator<Item = &str> {
        self.metadata.keys().map(String::as_str)
    }

    pub fn definitions(&self) -> &BTreeMap<String, ElementId> {
        &self.definitions
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, SchemaKind::Object { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, SchemaKind::Array { .. })
    }

    /// Pattern declared on a string element.
    pub fn pattern(&self) -> Option<&str> {
        match &self.kind {
            SchemaKind::String { pattern, .. } => pattern.as_deref(),
            _ => None,
        }
    }

    /// Format strategy identity declared on a string element.
    pub fn format(&self) -> Option<&str> {
        match &self.kind {
            SchemaKind::String { format, .. } => format.as_deref(),
            _ => None,
        }
    }

    /// Declared property names of an object element, sorted.
    pub fn property_names(&self) -> Vec<&str> {
        match &self.kind {
            SchemaKind::Object { properties, .. } => properties.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Elements this one contains structurally, in declaration order:
    /// properties, array items and contains, combinator branches, then
    /// definitions. References are not followed.
    pub fn children(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        match &self.kind {
            SchemaKind::Object { properties, .. } => out.extend(properties.values().copied()),
            SchemaKind::Array {
                items, contains, ..
            } => {
                out.extend(items.iter().copied());
                out.extend(contains.iter().copied());
            }
            SchemaKind::Combinator { branches, .. } => out.extend(branches.iter().copied()),
            _ => {}
        }
        out.extend(self.definitions.values().copied());
        out
    }
}

/// Keywords of the JSON Schema vocabulary. Anything else with an integer or
/// string value is custom metadata.
pub(crate) const STANDARD_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "$ref",
    "$comment",
    "$defs",
    "title",
    "description",
    "default",
    "examples",
    "readOnly",
    "writeOnly",
    "type",
    "enum",
    "const",
    "properties",
    "patternProperties",
    "additionalProperties",
    "required",
    "dependencies",
    "propertyNames",
    "minProperties",
    "maxProperties",
    "items",
    "additionalItems",
    "contains",
    "uniqueItems",
    "minItems",
    "maxItems",
    "pattern",
    "format",
    "minLength",
    "maxLength",
    "contentMediaType",
    "contentEncoding",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
    "if",
    "then",
    "else",
    "definitions",
];
