//! # Schema Node Index
//!
//! Read-only, navigable view over a set of schema documents. Every schema
//! object becomes one [`SchemaElement`] in an arena; `$ref`s are resolved
//! across documents once, at build time.
//!
//! Three lookups matter to classification:
//!
//! - [`SchemaIndex::navigate`] follows a validator schema path
//!   (`/properties/ldhName/$ref/type`) to the violated element, recording
//!   the trail of elements and edges it crossed.
//! - [`SchemaIndex::find_by_name`] locates the element declared under a
//!   schema-local name anywhere below a root, substituting references by
//!   their targets.
//! - [`SchemaIndex::document_path`] follows a document pointer through
//!   named elements.
//!
//! Locations are written `<document>#<pointer>`, with an empty pointer for
//! the document root (`rdap_domain.json#`).

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use rdapct_core::pointer;
use serde_json::{Map, Value};

use crate::element::{
    CombinatorMode, ElementId, MetaValue, SchemaElement, SchemaKind, STANDARD_KEYWORDS,
};
use crate::error::SchemaError;
use crate::failure::{EdgeKind, TrailStep};

/// `$id` prefix of every schema document.
pub const SCHEMA_URI_PREFIX: &str = "https://rdapct.local/schemas/";

/// Where a schema path leads.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaTarget {
    /// The element owning the failing keyword, references substituted.
    pub element: ElementId,
    /// Elements crossed from the root, the last one being `element`.
    pub trail: Vec<TrailStep>,
    /// The failing keyword, `dependencies` when the path crosses one.
    pub keyword: Option<String>,
}

/// Arena of schema elements for a set of documents.
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    elements: Vec<SchemaElement>,
    by_location: HashMap<String, ElementId>,
    roots: BTreeMap<String, ElementId>,
}

impl SchemaIndex {
    /// Index a set of documents keyed by filename and resolve every `$ref`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnresolvedReference`] if a reference targets a
    /// location none of the documents defines.
    pub fn build(documents: &BTreeMap<String, Value>) -> Result<Self, SchemaError> {
        let mut index = SchemaIndex::default();
        for (name, value) in documents {
            let root = index.add_element(name, value, String::new(), None);
            index.roots.insert(name.clone(), root);
        }
        index.resolve_references()?;
        tracing::debug!(
            documents = index.roots.len(),
            elements = index.elements.len(),
            "schema index built"
        );
        Ok(index)
    }

    /// Index a single document.
    pub fn from_document(name: &str, value: &Value) -> Result<Self, SchemaError> {
        let mut documents = BTreeMap::new();
        documents.insert(name.to_string(), value.clone());
        Self::build(&documents)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The element behind `id`. Ids are only minted by this index.
    pub fn element(&self, id: ElementId) -> &SchemaElement {
        &self.elements[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaElement> {
        self.elements.iter()
    }

    /// Root element of a document.
    pub fn root(&self, document: &str) -> Option<ElementId> {
        self.roots.get(document).copied()
    }

    /// Names of the indexed documents, sorted.
    pub fn documents(&self) -> Vec<&str> {
        self.roots.keys().map(String::as_str).collect()
    }

    /// Element declared at `<document>#<pointer>`.
    pub fn by_location(&self, location: &str) -> Option<ElementId> {
        self.by_location.get(location).copied()
    }

    /// Metadata declared directly on an element.
    pub fn metadata(&self, id: ElementId, key: &str) -> Option<&MetaValue> {
        self.element(id).metadata(key)
    }

    /// Follow references until a non-reference element.
    pub fn deref(&self, id: ElementId) -> ElementId {
        let mut current = id;
        for _ in 0..=self.elements.len() {
            match self.element(current).kind() {
                SchemaKind::Reference {
                    resolved: Some(target),
                    ..
                } => current = *target,
                _ => return current,
            }
        }
        current
    }

    /// Depth-first search for the element declared under `name` below
    /// `root`. Direct children are checked before descending. The match is
    /// returned with references substituted.
    pub fn find_by_name(&self, root: ElementId, name: &str) -> Option<ElementId> {
        let mut visited = HashSet::new();
        self.find_in(root, name, &mut visited)
    }

    fn find_in(&self, id: ElementId, name: &str, visited: &mut HashSet<ElementId>) -> Option<ElementId> {
        let id = self.deref(id);
        if !visited.insert(id) {
            return None;
        }
        let children = self.element(id).children();
        for &child in &children {
            if self.element(child).name() == Some(name) {
                return Some(self.deref(child));
            }
        }
        children
            .into_iter()
            .find_map(|child| self.find_in(child, name, visited))
    }

    /// Elements named by the non-index segments of a document pointer,
    /// starting at `root` (dereferenced). Stops at the first segment with
    /// no matching element.
    pub fn document_path(&self, root: ElementId, document_pointer: &str) -> Vec<ElementId> {
        let mut current = self.deref(root);
        let mut chain = vec![current];
        for segment in pointer::segments(document_pointer).iter().skip(1) {
            if pointer::is_index(segment) {
                continue;
            }
            match self.find_by_name(current, segment) {
                Some(next) => {
                    chain.push(next);
                    current = next;
                }
                None => break,
            }
        }
        chain
    }

    /// Follow a validator schema path from `root`.
    ///
    /// Navigation understands `properties`, `items`, `contains`,
    /// `allOf`/`anyOf`/`oneOf`, `definitions`/`$defs` and `$ref`. References
    /// are substituted even when the path omits the `$ref` segment. The
    /// first segment that cannot be navigated is the failing keyword.
    pub fn navigate(&self, root: ElementId, schema_path: &str) -> SchemaTarget {
        let segments: Vec<String> = schema_path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(pointer::unescape)
            .collect();

        let mut current = root;
        let mut trail = vec![TrailStep {
            element: root,
            edge: EdgeKind::Root,
        }];
        let mut keyword = None;
        let mut i = 0;

        while i < segments.len() {
            let segment = segments[i].as_str();
            let next = segments.get(i + 1).map(String::as_str);

            if segment == "$ref" {
                if let SchemaKind::Reference {
                    resolved: Some(target),
                    ..
                } = self.element(current).kind()
                {
                    current = *target;
                    trail.push(TrailStep {
                        element: current,
                        edge: EdgeKind::Reference,
                    });
                    i += 1;
                    continue;
                }
                keyword = Some(segment.to_string());
                break;
            }

            current = self.deref_onto(current, &mut trail);
            let element = self.element(current);

            let step = match (segment, element.kind(), next) {
                ("properties", SchemaKind::Object { properties, .. }, Some(name)) => properties
                    .get(name)
                    .map(|&child| (child, EdgeKind::Property, 2)),
                ("items", SchemaKind::Array { items: Some(child), .. }, Some(_)) => {
                    let skip = if next.is_some_and(pointer::is_index) { 2 } else { 1 };
                    Some((*child, EdgeKind::Items, skip))
                }
                ("contains", SchemaKind::Array { contains: Some(child), .. }, Some(_)) => {
                    Some((*child, EdgeKind::Contains, 1))
                }
                (kw, SchemaKind::Combinator { mode, branches }, Some(n))
                    if CombinatorMode::from_keyword(kw) == Some(*mode) =>
                {
                    n.parse::<usize>()
                        .ok()
                        .and_then(|n| branches.get(n))
                        .map(|&child| (child, EdgeKind::Branch, 2))
                }
                ("definitions" | "$defs", _, Some(name)) => element
                    .definitions()
                    .get(name)
                    .map(|&child| (child, EdgeKind::Definition, 2)),
                _ => None,
            };

            match step {
                Some((child, edge, consumed)) => {
                    current = child;
                    trail.push(TrailStep {
                        element: child,
                        edge,
                    });
                    i += consumed;
                }
                None => {
                    keyword = Some(segment.to_string());
                    break;
                }
            }
        }

        let element = self.deref_onto(current, &mut trail);
        SchemaTarget {
            element,
            trail,
            keyword,
        }
    }

    fn deref_onto(&self, id: ElementId, trail: &mut Vec<TrailStep>) -> ElementId {
        let mut current = id;
        for _ in 0..=self.elements.len() {
            match self.element(current).kind() {
                SchemaKind::Reference {
                    resolved: Some(target),
                    ..
                } => {
                    current = *target;
                    trail.push(TrailStep {
                        element: current,
                        edge: EdgeKind::Reference,
                    });
                }
                _ => break,
            }
        }
        current
    }

    fn add_element(
        &mut self,
        document: &str,
        value: &Value,
        element_pointer: String,
        name: Option<String>,
    ) -> ElementId {
        let Value::Object(obj) = value else {
            return self.push(document, element_pointer, name, SchemaKind::Any, BTreeMap::new(), BTreeMap::new());
        };

        let mut definitions = BTreeMap::new();
        for key in ["definitions", "$defs"] {
            if let Some(Value::Object(defs)) = obj.get(key) {
                for (def_name, def) in defs {
                    let p = format!("{element_pointer}/{key}/{}", pointer::escape(def_name));
                    let id = self.add_element(document, def, p, Some(def_name.clone()));
                    definitions.insert(def_name.clone(), id);
                }
            }
        }

        let kind = self.kind_of(document, obj, &element_pointer);
        let metadata = obj
            .iter()
            .filter(|(k, _)| !STANDARD_KEYWORDS.contains(&k.as_str()))
            .filter_map(|(k, v)| match v {
                Value::Number(n) => n.as_i64().map(|i| (k.clone(), MetaValue::Int(i))),
                Value::String(s) => Some((k.clone(), MetaValue::Text(s.clone()))),
                _ => None,
            })
            .collect();

        self.push(document, element_pointer, name, kind, metadata, definitions)
    }

    fn kind_of(&mut self, document: &str, obj: &Map<String, Value>, element_pointer: &str) -> SchemaKind {
        if let Some(target) = obj.get("$ref").and_then(Value::as_str) {
            return SchemaKind::Reference {
                target: target.to_string(),
                resolved: None,
            };
        }
        if let Some(value) = obj.get("const") {
            return SchemaKind::Const(value.clone());
        }
        if let Some(Value::Array(values)) = obj.get("enum") {
            return SchemaKind::Enum(values.clone());
        }
        for mode in [CombinatorMode::AllOf, CombinatorMode::AnyOf, CombinatorMode::OneOf] {
            if let Some(Value::Array(subschemas)) = obj.get(mode.keyword()) {
                let branches = subschemas
                    .iter()
                    .enumerate()
                    .map(|(i, s)| {
                        let p = format!("{element_pointer}/{}/{i}", mode.keyword());
                        self.add_element(document, s, p, None)
                    })
                    .collect();
                return SchemaKind::Combinator { mode, branches };
            }
        }

        let declared = obj.get("type").and_then(Value::as_str);
        let string_only = obj.contains_key("pattern") || obj.contains_key("format");
        match declared {
            Some("string") => SchemaKind::String {
                pattern: obj.get("pattern").and_then(Value::as_str).map(str::to_string),
                format: obj.get("format").and_then(Value::as_str).map(str::to_string),
            },
            // A bare `format`/`pattern` only constrains strings.
            None if string_only => SchemaKind::String {
                pattern: obj.get("pattern").and_then(Value::as_str).map(str::to_string),
                format: obj.get("format").and_then(Value::as_str).map(str::to_string),
            },
            Some(t @ ("integer" | "number")) => SchemaKind::Number {
                integer: t == "integer",
                minimum: obj.get("minimum").and_then(Value::as_f64),
                maximum: obj.get("maximum").and_then(Value::as_f64),
            },
            Some("boolean") => SchemaKind::Boolean,
            Some("null") => SchemaKind::Null,
            Some("object") => self.object_kind(document, obj, element_pointer),
            Some("array") => self.array_kind(document, obj, element_pointer),
            None if obj.contains_key("properties") => self.object_kind(document, obj, element_pointer),
            None if obj.contains_key("items") => self.array_kind(document, obj, element_pointer),
            _ => SchemaKind::Any,
        }
    }

    fn object_kind(&mut self, document: &str, obj: &Map<String, Value>, element_pointer: &str) -> SchemaKind {
        let mut properties = BTreeMap::new();
        if let Some(Value::Object(props)) = obj.get("properties") {
            for (prop, schema) in props {
                let p = format!("{element_pointer}/properties/{}", pointer::escape(prop));
                let id = self.add_element(document, schema, p, Some(prop.clone()));
                properties.insert(prop.clone(), id);
            }
        }
        let required = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        let mut dependencies = BTreeMap::new();
        if let Some(Value::Object(deps)) = obj.get("dependencies") {
            for (prop, dep) in deps {
                if let Value::Array(required) = dep {
                    let set: BTreeSet<String> = required
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect();
                    dependencies.insert(prop.clone(), set);
                }
            }
        }
        SchemaKind::Object {
            properties,
            required,
            dependencies,
            additional_properties: !matches!(obj.get("additionalProperties"), Some(Value::Bool(false))),
        }
    }

    fn array_kind(&mut self, document: &str, obj: &Map<String, Value>, element_pointer: &str) -> SchemaKind {
        let items = match obj.get("items") {
            Some(schema @ (Value::Object(_) | Value::Bool(_))) => {
                Some(self.add_element(document, schema, format!("{element_pointer}/items"), None))
            }
            _ => None,
        };
        let contains = obj
            .get("contains")
            .map(|schema| self.add_element(document, schema, format!("{element_pointer}/contains"), None));
        SchemaKind::Array {
            items,
            contains,
            unique_items: obj.get("uniqueItems").and_then(Value::as_bool).unwrap_or(false),
        }
    }

    fn push(
        &mut self,
        document: &str,
        element_pointer: String,
        name: Option<String>,
        kind: SchemaKind,
        metadata: BTreeMap<String, MetaValue>,
        definitions: BTreeMap<String, ElementId>,
    ) -> ElementId {
        let id = ElementId(self.elements.len());
        let element = SchemaElement {
            id,
            kind,
            metadata,
            definitions,
            document: document.to_string(),
            pointer: element_pointer,
            name,
        };
        self.by_location.insert(element.location(), id);
        self.elements.push(element);
        id
    }

    fn resolve_references(&mut self) -> Result<(), SchemaError> {
        for i in 0..self.elements.len() {
            let element = &self.elements[i];
            let SchemaKind::Reference { target, .. } = element.kind() else {
                continue;
            };
            let location = reference_location(element.document(), target);
            let resolved = self
                .by_location
                .get(&location)
                .copied()
                .ok_or_else(|| SchemaError::UnresolvedReference {
                    target: target.clone(),
                    location: element.location(),
                })?;
            if let SchemaKind::Reference { resolved: slot, .. } = &mut self.elements[i].kind {
                *slot = Some(resolved);
            }
        }
        Ok(())
    }
}

/// `<document>#<pointer>` targeted by a `$ref` written in `document`.
pub fn reference_location(document: &str, target: &str) -> String {
    let target = target.strip_prefix(SCHEMA_URI_PREFIX).unwrap_or(target);
    let (doc, fragment) = target.split_once('#').unwrap_or((target, ""));
    let doc = if doc.is_empty() {
        document
    } else {
        doc.rsplit('/').next().unwrap_or(doc)
    };
    format!("{doc}#{fragment}")
}
