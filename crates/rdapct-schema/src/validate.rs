//! # Schema Validation
//!
//! Bridge between the `jsonschema` crate (Draft 7) and the failure trees
//! classification consumes.
//!
//! ## Schema Resolution
//!
//! All schemas carry `$id` URIs of the form:
//!   `https://rdapct.local/schemas/<filename>`
//!
//! Cross-schema `$ref`s are served from memory by [`LocalSchemaRetriever`];
//! validation never touches the network.
//!
//! ## Failure Trees
//!
//! `jsonschema` reports a flat stream of errors. Each error is located in
//! the [`SchemaIndex`] through its schema path and rewritten into a
//! [`Failure`] whose message follows the `<pointer>: <detail>` shape:
//!
//! - `required key [k] not found`, or `property [k] is required` when the
//!   requirement comes from `dependencies`
//! - `extraneous key [k] is not permitted`, one failure per key
//! - `expected type: T, found: F`
//! - `string [v] does not match pattern P`
//! - the format strategy's own message for `format`
//! - `array items are not unique`
//!
//! `anyOf`/`oneOf` violations are re-validated against every branch and the
//! branch failures become sub-failures, so the tree nests the way the
//! schema does.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Retrieve, Uri, ValidationError, ValidationOptions, Validator};
use rdapct_core::pointer;
use serde_json::Value;

use crate::element::{ElementId, SchemaKind};
use crate::error::SchemaError;
use crate::failure::{EdgeKind, Failure, TrailStep};
use crate::formats::FormatRegistry;
use crate::index::{SchemaIndex, SCHEMA_URI_PREFIX};

/// Local retriever that resolves `$ref` URIs to schemas loaded in memory.
struct LocalSchemaRetriever {
    /// Map from URI string to schema value.
    schemas_by_uri: Arc<HashMap<String, Value>>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();

        if let Some(value) = self.schemas_by_uri.get(uri_str) {
            return Ok(value.clone());
        }

        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        if let Some(value) = self.schemas_by_uri.get(&format!("{SCHEMA_URI_PREFIX}{filename}")) {
            return Ok(value.clone());
        }

        Err(format!("schema '{uri_str}' is not loaded").into())
    }
}

/// Loads a directory of schema documents and compiles validators for them.
///
/// The schema index is built once and shared (`Arc`) with every compiled
/// schema and with classification.
pub struct SchemaValidator {
    schema_dir: Option<PathBuf>,
    schemas: BTreeMap<String, Value>,
    schemas_by_uri: Arc<HashMap<String, Value>>,
    index: Arc<SchemaIndex>,
    formats: FormatRegistry,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema_dir", &self.schema_dir)
            .field("schemas", &self.schema_names())
            .field("formats", &self.formats)
            .finish()
    }
}

impl SchemaValidator {
    /// Load every `*.json` file in `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Load`] if the directory or a file cannot be
    /// read or parsed, and [`SchemaError::UnresolvedReference`] if indexing
    /// finds a dangling `$ref`.
    pub fn new(schema_dir: impl AsRef<Path>, formats: FormatRegistry) -> Result<Self, SchemaError> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        let mut schemas = BTreeMap::new();

        let entries = std::fs::read_dir(&schema_dir).map_err(|e| SchemaError::Load {
            schema_name: schema_dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        for entry in entries {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".json") {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            let value: Value = serde_json::from_str(&content).map_err(|e| SchemaError::Load {
                schema_name: name.to_string(),
                reason: format!("invalid JSON: {e}"),
            })?;
            schemas.insert(name.to_string(), value);
        }

        tracing::info!(dir = %schema_dir.display(), count = schemas.len(), "loaded schemas");
        let mut validator = Self::from_documents(schemas, formats)?;
        validator.schema_dir = Some(schema_dir);
        Ok(validator)
    }

    /// Use documents already in memory, keyed by filename.
    pub fn from_documents(
        schemas: BTreeMap<String, Value>,
        formats: FormatRegistry,
    ) -> Result<Self, SchemaError> {
        let index = SchemaIndex::build(&schemas)?;
        let mut schemas_by_uri = HashMap::new();
        for (filename, value) in &schemas {
            schemas_by_uri.insert(format!("{SCHEMA_URI_PREFIX}{filename}"), value.clone());
            if let Some(id) = value.get("$id").and_then(Value::as_str) {
                schemas_by_uri.insert(id.to_string(), value.clone());
            }
        }
        Ok(Self {
            schema_dir: None,
            schemas,
            schemas_by_uri: Arc::new(schemas_by_uri),
            index: Arc::new(index),
            formats,
        })
    }

    pub fn schema_dir(&self) -> Option<&Path> {
        self.schema_dir.as_deref()
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Names of all loaded schemas, sorted.
    pub fn schema_names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    pub fn get_schema(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// The shared schema index.
    pub fn index(&self) -> &Arc<SchemaIndex> {
        &self.index
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Draft 7 options with the local retriever and every format strategy.
    fn build_options(&self) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft7);
        opts.should_validate_formats(true);
        for strategy in self.formats.iter() {
            let strategy = Arc::clone(strategy);
            let name = strategy.name().to_string();
            opts.with_format(name, move |subject: &str| strategy.validate(subject).is_none());
        }
        opts.with_retriever(LocalSchemaRetriever {
            schemas_by_uri: Arc::clone(&self.schemas_by_uri),
        });
        opts
    }

    fn build_validator(&self, label: &str, schema: &Value) -> Result<Validator, SchemaError> {
        self.build_options()
            .build(schema)
            .map_err(|e| SchemaError::Build {
                schema_name: label.to_string(),
                reason: e.to_string(),
            })
    }

    /// Compile the validator for a named root schema, plus one validator per
    /// combinator branch for sub-failure expansion.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownSchema`] if no document has that name
    /// and [`SchemaError::Build`] if `jsonschema` rejects a schema.
    pub fn compile(&self, schema_name: &str) -> Result<CompiledSchema, SchemaError> {
        let schema = self
            .schemas
            .get(schema_name)
            .ok_or_else(|| SchemaError::UnknownSchema(schema_name.to_string()))?;
        let root = self
            .index
            .root(schema_name)
            .ok_or_else(|| SchemaError::UnknownSchema(schema_name.to_string()))?;
        let validator = self.build_validator(schema_name, schema)?;

        let mut branches = HashMap::new();
        for element in self.index.iter() {
            let SchemaKind::Combinator { branches: ids, .. } = element.kind() else {
                continue;
            };
            for &id in ids {
                let branch = self.index.element(id);
                let uri = format!("{SCHEMA_URI_PREFIX}{}#{}", branch.document(), branch.pointer());
                let wrapper = serde_json::json!({ "$ref": uri });
                branches.insert(id, self.build_validator(&branch.location(), &wrapper)?);
            }
        }

        tracing::debug!(schema = schema_name, branches = branches.len(), "compiled schema");
        Ok(CompiledSchema {
            name: schema_name.to_string(),
            root,
            validator,
            branches,
            index: Arc::clone(&self.index),
            formats: self.formats.clone(),
        })
    }

    /// Validate `instance` against a named schema.
    pub fn validate_document(
        &self,
        instance: &Value,
        schema_name: &str,
    ) -> Result<Option<Failure>, SchemaError> {
        Ok(self.compile(schema_name)?.validate(instance))
    }
}

/// A compiled root schema. Cheap to share across threads.
pub struct CompiledSchema {
    name: String,
    root: ElementId,
    validator: Validator,
    branches: HashMap<ElementId, Validator>,
    index: Arc<SchemaIndex>,
    formats: FormatRegistry,
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("branches", &self.branches.len())
            .finish()
    }
}

impl CompiledSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root element of the schema.
    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn index(&self) -> &Arc<SchemaIndex> {
        &self.index
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Validate a document.
    ///
    /// Returns `None` when it conforms, the single failure when there is
    /// one, and otherwise a failure at `#` whose sub-failures are all the
    /// individual violations.
    pub fn validate(&self, instance: &Value) -> Option<Failure> {
        let root_trail = [TrailStep {
            element: self.root,
            edge: EdgeKind::Root,
        }];
        let mut failures = self.collect(&self.validator, self.root, pointer::ROOT, &root_trail, instance, false);
        match failures.len() {
            0 => None,
            1 => failures.pop(),
            n => Some(
                Failure::new(pointer::ROOT, self.root, &format!("{n} schema violations found"))
                    .with_trail(root_trail.to_vec())
                    .with_causes(failures),
            ),
        }
    }

    fn collect(
        &self,
        validator: &Validator,
        base: ElementId,
        base_pointer: &str,
        base_trail: &[TrailStep],
        instance: &Value,
        wrapped: bool,
    ) -> Vec<Failure> {
        let mut out = Vec::new();
        for error in validator.iter_errors(instance) {
            let document_pointer = format!("{base_pointer}{}", error.instance_path);
            let schema_path = error.schema_path.to_string();
            // Branch validators wrap their branch in a single `$ref`.
            let relative = if wrapped {
                schema_path.strip_prefix("/$ref").unwrap_or(&schema_path)
            } else {
                schema_path.as_str()
            };
            let target = self.index.navigate(base, relative);

            let mut trail = base_trail.to_vec();
            trail.extend(target.trail.iter().skip(1).copied());
            let location = self.index.element(target.element).location();

            let context = ErrorContext {
                pointer: &document_pointer,
                element: target.element,
                trail: &trail,
                keyword: target.keyword.as_deref(),
                location: &location,
            };
            self.convert(&error, &context, &mut out);
        }
        out
    }

    fn convert(&self, error: &ValidationError<'_>, cx: &ErrorContext<'_>, out: &mut Vec<Failure>) {
        let value: &Value = &error.instance;
        match &error.kind {
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                for key in unexpected {
                    out.push(cx.failure(&format!("extraneous key [{key}] is not permitted"), "additionalProperties"));
                }
            }
            ValidationErrorKind::Required { property } => {
                let name = pointer::render(property);
                if cx.keyword == Some("dependencies") {
                    out.push(cx.failure(&format!("property [{name}] is required"), "dependencies"));
                } else {
                    out.push(cx.failure(&format!("required key [{name}] not found"), "required"));
                }
            }
            ValidationErrorKind::Type { .. } => {
                let expected = expected_type(self.index.element(cx.element).kind());
                let detail = format!("expected type: {expected}, found: {}", found_type(value));
                out.push(cx.failure(&detail, "type"));
            }
            ValidationErrorKind::Pattern { pattern } => {
                let detail = format!("string [{}] does not match pattern {pattern}", pointer::render(value));
                out.push(cx.failure(&detail, "pattern"));
            }
            ValidationErrorKind::Format { format } => {
                let subject = pointer::render(value);
                let detail = self
                    .formats
                    .get(format)
                    .and_then(|strategy| strategy.validate(&subject))
                    .unwrap_or_else(|| format!("[{subject}] is not a valid {format}"));
                out.push(cx.failure(&detail, "format"));
            }
            ValidationErrorKind::Enum { .. } => {
                out.push(cx.failure(&format!("{} is not a valid enum value", pointer::render(value)), "enum"));
            }
            ValidationErrorKind::Constant { expected_value } => {
                out.push(cx.failure(&format!("value does not match constant {expected_value}"), "const"));
            }
            ValidationErrorKind::Contains { .. } => {
                out.push(cx.failure("expected at least one array item to match 'contains' schema", "contains"));
            }
            ValidationErrorKind::UniqueItems { .. } => {
                out.push(cx.failure("array items are not unique", "uniqueItems"));
            }
            ValidationErrorKind::AnyOf { .. } | ValidationErrorKind::OneOfNotValid { .. } => {
                out.push(self.expand_combinator(cx, value));
            }
            ValidationErrorKind::OneOfMultipleValid { .. } => {
                out.push(cx.failure("more than one subschema matched", "oneOf"));
            }
            _ => {
                let keyword = cx.keyword.unwrap_or("").to_string();
                out.push(cx.failure(&error.to_string(), &keyword));
            }
        }
    }

    /// Re-validate `value` against each branch of the violated combinator.
    fn expand_combinator(&self, cx: &ErrorContext<'_>, value: &Value) -> Failure {
        let SchemaKind::Combinator { mode, branches } = self.index.element(cx.element).kind() else {
            return cx.failure("no subschema matched", cx.keyword.unwrap_or(""));
        };
        let mut causes = Vec::new();
        for &branch in branches {
            let Some(validator) = self.branches.get(&branch) else {
                continue;
            };
            let mut trail = cx.trail.to_vec();
            trail.push(TrailStep {
                element: branch,
                edge: EdgeKind::Branch,
            });
            causes.extend(self.collect(validator, branch, cx.pointer, &trail, value, true));
        }
        let detail = format!(
            "no subschema matched out of the total {} subschemas",
            branches.len()
        );
        cx.failure(&detail, mode.keyword()).with_causes(causes)
    }
}

/// Where one `jsonschema` error landed.
struct ErrorContext<'a> {
    pointer: &'a str,
    element: ElementId,
    trail: &'a [TrailStep],
    keyword: Option<&'a str>,
    location: &'a str,
}

impl ErrorContext<'_> {
    fn failure(&self, detail: &str, keyword: &str) -> Failure {
        let failure = Failure::new(self.pointer, self.element, detail)
            .with_trail(self.trail.to_vec())
            .with_schema_location(self.location);
        if keyword.is_empty() {
            failure
        } else {
            failure.with_keyword(keyword)
        }
    }
}

fn expected_type(kind: &SchemaKind) -> &'static str {
    match kind {
        SchemaKind::String { .. } => "String",
        SchemaKind::Number { integer: true, .. } => "Integer",
        SchemaKind::Number { .. } => "Number",
        SchemaKind::Boolean => "Boolean",
        SchemaKind::Null => "Null",
        SchemaKind::Object { .. } => "JSONObject",
        SchemaKind::Array { .. } => "JSONArray",
        _ => "Unknown",
    }
}

fn found_type(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "String",
        Value::Number(n) if n.is_i64() || n.is_u64() => "Integer",
        Value::Number(_) => "Number",
        Value::Bool(_) => "Boolean",
        Value::Null => "Null",
        Value::Object(_) => "JSONObject",
        Value::Array(_) => "JSONArray",
    }
}
