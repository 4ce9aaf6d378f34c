//! # Validate Subcommand
//!
//! `rdapct validate [--schema NAME] PATH` validates one RDAP response,
//! classifies every violation and prints the sorted records as a JSON
//! array on stdout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use rdapct_classify::Classifier;
use rdapct_core::{DatasetService, DiagnosticRecord, QueryContext, ValidatorResults};
use rdapct_schema::{CompiledSchema, FormatRegistry, SchemaValidator};

use crate::config::RdapctConfig;

/// Arguments for the `rdapct validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// RDAP response to validate (JSON).
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Root schema, e.g. `rdap_nameserver.json`. Defaults to the configured schema.
    #[arg(long)]
    pub schema: Option<String>,

    /// Query URI attached to every record.
    #[arg(long)]
    pub uri: Option<String>,

    /// HTTP status of the query.
    #[arg(long, default_value_t = 200, requires = "uri")]
    pub status: u16,

    /// Refuse schemas with metadata gaps.
    #[arg(long)]
    pub strict: bool,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when the response is conformant, 1 when records
/// were produced.
pub fn run_validate(args: &ValidateArgs, config: &RdapctConfig, repo_root: &Path) -> Result<u8> {
    let datasets = config.load_datasets()?;
    let schema_name = args.schema.as_deref().unwrap_or(&config.schema);
    let schema = compile(config, schema_name, Arc::clone(&datasets))?;
    let classifier = classifier(&schema, datasets, args.strict || config.strict)?;

    let path = crate::locate_response(&args.path, repo_root);
    let content = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let document: Value =
        serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))?;

    let query = args.uri.as_ref().map(|uri| QueryContext::get(uri.as_str(), args.status));
    let records = classify_document(&schema, &classifier, &document, query.as_ref())?;
    tracing::info!(path = %path.display(), schema = schema_name, records = records.len(), "validation finished");

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(if records.is_empty() { 0 } else { 1 })
}

/// Load the schema directory and compile `schema_name`.
pub fn compile(config: &RdapctConfig, schema_name: &str, datasets: Arc<dyn DatasetService>) -> Result<CompiledSchema> {
    let validator = SchemaValidator::new(&config.schema_dir, FormatRegistry::standard(datasets))
        .context("failed to load RDAP schemas")?;
    validator
        .compile(schema_name)
        .with_context(|| format!("failed to compile schema {schema_name}"))
}

fn classifier(schema: &CompiledSchema, datasets: Arc<dyn DatasetService>, strict: bool) -> Result<Classifier> {
    if strict {
        return Classifier::strict(Arc::clone(schema.index()), schema.root(), datasets)
            .context("schema metadata audit failed");
    }
    let classifier = Classifier::for_schema(schema, datasets);
    for gap in classifier.audit() {
        tracing::warn!(%gap, "schema metadata gap");
    }
    Ok(classifier)
}

/// Validate `document`, classify the failure tree and run the
/// document-level checks. Records come back sorted.
pub fn classify_document(
    schema: &CompiledSchema,
    classifier: &Classifier,
    document: &Value,
    query: Option<&QueryContext>,
) -> Result<Vec<DiagnosticRecord>> {
    let sink = ValidatorResults::new();
    if let Some(failure) = schema.validate(document) {
        tracing::debug!(message = failure.message(), "schema validation failed");
        classifier.classify(&failure, document, &sink, query)?;
    }
    classifier.check_document(document, &sink, query)?;
    Ok(sink.sorted())
}
