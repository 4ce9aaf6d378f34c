//! Validation groups.
//!
//! Schema authors may tag an element with `validationName: <group>`. Any
//! classified failure at or below that element additionally yields one
//! record carrying the code stored under the key `<group>` on the tagged
//! element or one of the elements above it.
//!
//! "Above" is a chain of elements from the root schema downwards: the
//! failure trail for schema failures, [`SchemaIndex::document_path`] for
//! document-level checks.

use rdapct_core::pointer;
use rdapct_core::{DiagnosticRecord, QueryContext};
use rdapct_schema::{ElementId, SchemaIndex};
use serde_json::Value;

use crate::error::ClassifyError;

/// Metadata key naming the group of an element.
pub const VALIDATION_NAME: &str = "validationName";

/// Group record for a failure at `document_pointer` whose schema chain is
/// `chain`, if the chain passes through a validation group. The deepest
/// group wins.
pub fn validation_group(
    index: &SchemaIndex,
    chain: &[ElementId],
    document_pointer: &str,
    document: &Value,
    query: Option<&QueryContext>,
) -> Result<Option<DiagnosticRecord>, ClassifyError> {
    let Some((at, group)) = chain
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, &id)| index.metadata(id, VALIDATION_NAME).and_then(|v| v.as_text()).map(|g| (i, g)))
    else {
        return Ok(None);
    };

    let code = chain[..=at]
        .iter()
        .rev()
        .find_map(|&id| index.metadata(id, group).and_then(|v| v.as_code()))
        .ok_or_else(|| ClassifyError::MissingMetadata {
            key: group.to_string(),
            pointer: document_pointer.to_string(),
        })?;

    Ok(Some(
        DiagnosticRecord::builder()
            .code(code)
            .value(pointer::pointer_value(document, document_pointer))
            .message(format!(
                "The value for the JSON name value does not pass {document_pointer} validation [{group}]."
            ))
            .context(query.cloned())
            .build(),
    ))
}
