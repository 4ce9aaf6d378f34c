use thiserror::Error;

use crate::audit::MetadataGap;

/// Error raised by classification.
///
/// Both variants are schema-authoring defects: the schema documents lack
/// metadata a rule needs. Non-conformance of the validated document is
/// never an error.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// A rule needed a metadata key that neither the violated element, its
    /// container ancestors nor the parent schema declare.
    #[error("missing metadata '{key}' for failure at {pointer}")]
    MissingMetadata {
        /// The metadata key, e.g. `ldhNameMissing`.
        key: String,
        /// Document pointer of the failure being classified.
        pointer: String,
    },

    /// The load-time audit found elements without the metadata rules
    /// would request.
    #[error("schema metadata audit found {} gap(s); first: {}", .gaps.len(), .gaps.first().map(ToString::to_string).unwrap_or_default())]
    AuditFailed {
        /// Every gap found.
        gaps: Vec<MetadataGap>,
    },
}
