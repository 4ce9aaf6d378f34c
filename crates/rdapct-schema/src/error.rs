use thiserror::Error;

/// Error while loading, indexing or compiling schema documents.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A schema file could not be loaded.
    #[error("schema load error for '{schema_name}': {reason}")]
    Load {
        /// Schema filename or directory.
        schema_name: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// A `$ref` points at a location no loaded document defines.
    #[error("unresolved reference '{target}' at {location}")]
    UnresolvedReference {
        /// The reference as written.
        target: String,
        /// Location of the referencing element.
        location: String,
    },

    /// No loaded document has the requested name.
    #[error("unknown schema '{0}'")]
    UnknownSchema(String),

    /// The compiled validator could not be built.
    #[error("validator build error for schema '{schema_name}': {reason}")]
    Build {
        /// Schema filename.
        schema_name: String,
        /// Reason reported by the validator.
        reason: String,
    },

    /// IO error reading a schema.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
