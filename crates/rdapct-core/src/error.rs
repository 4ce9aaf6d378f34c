//! # Error Types
//!
//! Errors shared by the workspace. All use `thiserror`.
//!
//! Schema non-conformance is never an error: it is reported as a
//! diagnostic record. Errors here are about the tool's own inputs
//! (dataset files, configuration).

use thiserror::Error;

/// Top-level error type for the foundational crate.
#[derive(Error, Debug)]
pub enum RdapctError {
    /// Dataset loading failed.
    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error while loading dataset catalogs.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The dataset file could not be read.
    #[error("cannot read dataset file '{path}': {source}")]
    Read {
        /// Path of the dataset file.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The dataset file is not valid YAML for the expected layout.
    #[error("invalid dataset file '{path}': {reason}")]
    Parse {
        /// Path of the dataset file.
        path: String,
        /// Parser message.
        reason: String,
    },
}
