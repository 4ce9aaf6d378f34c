//! # rdapct-schema — Schema Index, Failure Trees & Validation
//!
//! Everything between the RDAP schema documents on disk and the failure
//! trees that classification consumes.
//!
//! ## Schema Node Index (`index`)
//!
//! [`SchemaIndex`] turns every schema object into a [`SchemaElement`]
//! holding its declared kind, constraints, local name and custom metadata
//! (`errorCode`, `structureInvalid`, `<property>Missing`, ...). References
//! are resolved across documents when the index is built.
//!
//! ## Failure Trees (`failure`)
//!
//! [`Failure`] nodes carry a `<pointer>: <detail>` message, the violated
//! element, the schema trail that led to it, an optional keyword and
//! sub-failures. [`flatten`] collects the leaves.
//!
//! ## Format Strategies (`formats`)
//!
//! [`FormatStrategy`] implementations for date-time, host names, IP
//! addresses and dataset-backed tokens, collected in a [`FormatRegistry`].
//!
//! ## Validation Bridge (`validate`)
//!
//! [`SchemaValidator`] loads `schemas/*.json`, compiles Draft 7 validators
//! with the `jsonschema` crate and rewrites its errors into failure trees.
//!
//! ## Crate Policy
//!
//! - Depends only on `rdapct-core` internally.
//! - Schema `$id` URIs use the `https://rdapct.local/schemas/` prefix;
//!   references never leave the process.
//! - Non-conformance is data ([`Failure`]), never an error.

pub mod element;
pub mod error;
pub mod failure;
pub mod formats;
pub mod index;
pub mod validate;

pub use element::{CombinatorMode, ElementId, MetaValue, SchemaElement, SchemaKind};
pub use error::SchemaError;
pub use failure::{flatten, EdgeKind, Failure, TrailStep};
pub use formats::{FormatRegistry, FormatStrategy};
pub use index::{SchemaIndex, SchemaTarget, SCHEMA_URI_PREFIX};
pub use validate::{CompiledSchema, SchemaValidator};
