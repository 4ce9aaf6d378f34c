//! # rdapct-core — Foundational Types for the RDAP Conformance Tool
//!
//! Every other crate in the workspace depends on `rdapct-core`; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One output unit.** Every conformance finding is a
//!    [`DiagnosticRecord`]: a negative code, a `"<pointer>:<value>"` value,
//!    a human message and an optional [`QueryContext`]. Records are
//!    immutable and compared structurally.
//!
//! 2. **Set-semantics sink.** Producers never de-duplicate. They call
//!    [`ResultsSink::add`] and the sink collapses identical records.
//!    [`ValidatorResults`] is safe for concurrent insertion.
//!
//! 3. **Pointers are strings with a `#` root.** The [`pointer`] module is
//!    the single place that splits, unescapes and queries them.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `rdapct-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod dataset;
pub mod diagnostic;
pub mod error;
pub mod pointer;
pub mod results;

pub use dataset::{DatasetService, InMemoryDatasets};
pub use diagnostic::{DiagnosticRecord, DiagnosticRecordBuilder, QueryContext};
pub use error::{DatasetError, RdapctError};
pub use results::{ResultsSink, ValidatorResults};
