//! # rdapct-classify — Violation Classification Engine
//!
//! Turns the failure tree of one schema validation into coded RDAP
//! diagnostic records.
//!
//! ## Pipeline
//!
//! 1. [`flatten`](rdapct_schema::flatten) collects the leaf failures.
//! 2. The [`resolver`] finds each leaf's parent schema, the nearest named
//!    schema element enclosing the offending location.
//! 3. Every [`Rule`] whose predicate matches the leaf produces its records.
//! 4. A leaf matched by at least one rule also yields its validation-group
//!    record ([`group`]).
//! 5. The root-level structural rule runs once on the unflattened top
//!    failure.
//!
//! [`Classifier::check_document`] adds the document-level checks that JSON
//! Schema cannot express.
//!
//! ## Crate Policy
//!
//! - Codes come from schema metadata. A missing code is a schema defect and
//!   surfaces as [`ClassifyError::MissingMetadata`]; [`audit`] finds such
//!   defects at load time.
//! - Rules are stateless and independent of each other's firing.
//! - No I/O. Output goes to a [`ResultsSink`](rdapct_core::ResultsSink).

pub mod audit;
pub mod engine;
pub mod error;
pub mod events;
pub mod group;
pub mod resolver;
pub mod rules;

pub use audit::{audit, MetadataGap};
pub use engine::Classifier;
pub use error::ClassifyError;
pub use rules::{FormatTarget, Rule, RuleContext};
