//! # Diagnostic Records
//!
//! The single output unit of the conformance tool. A record carries a
//! negative code that is globally unique per RDAP condition, the offending
//! value (usually `"<pointer>:<value>"`), a human-readable message and,
//! when the validation ran against a live server, the request context.
//!
//! Records are immutable once built and compare with full structural
//! equality, which is what the results sink relies on to collapse
//! duplicates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ambient request data attached to records produced during one query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryContext {
    /// The URI that was queried.
    pub queried_uri: String,
    /// HTTP method used for the query (`GET`, `HEAD`).
    pub http_method: String,
    /// HTTP status code returned by the server, when one was received.
    pub http_status_code: Option<u16>,
}

impl QueryContext {
    /// Context for a `GET` on `uri` that returned `status`.
    pub fn get(uri: impl Into<String>, status: u16) -> Self {
        Self {
            queried_uri: uri.into(),
            http_method: "GET".to_string(),
            http_status_code: Some(status),
        }
    }
}

/// One classified RDAP conformance violation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    code: i32,
    value: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    context: Option<QueryContext>,
}

impl DiagnosticRecord {
    /// Start building a record.
    pub fn builder() -> DiagnosticRecordBuilder {
        DiagnosticRecordBuilder::default()
    }

    /// The diagnostic code.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// The offending value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Request context, if the record was produced for a live query.
    pub fn context(&self) -> Option<&QueryContext> {
        self.context.as_ref()
    }
}

impl fmt::Display for DiagnosticRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.code, self.message, self.value)
    }
}

/// Builder for [`DiagnosticRecord`].
#[derive(Debug, Clone, Default)]
pub struct DiagnosticRecordBuilder {
    code: i32,
    value: String,
    message: String,
    context: Option<QueryContext>,
}

impl DiagnosticRecordBuilder {
    pub fn code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach request context. `None` leaves the record context-free.
    pub fn context(mut self, context: Option<QueryContext>) -> Self {
        self.context = context;
        self
    }

    pub fn build(self) -> DiagnosticRecord {
        DiagnosticRecord {
            code: self.code,
            value: self.value,
            message: self.message,
            context: self.context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_all_fields() {
        let record = DiagnosticRecord::builder()
            .code(-12205)
            .value("#/ldhName:0")
            .message("The JSON value is not a string.")
            .context(Some(QueryContext::get("https://rdap.example/domain/x.example", 200)))
            .build();

        assert_eq!(record.code(), -12205);
        assert_eq!(record.value(), "#/ldhName:0");
        assert_eq!(record.message(), "The JSON value is not a string.");
        assert_eq!(record.context().and_then(|c| c.http_status_code), Some(200));
    }

    #[test]
    fn equality_is_structural() {
        let a = DiagnosticRecord::builder().code(-1).value("v").message("m").build();
        let b = DiagnosticRecord::builder().code(-1).value("v").message("m").build();
        let c = DiagnosticRecord::builder().code(-1).value("v").message("other").build();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn context_participates_in_equality() {
        let plain = DiagnosticRecord::builder().code(-1).value("v").message("m").build();
        let with_ctx = DiagnosticRecord::builder()
            .code(-1)
            .value("v")
            .message("m")
            .context(Some(QueryContext::get("https://rdap.example/", 404)))
            .build();
        assert_ne!(plain, with_ctx);
    }

    #[test]
    fn serializes_without_empty_context() {
        let record = DiagnosticRecord::builder().code(-10100).value("#/v4/0:999").message("m").build();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["code"], -10100);
        assert!(json.get("context").is_none());
    }

    #[test]
    fn display_includes_code_and_value() {
        let record = DiagnosticRecord::builder().code(-46100).value("{}").message("missing").build();
        let s = record.to_string();
        assert!(s.contains("-46100"));
        assert!(s.contains("{}"));
    }
}
