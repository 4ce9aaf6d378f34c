//! # Results Sink
//!
//! Producers of diagnostics append into a [`ResultsSink`]. The sink owns
//! de-duplication: two records with the same code, value, message and
//! context are one finding.
//!
//! [`ValidatorResults`] is backed by a `DashSet` so a single instance can
//! collect records from many validation passes running in parallel.

use dashmap::DashSet;

use crate::diagnostic::DiagnosticRecord;

/// Destination for diagnostic records.
pub trait ResultsSink: Send + Sync {
    /// Add a record. Adding a record equal to one already held is a no-op.
    fn add(&self, record: DiagnosticRecord);
}

/// Concurrent set of diagnostic records.
#[derive(Debug, Default)]
pub struct ValidatorResults {
    records: DashSet<DiagnosticRecord>,
}

impl ValidatorResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether an equal record has been added.
    pub fn contains(&self, record: &DiagnosticRecord) -> bool {
        self.records.contains(record)
    }

    /// All records, sorted by code, then value, then message.
    pub fn sorted(&self) -> Vec<DiagnosticRecord> {
        let mut all: Vec<DiagnosticRecord> = self.records.iter().map(|r| r.key().clone()).collect();
        all.sort();
        all
    }

    /// Records carrying `code`, sorted.
    pub fn with_code(&self, code: i32) -> Vec<DiagnosticRecord> {
        self.sorted().into_iter().filter(|r| r.code() == code).collect()
    }

    /// Drop every record.
    pub fn clear(&self) {
        self.records.clear();
    }
}

impl ResultsSink for ValidatorResults {
    fn add(&self, record: DiagnosticRecord) {
        let rendered = record.to_string();
        if self.records.insert(record) {
            tracing::debug!(record = %rendered, "adding diagnostic");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn record(code: i32, value: &str) -> DiagnosticRecord {
        DiagnosticRecord::builder()
            .code(code)
            .value(value)
            .message("message")
            .build()
    }

    #[test]
    fn duplicates_collapse() {
        let results = ValidatorResults::new();
        results.add(record(-1, "a"));
        results.add(record(-1, "a"));
        results.add(record(-1, "b"));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn sorted_orders_by_code_then_value() {
        let results = ValidatorResults::new();
        results.add(record(-2, "b"));
        results.add(record(-3, "a"));
        results.add(record(-2, "a"));
        let codes: Vec<(i32, String)> = results
            .sorted()
            .into_iter()
            .map(|r| (r.code(), r.value().to_string()))
            .collect();
        assert_eq!(
            codes,
            vec![(-3, "a".to_string()), (-2, "a".to_string()), (-2, "b".to_string())]
        );
    }

    #[test]
    fn with_code_filters() {
        let results = ValidatorResults::new();
        results.add(record(-2, "b"));
        results.add(record(-3, "a"));
        assert_eq!(results.with_code(-3).len(), 1);
        assert!(results.with_code(-4).is_empty());
    }

    #[test]
    fn concurrent_insertion_keeps_set_semantics() {
        let results = Arc::new(ValidatorResults::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let results = Arc::clone(&results);
                thread::spawn(move || {
                    for i in 0..100 {
                        results.add(record(-(i % 10), &format!("v{}", (i + t) % 5)));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // 10 codes x 5 values
        assert_eq!(results.len(), 50);
    }

    #[test]
    fn clear_empties_the_set() {
        let results = ValidatorResults::new();
        results.add(record(-1, "a"));
        results.clear();
        assert!(results.is_empty());
        assert!(!results.contains(&record(-1, "a")));
    }
}
