//! # Classification Engine
//!
//! Drives one classification pass: flatten the failure tree, resolve each
//! leaf's parent schema, evaluate every rule, then evaluate the root-level
//! rule on the unflattened top failure. All output goes to a
//! [`ResultsSink`].
//!
//! A [`Classifier`] holds only immutable, shared state and may classify on
//! many threads at once.

use std::sync::Arc;

use rdapct_core::{DatasetService, QueryContext, ResultsSink};
use rdapct_schema::{flatten, CompiledSchema, ElementId, Failure, SchemaIndex};
use serde_json::Value;

use crate::audit::{audit, MetadataGap};
use crate::error::ClassifyError;
use crate::events;
use crate::group;
use crate::rules::{self, Rule, RuleContext};

/// Classifies failure trees for one root schema.
pub struct Classifier {
    index: Arc<SchemaIndex>,
    root: ElementId,
    datasets: Arc<dyn DatasetService>,
    rules: Vec<Rule>,
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("root", &self.root)
            .field("elements", &self.index.len())
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl Classifier {
    /// Classifier with the standard rule list. No metadata audit.
    pub fn new(index: Arc<SchemaIndex>, root: ElementId, datasets: Arc<dyn DatasetService>) -> Self {
        Self {
            index,
            root,
            datasets,
            rules: Rule::standard(),
        }
    }

    /// Classifier for a compiled root schema.
    pub fn for_schema(schema: &CompiledSchema, datasets: Arc<dyn DatasetService>) -> Self {
        Self::new(Arc::clone(schema.index()), schema.root(), datasets)
    }

    /// Like [`Classifier::new`], but refuses an index with metadata gaps.
    pub fn strict(
        index: Arc<SchemaIndex>,
        root: ElementId,
        datasets: Arc<dyn DatasetService>,
    ) -> Result<Self, ClassifyError> {
        let gaps = audit(&index);
        if !gaps.is_empty() {
            return Err(ClassifyError::AuditFailed { gaps });
        }
        Ok(Self::new(index, root, datasets))
    }

    /// Replace the rule list.
    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn index(&self) -> &Arc<SchemaIndex> {
        &self.index
    }

    /// Metadata gaps of the underlying index.
    pub fn audit(&self) -> Vec<MetadataGap> {
        audit(&self.index)
    }

    /// Classify `root_failure`, raised while validating `document`, into
    /// `sink`.
    ///
    /// # Errors
    ///
    /// [`ClassifyError::MissingMetadata`] when a matching rule finds no
    /// code for the failure. Records produced before the error stay in the
    /// sink.
    pub fn classify(
        &self,
        root_failure: &Failure,
        document: &Value,
        sink: &dyn ResultsSink,
        query: Option<&QueryContext>,
    ) -> Result<(), ClassifyError> {
        for leaf in flatten(std::slice::from_ref(root_failure)) {
            self.classify_leaf(leaf, document, sink, query)?;
        }

        let cx = self.context(root_failure, document, query);
        if let Some(record) = rules::root_structure(&cx)? {
            tracing::debug!(code = record.code(), value = record.value(), "root structure record");
            sink.add(record);
        }
        Ok(())
    }

    fn classify_leaf(
        &self,
        leaf: &Failure,
        document: &Value,
        sink: &dyn ResultsSink,
        query: Option<&QueryContext>,
    ) -> Result<(), ClassifyError> {
        let cx = self.context(leaf, document, query);
        let mut matched = false;
        for rule in &self.rules {
            if !rule.matches(&cx) {
                continue;
            }
            matched = true;
            for record in rule.apply(&cx)? {
                tracing::debug!(
                    rule = rule.name(),
                    code = record.code(),
                    value = record.value(),
                    "classified failure"
                );
                sink.add(record);
            }
        }

        if !matched {
            tracing::warn!(pointer = leaf.pointer(), message = leaf.message(), "no rule matched failure");
            return Ok(());
        }
        let chain: Vec<ElementId> = leaf.trail().iter().map(|step| step.element).collect();
        if let Some(record) = group::validation_group(&self.index, &chain, leaf.pointer(), document, query)? {
            sink.add(record);
        }
        Ok(())
    }

    /// Document-level checks that JSON Schema cannot express: repeated
    /// event actions.
    pub fn check_document(
        &self,
        document: &Value,
        sink: &dyn ResultsSink,
        query: Option<&QueryContext>,
    ) -> Result<(), ClassifyError> {
        for (array_name, code) in events::EVENT_ARRAYS {
            for (action_pointer, record) in events::duplicate_event_actions(document, array_name, code, query) {
                tracing::debug!(code, value = record.value(), "repeated event action");
                sink.add(record);
                let chain = self.index.document_path(self.root, &action_pointer);
                if let Some(group_record) =
                    group::validation_group(&self.index, &chain, &action_pointer, document, query)?
                {
                    sink.add(group_record);
                }
            }
        }
        Ok(())
    }

    fn context<'a>(
        &'a self,
        failure: &'a Failure,
        document: &'a Value,
        query: Option<&'a QueryContext>,
    ) -> RuleContext<'a> {
        RuleContext::new(&self.index, self.root, failure, document, self.datasets.as_ref(), query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdapct_core::{InMemoryDatasets, ValidatorResults};
    use rdapct_schema::{EdgeKind, TrailStep};
    use serde_json::json;

    fn index() -> Arc<SchemaIndex> {
        Arc::new(
            SchemaIndex::from_document(
                "domain.json",
                &json!({
                    "type": "object",
                    "properties": {
                        "ldhName": {"type": "string", "errorCode": -46101},
                        "port43": {"type": "string", "errorCode": -46102},
                        "nameservers": {"type": "array", "items": {"type": "string"}, "structureInvalid": -46103}
                    },
                    "required": ["ldhName"],
                    "ldhNameMissing": -46100,
                    "structureInvalid": -46104
                }),
            )
            .unwrap(),
        )
    }

    fn classifier(index: Arc<SchemaIndex>) -> Classifier {
        let root = index.root("domain.json").unwrap();
        Classifier::new(index, root, Arc::new(InMemoryDatasets::new()))
    }

    fn leaf(index: &SchemaIndex, pointer: &str, schema_path: &str, detail: &str) -> Failure {
        let root = index.root("domain.json").unwrap();
        let target = index.navigate(root, schema_path);
        let mut failure = Failure::new(pointer, target.element, detail).with_trail(target.trail);
        if let Some(keyword) = target.keyword {
            failure = failure.with_keyword(keyword);
        }
        failure
    }

    #[test]
    fn test_missing_key_record() {
        let index = index();
        let classifier = classifier(Arc::clone(&index));
        let failure = leaf(&index, "#", "/required", "required key [ldhName] not found");
        let doc = json!({"port43": "whois.example"});
        let sink = ValidatorResults::new();
        classifier.classify(&failure, &doc, &sink, None).unwrap();

        let records = sink.sorted();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code(), -46100);
        assert_eq!(records[0].message(), "The ldhName element does not exist.");
    }

    #[test]
    fn test_every_leaf_is_classified() {
        let index = index();
        let classifier = classifier(Arc::clone(&index));
        let root = index.root("domain.json").unwrap();
        let causes = vec![
            leaf(&index, "#/ldhName", "/properties/ldhName/type", "expected type: String, found: Integer"),
            leaf(&index, "#/port43", "/properties/port43/type", "expected type: String, found: Boolean"),
        ];
        let top = Failure::new("#", root, "2 schema violations found")
            .with_trail(vec![TrailStep {
                element: root,
                edge: EdgeKind::Root,
            }])
            .with_causes(causes);
        let doc = json!({"ldhName": 1, "port43": true});
        let sink = ValidatorResults::new();
        classifier.classify(&top, &doc, &sink, None).unwrap();

        let codes: Vec<i32> = sink.sorted().iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec![-46102, -46101]);
        assert_eq!(sink.with_code(-46101)[0].value(), "#/ldhName:1");
        assert_eq!(sink.with_code(-46102)[0].message(), "The JSON value is not a string.");
    }

    #[test]
    fn test_array_type_mismatch_is_structural() {
        let index = index();
        let classifier = classifier(Arc::clone(&index));
        let failure = leaf(
            &index,
            "#/nameservers",
            "/properties/nameservers/type",
            "expected type: JSONArray, found: String",
        );
        let doc = json!({"ldhName": "x.example", "nameservers": "ns1.example"});
        let sink = ValidatorResults::new();
        classifier.classify(&failure, &doc, &sink, None).unwrap();

        let records = sink.sorted();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code(), -46103);
        assert_eq!(records[0].message(), "The #/nameservers structure is not syntactically valid.");
    }

    #[test]
    fn test_query_context_is_attached() {
        let index = index();
        let classifier = classifier(Arc::clone(&index));
        let failure = leaf(&index, "#", "/required", "required key [ldhName] not found");
        let sink = ValidatorResults::new();
        let query = QueryContext::get("https://rdap.example/domain/x.example", 200);
        classifier.classify(&failure, &json!({}), &sink, Some(&query)).unwrap();
        assert_eq!(sink.sorted()[0].context(), Some(&query));
    }

    #[test]
    fn test_missing_code_aborts() {
        let index = index();
        let classifier = classifier(Arc::clone(&index));
        let failure = leaf(&index, "#", "/required", "required key [handle] not found");
        let sink = ValidatorResults::new();
        let err = classifier.classify(&failure, &json!({}), &sink, None).unwrap_err();
        assert!(matches!(err, ClassifyError::MissingMetadata { ref key, .. } if key == "handleMissing"));
    }

    #[test]
    fn test_strict_rejects_gaps() {
        let index = Arc::new(
            SchemaIndex::from_document("d.json", &json!({"type": "object", "required": ["handle"]})).unwrap(),
        );
        let root = index.root("d.json").unwrap();
        let err = Classifier::strict(index, root, Arc::new(InMemoryDatasets::new())).unwrap_err();
        match err {
            ClassifyError::AuditFailed { gaps } => {
                assert!(gaps.iter().any(|g| g.key == "handleMissing"));
                assert!(gaps.iter().any(|g| g.key == "structureInvalid"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unmatched_leaf_produces_nothing() {
        let index = index();
        let classifier = classifier(Arc::clone(&index));
        let failure = leaf(&index, "#/ldhName", "/properties/ldhName/maxLength", "string is too long");
        let sink = ValidatorResults::new();
        classifier.classify(&failure, &json!({"ldhName": "x"}), &sink, None).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_check_document_reports_repeated_actions() {
        let index = index();
        let classifier = classifier(index);
        let doc = json!({"events": [{"eventAction": "registration"}, {"eventAction": "registration"}]});
        let sink = ValidatorResults::new();
        classifier.check_document(&doc, &sink, None).unwrap();
        assert_eq!(sink.with_code(-10912).len(), 1);
    }
}
