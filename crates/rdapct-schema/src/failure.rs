//! # Failure Trees
//!
//! A [`Failure`] is one node of the tree produced by schema validation.
//! Combinator violations carry the failures of each branch as
//! sub-failures; everything else is a leaf.
//!
//! Messages follow the `<pointer>: <detail>` shape, e.g.
//! `#/ldhName: expected type: String, found: Integer`. Classification
//! recognises failures by the detail part.

use crate::element::ElementId;

/// How the schema trail reached an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// The document's root schema.
    Root,
    Property,
    Items,
    Contains,
    /// A branch of `allOf`/`anyOf`/`oneOf`.
    Branch,
    /// Substitution of a `$ref` by its target.
    Reference,
    Definition,
}

impl EdgeKind {
    /// Container edges wrap a value schema without naming a new property.
    /// Metadata lookup climbs through them.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            EdgeKind::Items | EdgeKind::Contains | EdgeKind::Branch | EdgeKind::Reference
        )
    }
}

/// One element on the schema trail and the edge that reached it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailStep {
    pub element: ElementId,
    pub edge: EdgeKind,
}

/// One node of a validation failure tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    message: String,
    pointer: String,
    violated: ElementId,
    trail: Vec<TrailStep>,
    keyword: Option<String>,
    schema_location: Option<String>,
    causes: Vec<Failure>,
}

impl Failure {
    /// A leaf failure at `pointer` rejected by `violated`. The message is
    /// prefixed with the pointer.
    pub fn new(pointer: impl Into<String>, violated: ElementId, detail: &str) -> Self {
        let pointer = pointer.into();
        Self {
            message: format!("{pointer}: {detail}"),
            pointer,
            violated,
            trail: vec![TrailStep {
                element: violated,
                edge: EdgeKind::Root,
            }],
            keyword: None,
            schema_location: None,
            causes: Vec::new(),
        }
    }

    /// Replace the schema trail. The last step should be the violated
    /// element.
    pub fn with_trail(mut self, trail: Vec<TrailStep>) -> Self {
        if !trail.is_empty() {
            self.trail = trail;
        }
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_schema_location(mut self, location: impl Into<String>) -> Self {
        self.schema_location = Some(location.into());
        self
    }

    pub fn with_causes(mut self, causes: Vec<Failure>) -> Self {
        self.causes = causes;
        self
    }

    /// Full message, `<pointer>: <detail>`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Message without the leading pointer.
    pub fn detail(&self) -> &str {
        self.message
            .strip_prefix(self.pointer.as_str())
            .and_then(|rest| rest.strip_prefix(": "))
            .unwrap_or(&self.message)
    }

    /// `#`-prefixed pointer of the offending location.
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    pub fn violated(&self) -> ElementId {
        self.violated
    }

    /// Elements from the root schema to the violated element.
    pub fn trail(&self) -> &[TrailStep] {
        &self.trail
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn schema_location(&self) -> Option<&str> {
        self.schema_location.as_deref()
    }

    pub fn causes(&self) -> &[Failure] {
        &self.causes
    }

    pub fn is_leaf(&self) -> bool {
        self.causes.is_empty()
    }

    /// Leaf failures under this one, depth first.
    pub fn leaves(&self) -> Vec<&Failure> {
        flatten(std::slice::from_ref(self))
    }
}

/// Collect every leaf failure, depth first, preserving sub-failure order.
///
/// A failure with sub-failures is never part of the output; its children
/// are flattened in its place.
pub fn flatten(roots: &[Failure]) -> Vec<&Failure> {
    let mut out = Vec::new();
    for failure in roots {
        collect_leaves(failure, &mut out);
    }
    out
}

fn collect_leaves<'a>(failure: &'a Failure, out: &mut Vec<&'a Failure>) {
    if failure.is_leaf() {
        out.push(failure);
    } else {
        for cause in &failure.causes {
            collect_leaves(cause, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(pointer: &str) -> Failure {
        Failure::new(pointer, ElementId(0), "leaf")
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(flatten(&[]).is_empty());
    }

    #[test]
    fn single_leaf_is_its_own_flattening() {
        let f = leaf("#/a");
        let out = flatten(std::slice::from_ref(&f));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].pointer(), "#/a");
    }

    #[test]
    fn nested_order_is_depth_first() {
        let tree = Failure::new("#", ElementId(0), "2 schema violations found").with_causes(vec![
            Failure::new("#/x", ElementId(0), "no subschema matched out of the total 2 subschemas")
                .with_causes(vec![leaf("#/x/0"), leaf("#/x/1")]),
            leaf("#/y"),
        ]);
        let pointers: Vec<&str> = tree.leaves().iter().map(|f| f.pointer()).collect();
        assert_eq!(pointers, vec!["#/x/0", "#/x/1", "#/y"]);
    }

    #[test]
    fn detail_strips_pointer() {
        let f = Failure::new("#/ldhName", ElementId(3), "expected type: String, found: Integer");
        assert_eq!(f.message(), "#/ldhName: expected type: String, found: Integer");
        assert_eq!(f.detail(), "expected type: String, found: Integer");
    }

    #[test]
    fn container_edges() {
        assert!(EdgeKind::Branch.is_container());
        assert!(EdgeKind::Reference.is_container());
        assert!(EdgeKind::Items.is_container());
        assert!(!EdgeKind::Property.is_container());
        assert!(!EdgeKind::Root.is_container());
    }
}
