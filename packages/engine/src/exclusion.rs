//! # Exclusion Policy
//!
//! Decides which parts of a document must never be rewritten. It is the single
//! authority consulted before any text is touched.
//!
//! A node is excluded when it, or any ancestor, matches a marker:
//! - an opt-out class (`no-persian-digits`, `keep-latin-digits`)
//! - a forbidden element kind (`script`, `style`, `input`, `textarea`,
//!   `select`, `option`)
//! - an editable region (`contenteditable` set to `""`, `true` or
//!   `plaintext-only`)
//!
//! Text and comment nodes are judged by their parent chain. Nothing is cached:
//! every query re-reads the tree.

use raqam_dom::{Document, Element, NodeId};
use serde::{Deserialize, Serialize};

pub const OPT_OUT_CLASSES: &[&str] = &["no-persian-digits", "keep-latin-digits"];

pub const FORBIDDEN_TAGS: &[&str] = &["script", "style", "input", "textarea", "select", "option"];

pub const EDITABLE_ATTRIBUTE: &str = "contenteditable";

pub const EDITABLE_VALUES: &[&str] = &["", "true", "plaintext-only"];

/// How an attribute marker compares values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttrMatch {
    /// Present with any value
    Any,
    /// Present with one of these values (ASCII case-insensitive)
    OneOf(Vec<String>),
}

impl AttrMatch {
    fn accepts(&self, value: &str) -> bool {
        match self {
            AttrMatch::Any => true,
            AttrMatch::OneOf(values) => values
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(value.trim())),
        }
    }
}

/// One way of flagging a subtree as off-limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExclusionMarker {
    Class { name: String },
    Tag { name: String },
    Attribute { name: String, values: AttrMatch },
}

impl ExclusionMarker {
    pub fn class(name: impl Into<String>) -> Self {
        ExclusionMarker::Class { name: name.into() }
    }

    pub fn tag(name: impl Into<String>) -> Self {
        ExclusionMarker::Tag { name: name.into() }
    }

    pub fn attribute(name: impl Into<String>, values: AttrMatch) -> Self {
        ExclusionMarker::Attribute {
            name: name.into(),
            values,
        }
    }

    pub fn matches(&self, element: &Element) -> bool {
        match self {
            ExclusionMarker::Class { name } => element.has_class(name),
            ExclusionMarker::Tag { name } => element.is(name),
            ExclusionMarker::Attribute { name, values } => element
                .attribute(name)
                .map(|value| values.accepts(value))
                .unwrap_or(false),
        }
    }
}

/// Immutable set of exclusion markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionPolicy {
    markers: Vec<ExclusionMarker>,
}

impl ExclusionPolicy {
    pub fn new(markers: Vec<ExclusionMarker>) -> Self {
        Self { markers }
    }

    /// Policy with no markers; only useful in tests and as a building block
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_marker(mut self, marker: ExclusionMarker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn markers(&self) -> &[ExclusionMarker] {
        &self.markers
    }

    /// Whether this element alone carries a marker (ancestors not consulted)
    pub fn matches_element(&self, element: &Element) -> bool {
        self.markers.iter().any(|marker| marker.matches(element))
    }

    /// Whether `id` lies in an excluded region.
    ///
    /// Elements are checked from themselves upward, other nodes from their
    /// parent upward. Unknown handles count as excluded.
    pub fn is_excluded(&self, doc: &Document, id: NodeId) -> bool {
        let Some(node) = doc.get(id) else {
            return true;
        };
        let start = if node.is_element() {
            Some(id)
        } else {
            node.parent()
        };

        start
            .map(|start| {
                doc.ancestors(start)
                    .filter_map(|ancestor| doc.element(ancestor))
                    .any(|element| self.matches_element(element))
            })
            .unwrap_or(false)
    }
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        let classes = OPT_OUT_CLASSES.iter().map(|c| ExclusionMarker::class(*c));
        let tags = FORBIDDEN_TAGS.iter().map(|t| ExclusionMarker::tag(*t));
        let editable = ExclusionMarker::attribute(
            EDITABLE_ATTRIBUTE,
            AttrMatch::OneOf(EDITABLE_VALUES.iter().map(|v| v.to_string()).collect()),
        );

        Self::new(classes.chain(tags).chain(std::iter::once(editable)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raqam_dom::NodeSnapshot;

    /// body > [wrapper > text] and returns (doc, wrapper, text)
    fn wrapped(wrapper: NodeSnapshot) -> (Document, NodeId, NodeId) {
        let doc = Document::from_snapshot(&wrapper.with_child(NodeSnapshot::text("12"))).unwrap();
        let wrapper = doc.children(doc.body())[0];
        let text = doc.children(wrapper)[0];
        (doc, wrapper, text)
    }

    #[test]
    fn test_plain_text_is_eligible() {
        let (doc, wrapper, text) = wrapped(NodeSnapshot::element("span"));
        let policy = ExclusionPolicy::default();

        assert!(!policy.is_excluded(&doc, text));
        assert!(!policy.is_excluded(&doc, wrapper));
        assert!(!policy.is_excluded(&doc, doc.root()));
    }

    #[test]
    fn test_opt_out_classes() {
        let policy = ExclusionPolicy::default();
        for class in OPT_OUT_CLASSES {
            let (doc, _, text) =
                wrapped(NodeSnapshot::element("div").with_class(format!("card {class}")));
            assert!(policy.is_excluded(&doc, text), "class {class}");
        }
    }

    #[test]
    fn test_forbidden_tags_any_case() {
        let policy = ExclusionPolicy::default();
        for tag in FORBIDDEN_TAGS {
            let (doc, _, text) = wrapped(NodeSnapshot::element(tag.to_uppercase()));
            assert!(policy.is_excluded(&doc, text), "tag {tag}");
        }
    }

    #[test]
    fn test_editable_values() {
        let policy = ExclusionPolicy::default();
        for (value, excluded) in [
            ("", true),
            ("true", true),
            ("TRUE", true),
            ("plaintext-only", true),
            ("false", false),
            ("inherit", false),
        ] {
            let (doc, _, text) =
                wrapped(NodeSnapshot::element("div").with_attr("contenteditable", value));
            assert_eq!(policy.is_excluded(&doc, text), excluded, "value {value:?}");
        }
    }

    #[test]
    fn test_marker_on_distant_ancestor() {
        let snapshot = NodeSnapshot::element("section")
            .with_class("no-persian-digits")
            .with_child(
                NodeSnapshot::element("div")
                    .with_child(NodeSnapshot::element("b").with_child(NodeSnapshot::text("7"))),
            );
        let doc = Document::from_snapshot(&snapshot).unwrap();
        let section = doc.children(doc.body())[0];
        let div = doc.children(section)[0];
        let b = doc.children(div)[0];
        let text = doc.children(b)[0];

        let policy = ExclusionPolicy::default();
        assert!(policy.is_excluded(&doc, text));
        assert!(policy.is_excluded(&doc, b));
        assert!(!policy.is_excluded(&doc, doc.body()));
    }

    #[test]
    fn test_detached_and_unknown_nodes() {
        let mut doc = Document::new();
        let orphan = doc.create_text("5");
        let policy = ExclusionPolicy::default();

        // no parent chain to match against
        assert!(!policy.is_excluded(&doc, orphan));

        let other = Document::loading();
        assert!(policy.is_excluded(&other, orphan));
    }

    #[test]
    fn test_custom_markers() {
        let policy = ExclusionPolicy::empty()
            .with_marker(ExclusionMarker::attribute("data-raw", AttrMatch::Any))
            .with_marker(ExclusionMarker::tag("code"));

        let (doc, _, text) = wrapped(NodeSnapshot::element("span").with_attr("data-raw", "x"));
        assert!(policy.is_excluded(&doc, text));

        let (doc, _, text) = wrapped(NodeSnapshot::element("code"));
        assert!(policy.is_excluded(&doc, text));

        let (doc, _, text) = wrapped(NodeSnapshot::element("script"));
        assert!(!policy.is_excluded(&doc, text));
    }

    #[test]
    fn test_marker_serde_shape() {
        let json = r#"{ "kind": "attribute", "name": "contenteditable", "values": { "oneOf": ["true"] } }"#;
        let marker: ExclusionMarker = serde_json::from_str(json).unwrap();
        assert_eq!(
            marker,
            ExclusionMarker::attribute("contenteditable", AttrMatch::OneOf(vec!["true".into()]))
        );
    }
}
