use crate::exclusion::ExclusionPolicy;
use crate::glyph::GlyphMapper;
use crate::walker::TextWalker;
use raqam_dom::{Document, NodeData, NodeId};
use std::ops::AddAssign;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Counts from one or more conversion passes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Text nodes offered to the converter
    pub visited: usize,
    /// Text nodes whose content was rewritten
    pub converted: usize,
}

impl AddAssign for ConversionStats {
    fn add_assign(&mut self, other: Self) {
        self.visited += other.visited;
        self.converted += other.converted;
    }
}

/// Applies the glyph mapping to text nodes that the exclusion policy allows
#[derive(Debug, Clone)]
pub struct Converter {
    policy: Arc<ExclusionPolicy>,
    mapper: GlyphMapper,
}

impl Converter {
    pub fn new(policy: ExclusionPolicy) -> Self {
        Self::shared(Arc::new(policy))
    }

    pub fn shared(policy: Arc<ExclusionPolicy>) -> Self {
        Self {
            policy,
            mapper: GlyphMapper,
        }
    }

    pub fn policy(&self) -> &ExclusionPolicy {
        &self.policy
    }

    /// Rewrite one text node. Returns whether content was written.
    ///
    /// Unknown, non-text, parentless, empty, digit-free and excluded nodes
    /// are left alone. Converted content has no Western digits left, so a
    /// second call is a no-op.
    pub fn convert_text(&self, doc: &mut Document, id: NodeId) -> bool {
        let converted = {
            let Some(node) = doc.get(id) else {
                trace!(node = %id, "Skipping unknown node");
                return false;
            };
            let NodeData::Text(content) = node.data() else {
                trace!(node = %id, "Skipping non-text node");
                return false;
            };
            if node.parent().is_none() {
                trace!(node = %id, "Skipping detached text");
                return false;
            }
            if content.is_empty() {
                trace!(node = %id, "Skipping empty text");
                return false;
            }
            if !self.mapper.needs_mapping(content) {
                trace!(node = %id, "No digits to map");
                return false;
            }
            if self.policy.is_excluded(doc, id) {
                trace!(node = %id, "Skipping excluded text");
                return false;
            }
            self.mapper.map(content).into_owned()
        };

        doc.set_text(id, converted).is_ok()
    }

    /// Walk `root` and convert every eligible text node under it
    #[instrument(skip_all, fields(root = %root))]
    pub fn convert_subtree(&self, doc: &mut Document, root: NodeId) -> ConversionStats {
        let targets: Vec<NodeId> = TextWalker::new(doc, root, &self.policy).collect();

        let mut stats = ConversionStats {
            visited: targets.len(),
            converted: 0,
        };
        for id in targets {
            if self.convert_text(doc, id) {
                stats.converted += 1;
            }
        }

        debug!(visited = stats.visited, converted = stats.converted, "Subtree converted");
        stats
    }

    /// Text nodes are converted directly, elements via a subtree walk
    pub fn convert_node(&self, doc: &mut Document, id: NodeId) -> ConversionStats {
        match doc.get(id).map(|node| node.data()) {
            Some(NodeData::Text(_)) => {
                let converted = self.convert_text(doc, id);
                ConversionStats {
                    visited: 1,
                    converted: usize::from(converted),
                }
            }
            Some(NodeData::Element(_)) => self.convert_subtree(doc, id),
            _ => ConversionStats::default(),
        }
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ExclusionPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raqam_dom::NodeSnapshot;
    use std::sync::Mutex;
    use tracing_subscriber::prelude::*;

    fn price_under(parent: NodeSnapshot) -> (Document, NodeId) {
        let doc = Document::from_snapshot(
            &parent.with_child(NodeSnapshot::text("قیمت: 1250 تومان")),
        )
        .unwrap();
        let wrapper = doc.children(doc.body())[0];
        let text = doc.children(wrapper)[0];
        (doc, text)
    }

    #[test]
    fn test_price_is_converted() {
        let (mut doc, text) = price_under(NodeSnapshot::element("span"));
        let converter = Converter::default();

        assert!(converter.convert_text(&mut doc, text));
        assert_eq!(doc.text(text), Some("قیمت: ۱۲۵۰ تومان"));
    }

    #[test]
    fn test_price_under_opt_out_is_untouched() {
        let (mut doc, text) =
            price_under(NodeSnapshot::element("span").with_class("no-persian-digits"));
        let converter = Converter::default();

        assert!(!converter.convert_text(&mut doc, text));
        assert_eq!(doc.text(text), Some("قیمت: 1250 تومان"));
    }

    #[test]
    fn test_second_call_is_noop() {
        let (mut doc, text) = price_under(NodeSnapshot::element("span"));
        let converter = Converter::default();
        let observer = doc.observe(doc.body(), Default::default());

        assert!(converter.convert_text(&mut doc, text));
        assert!(!converter.convert_text(&mut doc, text));
        assert_eq!(doc.take_records(observer).len(), 1);
    }

    #[test]
    fn test_guards() {
        let mut doc = Document::new();
        let converter = Converter::default();

        let orphan = doc.create_text("42");
        assert!(!converter.convert_text(&mut doc, orphan));
        assert_eq!(doc.text(orphan), Some("42"));

        let empty = doc.create_text("");
        doc.append_child(doc.body(), empty).unwrap();
        assert!(!converter.convert_text(&mut doc, empty));

        let comment = doc.create_comment("42");
        doc.append_child(doc.body(), comment).unwrap();
        assert!(!converter.convert_text(&mut doc, comment));

        let body = doc.body();
        assert!(!converter.convert_text(&mut doc, body));

        // handle from another, larger document
        assert!(!converter.convert_text(&mut Document::new(), orphan));
    }

    struct MessageLog(Arc<Mutex<Vec<String>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for MessageLog {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.0.lock().unwrap().push(visitor.0);
        }
    }

    struct MessageVisitor(String);

    impl tracing::field::Visit for MessageVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                use std::fmt::Write;
                let _ = write!(self.0, "{:?}", value);
            }
        }
    }

    #[test]
    fn test_guards_are_traced() {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(MessageLog(Arc::clone(&messages)));

        tracing::subscriber::with_default(subscriber, || {
            let mut doc = Document::new();
            let body = doc.body();
            let converter = Converter::default();

            let orphan = doc.create_text("42");
            converter.convert_text(&mut doc, orphan);

            let empty = doc.create_text("");
            doc.append_child(body, empty).unwrap();
            converter.convert_text(&mut doc, empty);

            let plain = doc.create_text("no digits");
            doc.append_child(body, plain).unwrap();
            converter.convert_text(&mut doc, plain);

            converter.convert_text(&mut doc, body);
        });

        let messages = messages.lock().unwrap();
        for expected in [
            "Skipping detached text",
            "Skipping empty text",
            "No digits to map",
            "Skipping non-text node",
        ] {
            assert!(
                messages.iter().any(|m| m == expected),
                "missing {expected:?} in {messages:?}"
            );
        }
    }

    #[test]
    fn test_subtree_converts_siblings_but_not_excluded() {
        let snapshot = NodeSnapshot::element("div").with_children(vec![
            NodeSnapshot::element("span").with_child(NodeSnapshot::text("3 nights")),
            NodeSnapshot::element("span")
                .with_attr("contenteditable", "true")
                .with_child(NodeSnapshot::text("Room 12")),
            NodeSnapshot::element("textarea").with_child(NodeSnapshot::text("note 5")),
            NodeSnapshot::text("2 adults"),
        ]);
        let mut doc = Document::from_snapshot(&snapshot).unwrap();
        let converter = Converter::default();

        let body = doc.body();
        let stats = converter.convert_subtree(&mut doc, body);
        assert_eq!(stats, ConversionStats { visited: 2, converted: 2 });
        assert_eq!(doc.text_content(doc.body()), "۳ nightsRoom 12note 5۲ adults");
    }

    #[test]
    fn test_convert_node_dispatch() {
        let (mut doc, text) = price_under(NodeSnapshot::element("p"));
        let converter = Converter::default();

        let stats = converter.convert_node(&mut doc, text);
        assert_eq!(stats, ConversionStats { visited: 1, converted: 1 });

        let body = doc.body();
        let stats = converter.convert_node(&mut doc, body);
        assert_eq!(stats, ConversionStats { visited: 1, converted: 0 });

        let comment = doc.create_comment("1");
        assert_eq!(converter.convert_node(&mut doc, comment), ConversionStats::default());
    }
}
