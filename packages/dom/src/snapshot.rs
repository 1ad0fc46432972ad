//! Serializable, owned copies of document trees.
//!
//! Snapshots are how documents enter and leave the process: the CLI and the
//! WASM bindings read them as JSON, build a [`Document`], and write the
//! converted tree back out.

use crate::{Document, DomResult, NodeData, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Owned tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeSnapshot {
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<NodeSnapshot>,
    },

    Text { content: String },

    Comment { content: String },
}

impl NodeSnapshot {
    pub fn element(tag: impl Into<String>) -> Self {
        NodeSnapshot::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        NodeSnapshot::Text {
            content: content.into(),
        }
    }

    pub fn comment(content: impl Into<String>) -> Self {
        NodeSnapshot::Comment {
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let NodeSnapshot::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.with_attr("class", class)
    }

    pub fn with_child(mut self, child: NodeSnapshot) -> Self {
        if let NodeSnapshot::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: Vec<NodeSnapshot>) -> Self {
        if let NodeSnapshot::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    fn is_element(&self, name: &str) -> bool {
        matches!(self, NodeSnapshot::Element { tag, .. } if tag.eq_ignore_ascii_case(name))
    }
}

impl Document {
    /// Build a document from a snapshot.
    ///
    /// An `html` snapshot becomes the root. A `body` snapshot becomes the
    /// body. Anything else is placed inside a fresh body. The result is
    /// fully loaded; adjust [`Document::set_ready_state`] to simulate loading.
    pub fn from_snapshot(snapshot: &NodeSnapshot) -> DomResult<Self> {
        let mut doc = Document::bare();
        let root = doc.root();

        match snapshot {
            NodeSnapshot::Element {
                attributes,
                children,
                ..
            } if snapshot.is_element("html") => {
                for (name, value) in attributes {
                    doc.set_attribute(root, name.as_str(), value.as_str())?;
                }
                for child in children {
                    let id = doc.build(child)?;
                    doc.append_child(root, id)?;
                }
            }
            other => {
                let id = doc.build(other)?;
                if other.is_element("body") {
                    doc.append_child(root, id)?;
                } else {
                    let body = doc.create_element("body");
                    doc.append_child(root, body)?;
                    doc.append_child(body, id)?;
                }
            }
        }

        let existing = doc
            .children(root)
            .iter()
            .copied()
            .find(|id| doc.element(*id).map(|el| el.is("body")).unwrap_or(false));
        let body = match existing {
            Some(body) => body,
            None => {
                let body = doc.create_element("body");
                doc.append_child(root, body)?;
                body
            }
        };
        doc.set_body(body);
        Ok(doc)
    }

    fn build(&mut self, snapshot: &NodeSnapshot) -> DomResult<NodeId> {
        match snapshot {
            NodeSnapshot::Element {
                tag,
                attributes,
                children,
            } => {
                let id = self.create_element(tag.as_str());
                for (name, value) in attributes {
                    self.set_attribute(id, name.as_str(), value.as_str())?;
                }
                for child in children {
                    let child_id = self.build(child)?;
                    self.append_child(id, child_id)?;
                }
                Ok(id)
            }
            NodeSnapshot::Text { content } => Ok(self.create_text(content.as_str())),
            NodeSnapshot::Comment { content } => Ok(self.create_comment(content.as_str())),
        }
    }

    /// Snapshot of the whole document
    pub fn snapshot(&self) -> NodeSnapshot {
        // The root always exists
        self.snapshot_of(self.root())
            .unwrap_or_else(|| NodeSnapshot::element("html"))
    }

    /// Snapshot of the subtree at `id`, `None` for unknown handles
    pub fn snapshot_of(&self, id: NodeId) -> Option<NodeSnapshot> {
        let node = self.get(id)?;
        Some(match node.data() {
            NodeData::Element(el) => NodeSnapshot::Element {
                tag: el.tag().to_string(),
                attributes: el
                    .attributes()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                children: el
                    .children()
                    .iter()
                    .filter_map(|child| self.snapshot_of(*child))
                    .collect(),
            },
            NodeData::Text(content) => NodeSnapshot::text(content.as_str()),
            NodeData::Comment(content) => NodeSnapshot::comment(content.as_str()),
        })
    }
}
