//! # Document Tree
//!
//! Arena-backed tree of element, text and comment nodes.
//!
//! Every structural or content change goes through a `Document` method so it
//! can be reported to observers (see [`crate::observer`]). Nodes are never
//! freed: detaching a node clears its parent link and leaves the handle
//! usable, which is what lets change records refer to removed nodes.
//!
//! ## Lifecycle
//!
//! ```text
//! Loading → Interactive → Complete
//!    ↓            ↓
//! (build)   (content available to readers)
//! ```

use crate::errors::{DomError, DomResult};
use crate::node::{Element, Node, NodeData, NodeId};
use crate::observer::{ChangeRecord, ObserveOptions, ObserverId, ObserverRegistry};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Loading state of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    ready_state: ReadyState,
    observers: ObserverRegistry,
}

impl Document {
    /// Empty `<html><head></head><body></body></html>` document, fully loaded
    pub fn new() -> Self {
        let mut doc = Self::bare();
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        doc.attach(doc.root, head, None);
        doc.attach(doc.root, body, None);
        doc.body = body;
        doc
    }

    /// Like [`Document::new`] but still loading
    pub fn loading() -> Self {
        let mut doc = Self::new();
        doc.ready_state = ReadyState::Loading;
        doc
    }

    /// Document holding only the `html` root. `body` points at the root
    /// until a real body is located.
    pub(crate) fn bare() -> Self {
        let root = Node {
            parent: None,
            data: NodeData::Element(Element::new("html")),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            body: NodeId(0),
            ready_state: ReadyState::Complete,
            observers: ObserverRegistry::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub(crate) fn set_body(&mut self, body: NodeId) {
        self.body = body;
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    /// Returns the previous state
    pub fn set_ready_state(&mut self, state: ReadyState) -> ReadyState {
        std::mem::replace(&mut self.ready_state, state)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // -- Lookup ------------------------------------------------------------

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.get(id).and_then(Node::as_element)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(Node::as_text)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.element(id).map(Element::children).unwrap_or(&[])
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attribute(name))
    }

    /// `id` followed by each of its ancestors up to the top of its tree
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.get(id).map(|_| id),
        }
    }

    /// True when `ancestor` is `node` or lies on its parent chain
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|id| id == ancestor)
    }

    /// True when the node hangs off the document root
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Concatenated text of every text node under `id`, in document order
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.get(current).map(Node::data) {
                Some(NodeData::Text(content)) => out.push_str(content),
                Some(NodeData::Element(el)) => stack.extend(el.children.iter().rev().copied()),
                _ => {}
            }
        }
        out
    }

    /// First element with the given tag under `id` (inclusive), pre-order
    pub fn find_element(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(el) = self.element(current) {
                if el.is(tag) {
                    return Some(current);
                }
                stack.extend(el.children.iter().rev().copied());
            }
        }
        None
    }

    // -- Construction ------------------------------------------------------

    /// New detached element
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(NodeData::Element(Element::new(tag)))
    }

    /// New detached text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(content.into()))
    }

    /// New detached comment node
    pub fn create_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(content.into()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { parent: None, data });
        id
    }

    // -- Mutation ----------------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference` (or at the end).
    /// A child that already has a parent is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.get(child).ok_or(DomError::UnknownNode(child))?;
        let parent_el = self.element(parent).ok_or_else(|| self.missing_element(parent))?;
        if let Some(reference) = reference {
            if !parent_el.children.contains(&reference) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }

        if let Some(old_parent) = self.parent(child) {
            self.detach(old_parent, child);
            self.record(ChangeRecord::ChildList {
                target: old_parent,
                added: Vec::new(),
                removed: vec![child],
            });
        }

        self.attach(parent, child, reference);
        self.record(ChangeRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let parent_el = self.element(parent).ok_or_else(|| self.missing_element(parent))?;
        if !parent_el.children.contains(&child) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(parent, child);
        self.record(ChangeRecord::ChildList {
            target: parent,
            added: Vec::new(),
            removed: vec![child],
        });
        Ok(())
    }

    /// Replace the content of a text or comment node
    pub fn set_text(&mut self, id: NodeId, content: impl Into<String>) -> DomResult<()> {
        let node = self.nodes.get_mut(id.index()).ok_or(DomError::UnknownNode(id))?;
        match &mut node.data {
            NodeData::Text(current) | NodeData::Comment(current) => *current = content.into(),
            NodeData::Element(_) => return Err(DomError::NotCharacterData(id)),
        }
        self.record(ChangeRecord::CharacterData { target: id });
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> DomResult<()> {
        let name = name.into();
        self.element_mut(id)?.set_attribute(name.clone(), value.into());
        self.record(ChangeRecord::Attributes { target: id, name });
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<bool> {
        let removed = self.element_mut(id)?.remove_attribute(name);
        if removed {
            self.record(ChangeRecord::Attributes {
                target: id,
                name: name.to_string(),
            });
        }
        Ok(removed)
    }

    fn element_mut(&mut self, id: NodeId) -> DomResult<&mut Element> {
        match self.nodes.get_mut(id.index()) {
            Some(Node {
                data: NodeData::Element(el),
                ..
            }) => Ok(el),
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    fn missing_element(&self, id: NodeId) -> DomError {
        if self.get(id).is_some() {
            DomError::NotAnElement(id)
        } else {
            DomError::UnknownNode(id)
        }
    }

    /// Link without validation or notification. Callers guarantee `parent`
    /// is an element and `child` is detached.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if let NodeData::Element(el) = &mut self.nodes[parent.index()].data {
            let position = reference
                .and_then(|r| el.children.iter().position(|c| *c == r))
                .unwrap_or(el.children.len());
            el.children.insert(position, child);
        }
        self.nodes[child.index()].parent = Some(parent);
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        if let NodeData::Element(el) = &mut self.nodes[parent.index()].data {
            el.children.retain(|c| *c != child);
        }
        self.nodes[child.index()].parent = None;
    }

    // -- Observation -------------------------------------------------------

    /// Register an observer for changes at or (with `subtree`) below `root`
    pub fn observe(&mut self, root: NodeId, options: ObserveOptions) -> ObserverId {
        let id = self.observers.register(root, options);
        trace!(observer = ?id, root = %root, "Observer registered");
        id
    }

    /// Unregister an observer and drop its queued records
    pub fn disconnect(&mut self, observer: ObserverId) {
        if self.observers.unregister(observer) {
            trace!(observer = ?observer, "Observer disconnected");
        }
    }

    pub fn take_records(&mut self, observer: ObserverId) -> Vec<ChangeRecord> {
        self.observers.take(observer)
    }

    pub fn pending_records(&self, observer: ObserverId) -> usize {
        self.observers.pending(observer)
    }

    fn record(&mut self, record: ChangeRecord) {
        if self.observers.is_empty() {
            return;
        }
        let nodes = &self.nodes;
        self.observers.deliver(&record, |root, target, subtree| {
            if subtree {
                chain_contains(nodes, root, target)
            } else {
                root == target
            }
        });
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn chain_contains(nodes: &[Node], ancestor: NodeId, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = nodes.get(id.index()).and_then(|n| n.parent);
    }
    false
}

/// Iterator over a node and its ancestors, see [`Document::ancestors`]
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}
