use crate::exclusion::ExclusionPolicy;
use raqam_dom::{Document, NodeData, NodeId};

/// Lazy pre-order walk over the text leaves under a root, skipping excluded
/// subtrees.
///
/// The root is checked against the full ancestor chain once; below it each
/// element only needs its own markers, so pruning costs one check per
/// element. Walking never mutates the tree, so the sequence can be collected
/// before any conversion is applied.
pub struct TextWalker<'a> {
    doc: &'a Document,
    policy: &'a ExclusionPolicy,
    root: NodeId,
    stack: Vec<NodeId>,
}

impl<'a> TextWalker<'a> {
    pub fn new(doc: &'a Document, root: NodeId, policy: &'a ExclusionPolicy) -> Self {
        let mut walker = Self {
            doc,
            policy,
            root,
            stack: Vec::new(),
        };
        walker.reset();
        walker
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Start over from the root
    pub fn reset(&mut self) {
        self.stack.clear();
        if !self.policy.is_excluded(self.doc, self.root) {
            self.stack.push(self.root);
        }
    }
}

impl Iterator for TextWalker<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            match self.doc.get(id).map(|node| node.data()) {
                Some(NodeData::Text(_)) => return Some(id),
                Some(NodeData::Element(element)) => {
                    if id != self.root && self.policy.matches_element(element) {
                        continue;
                    }
                    self.stack.extend(element.children().iter().rev().copied());
                }
                _ => {}
            }
        }
        None
    }
}
