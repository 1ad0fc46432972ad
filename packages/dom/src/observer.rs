//! # Change Observation
//!
//! Documents record structural and content changes for every active observer,
//! the way a browser queues mutation records. Records accumulate until the
//! observer drains them with [`Document::take_records`]; disconnecting an
//! observer discards anything still queued.
//!
//! [`ChangeFeed`] is the capability consumers program against. It lets code
//! that reacts to changes run unmodified against hosts that cannot deliver
//! notifications at all (no feed) or that wrap delivery (tests, bindings).

use crate::{Document, NodeId};
use serde::{Deserialize, Serialize};

/// Handle for one registered observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObserverId(pub(crate) u64);

/// Which kinds of change an observer wants to see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserveOptions {
    pub child_list: bool,
    pub character_data: bool,
    pub attributes: bool,
    /// Also report changes to descendants of the observed node
    pub subtree: bool,
}

impl ObserveOptions {
    /// Child additions/removals and text edits anywhere below the target
    pub fn content() -> Self {
        Self {
            child_list: true,
            character_data: true,
            attributes: false,
            subtree: true,
        }
    }

    pub fn with_attributes(mut self) -> Self {
        self.attributes = true;
        self
    }
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self::content()
    }
}

/// A single recorded change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChangeRecord {
    /// Text or comment content was replaced
    CharacterData { target: NodeId },

    /// Children were attached to or detached from `target`
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },

    /// An attribute was set or removed
    Attributes { target: NodeId, name: String },
}

impl ChangeRecord {
    pub fn target(&self) -> NodeId {
        match self {
            ChangeRecord::CharacterData { target }
            | ChangeRecord::ChildList { target, .. }
            | ChangeRecord::Attributes { target, .. } => *target,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChangeRecord::CharacterData { .. } => "characterData",
            ChangeRecord::ChildList { .. } => "childList",
            ChangeRecord::Attributes { .. } => "attributes",
        }
    }
}

#[derive(Debug)]
struct Registration {
    id: ObserverId,
    root: NodeId,
    options: ObserveOptions,
    queue: Vec<ChangeRecord>,
}

impl Registration {
    fn wants(&self, record: &ChangeRecord) -> bool {
        match record {
            ChangeRecord::CharacterData { .. } => self.options.character_data,
            ChangeRecord::ChildList { .. } => self.options.child_list,
            ChangeRecord::Attributes { .. } => self.options.attributes,
        }
    }
}

/// Observer bookkeeping owned by a [`Document`]
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    registrations: Vec<Registration>,
}

impl ObserverRegistry {
    pub(crate) fn register(&mut self, root: NodeId, options: ObserveOptions) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.registrations.push(Registration {
            id,
            root,
            options,
            queue: Vec::new(),
        });
        id
    }

    pub(crate) fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        before != self.registrations.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub(crate) fn take(&mut self, id: ObserverId) -> Vec<ChangeRecord> {
        self.registrations
            .iter_mut()
            .find(|r| r.id == id)
            .map(|r| std::mem::take(&mut r.queue))
            .unwrap_or_default()
    }

    pub(crate) fn pending(&self, id: ObserverId) -> usize {
        self.registrations
            .iter()
            .find(|r| r.id == id)
            .map_or(0, |r| r.queue.len())
    }

    /// Queue `record` for every observer whose scope covers it.
    /// `covers(root, target, subtree)` decides tree containment.
    pub(crate) fn deliver(
        &mut self,
        record: &ChangeRecord,
        covers: impl Fn(NodeId, NodeId, bool) -> bool,
    ) {
        let target = record.target();
        for registration in &mut self.registrations {
            if registration.wants(record)
                && covers(registration.root, target, registration.options.subtree)
            {
                registration.queue.push(record.clone());
            }
        }
    }
}

/// Source of change notifications for a document.
///
/// Implementations must stop queueing records for a subscription once it has
/// been passed to [`ChangeFeed::unsubscribe`].
pub trait ChangeFeed {
    /// Start observing the subtree rooted at `root`
    fn subscribe(&mut self, doc: &mut Document, root: NodeId) -> ObserverId;

    /// Stop observing; queued records are discarded
    fn unsubscribe(&mut self, doc: &mut Document, subscription: ObserverId);

    /// Drain records queued since the last call
    fn take_records(&mut self, doc: &mut Document, subscription: ObserverId) -> Vec<ChangeRecord>;
}

/// [`ChangeFeed`] backed by the document's own observer registry
#[derive(Debug, Clone, Copy, Default)]
pub struct ObserverFeed {
    options: ObserveOptions,
}

impl ObserverFeed {
    pub fn new(options: ObserveOptions) -> Self {
        Self { options }
    }
}

impl ChangeFeed for ObserverFeed {
    fn subscribe(&mut self, doc: &mut Document, root: NodeId) -> ObserverId {
        doc.observe(root, self.options)
    }

    fn unsubscribe(&mut self, doc: &mut Document, subscription: ObserverId) {
        doc.disconnect(subscription);
    }

    fn take_records(&mut self, doc: &mut Document, subscription: ObserverId) -> Vec<ChangeRecord> {
        doc.take_records(subscription)
    }
}
