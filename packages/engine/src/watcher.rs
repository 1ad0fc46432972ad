//! # Change Watcher
//!
//! Keeps a live document converted as the host mutates it.
//!
//! ## State machine
//!
//! ```text
//!            batch arrives
//!   Idle ───────────────────→ Processing
//!    ↑    unsubscribe, handle     │
//!    └────── every record, ───────┘
//!            resubscribe
//! ```
//!
//! The converter's own writes would otherwise come back as fresh change
//! records and be reprocessed forever. The feed subscription is therefore
//! dropped for the whole batch and restored only after the last record is
//! handled; anything recorded in between is discarded, not queued.
//!
//! A batch that shows up while another is being processed is dropped. The
//! [`WatcherState`] guard makes that an explicit, checkable invariant.

use crate::converter::{ConversionStats, Converter};
use raqam_dom::{ChangeFeed, ChangeRecord, Document, NodeData, NodeId, ObserverId};
use std::cell::Cell;
use std::fmt;
use tracing::{debug, info, instrument, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherPhase {
    Idle,
    Processing,
}

/// Processing flag plus the live subscription
#[derive(Debug)]
pub struct WatcherState {
    phase: Cell<WatcherPhase>,
    subscription: Cell<Option<ObserverId>>,
    root: Cell<Option<NodeId>>,
}

impl WatcherState {
    pub fn new() -> Self {
        Self {
            phase: Cell::new(WatcherPhase::Idle),
            subscription: Cell::new(None),
            root: Cell::new(None),
        }
    }

    pub fn phase(&self) -> WatcherPhase {
        self.phase.get()
    }

    pub fn subscription(&self) -> Option<ObserverId> {
        self.subscription.get()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root.get()
    }

    /// Move Idle → Processing. `None` when a batch is already in progress.
    /// The returned guard moves back to Idle when dropped.
    pub fn try_enter(&self) -> Option<ProcessingGuard<'_>> {
        if self.phase.get() == WatcherPhase::Processing {
            return None;
        }
        self.phase.set(WatcherPhase::Processing);
        Some(ProcessingGuard { phase: &self.phase })
    }
}

impl Default for WatcherState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ProcessingGuard<'a> {
    phase: &'a Cell<WatcherPhase>,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.phase.set(WatcherPhase::Idle);
    }
}

/// What happened to a delivered batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The watcher is not subscribed
    Inactive,
    /// Nothing was pending
    Empty,
    /// Every record was handled
    Processed(ConversionStats),
    /// Arrived during another batch and was discarded
    Dropped { records: usize },
}

pub struct ChangeWatcher {
    converter: Converter,
    feed: Box<dyn ChangeFeed>,
    state: WatcherState,
}

impl ChangeWatcher {
    pub fn new(converter: Converter, feed: Box<dyn ChangeFeed>) -> Self {
        Self {
            converter,
            feed,
            state: WatcherState::new(),
        }
    }

    pub fn state(&self) -> &WatcherState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.subscription().is_some()
    }

    /// Subscribe to changes under `root`. Returns false if already running.
    pub fn start(&mut self, doc: &mut Document, root: NodeId) -> bool {
        if self.is_running() {
            return false;
        }
        let subscription = self.feed.subscribe(doc, root);
        self.state.subscription.set(Some(subscription));
        self.state.root.set(Some(root));
        info!(root = %root, "Change watcher started");
        true
    }

    pub fn stop(&mut self, doc: &mut Document) {
        if let Some(subscription) = self.state.subscription.take() {
            self.feed.unsubscribe(doc, subscription);
            info!("Change watcher stopped");
        }
        self.state.root.set(None);
    }

    /// Drain pending records from the feed and handle them as one batch
    pub fn pump(&mut self, doc: &mut Document) -> BatchOutcome {
        let Some(subscription) = self.state.subscription() else {
            return BatchOutcome::Inactive;
        };
        let records = self.feed.take_records(doc, subscription);
        if records.is_empty() {
            return BatchOutcome::Empty;
        }
        self.handle_batch(doc, records)
    }

    /// Handle one delivered batch, records in delivery order.
    ///
    /// `&mut self` already rules out a nested call and the guard resets the
    /// phase even on unwind, so `Dropped` only fires if the phase invariant
    /// is broken.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn handle_batch(&mut self, doc: &mut Document, records: Vec<ChangeRecord>) -> BatchOutcome {
        let Some(_guard) = self.state.try_enter() else {
            warn!(records = records.len(), "Batch arrived while processing; dropped");
            return BatchOutcome::Dropped {
                records: records.len(),
            };
        };

        let subscription = self.state.subscription.take();
        if let Some(subscription) = subscription {
            self.feed.unsubscribe(doc, subscription);
        }

        let mut stats = ConversionStats::default();
        for record in &records {
            stats += handle_record(&self.converter, doc, record);
        }

        if subscription.is_some() {
            if let Some(root) = self.state.root() {
                let renewed = self.feed.subscribe(doc, root);
                self.state.subscription.set(Some(renewed));
            }
        }

        debug!(
            visited = stats.visited,
            converted = stats.converted,
            "Batch processed"
        );
        BatchOutcome::Processed(stats)
    }
}

impl fmt::Debug for ChangeWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeWatcher")
            .field("converter", &self.converter)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn handle_record(converter: &Converter, doc: &mut Document, record: &ChangeRecord) -> ConversionStats {
    match record {
        ChangeRecord::CharacterData { target } => converter.convert_node(doc, *target),
        ChangeRecord::ChildList { added, .. } => {
            let mut stats = ConversionStats::default();
            for node in added {
                // Moved away or removed again later in the same batch
                if doc.parent(*node).is_none() {
                    trace!(node = %node, "Skipping detached addition");
                    continue;
                }
                match doc.get(*node).map(|n| n.data()) {
                    Some(NodeData::Text(_)) | Some(NodeData::Element(_)) => {
                        stats += converter.convert_node(doc, *node);
                    }
                    _ => {}
                }
            }
            stats
        }
        other => {
            trace!(kind = other.kind(), "Ignoring change record");
            ConversionStats::default()
        }
    }
}
