//! # Bootstrapper
//!
//! Owns the engine lifecycle for one document: initial full pass, then the
//! live watcher when a change feed is available.
//!
//! ```text
//! start ──loading──→ Deferred ──on_ready──┐
//!   │                                     ↓
//!   └─────────────────────────────→ full pass ──feed?──→ Live
//!                                         │
//!                                         └──no feed──→ Static
//! ```

use crate::config::{EngineConfig, RootSelector};
use crate::converter::{ConversionStats, Converter};
use crate::exclusion::ExclusionPolicy;
use crate::watcher::{BatchOutcome, ChangeWatcher};
use raqam_dom::{ChangeFeed, Document, ReadyState};
use tracing::{debug, info, instrument};

/// Result of starting the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Document still loading; call [`Bootstrapper::on_ready`] later
    Deferred,
    /// One-time pass done, no change feed to follow updates
    Static(ConversionStats),
    /// Pass done and watcher armed
    Live(ConversionStats),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPhase {
    Created,
    Deferred,
    Static,
    Live,
    Stopped,
}

#[derive(Debug)]
pub struct Bootstrapper {
    converter: Converter,
    watcher: Option<ChangeWatcher>,
    root: RootSelector,
    phase: BootPhase,
}

impl Bootstrapper {
    pub fn new(config: &EngineConfig, feed: Option<Box<dyn ChangeFeed>>) -> Self {
        Self::with_policy(config.policy(), config.root, feed)
    }

    pub fn with_policy(
        policy: ExclusionPolicy,
        root: RootSelector,
        feed: Option<Box<dyn ChangeFeed>>,
    ) -> Self {
        let converter = Converter::new(policy);
        let watcher = feed.map(|feed| ChangeWatcher::new(converter.clone(), feed));
        Self {
            converter,
            watcher,
            root,
            phase: BootPhase::Created,
        }
    }

    pub fn phase(&self) -> BootPhase {
        self.phase
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn watcher(&self) -> Option<&ChangeWatcher> {
        self.watcher.as_ref()
    }

    /// Activate now, or defer until the document has finished loading
    pub fn start(&mut self, doc: &mut Document) -> Activation {
        if doc.ready_state() == ReadyState::Loading {
            info!("Document still loading; deferring conversion");
            self.phase = BootPhase::Deferred;
            return Activation::Deferred;
        }
        self.activate(doc)
    }

    /// Ready signal from the host. Completes a deferred start; `None` when
    /// nothing was waiting or the document is still loading.
    pub fn on_ready(&mut self, doc: &mut Document) -> Option<Activation> {
        if self.phase != BootPhase::Deferred || doc.ready_state() == ReadyState::Loading {
            return None;
        }
        Some(self.activate(doc))
    }

    #[instrument(skip_all)]
    fn activate(&mut self, doc: &mut Document) -> Activation {
        let root = self.root.resolve(doc);
        let stats = self.converter.convert_subtree(doc, root);
        info!(
            visited = stats.visited,
            converted = stats.converted,
            "Initial conversion pass complete"
        );

        match &mut self.watcher {
            Some(watcher) => {
                watcher.start(doc, root);
                self.phase = BootPhase::Live;
                Activation::Live(stats)
            }
            None => {
                debug!("No change feed; conversion stays static");
                self.phase = BootPhase::Static;
                Activation::Static(stats)
            }
        }
    }

    /// Deliver pending change records to the watcher
    pub fn pump(&mut self, doc: &mut Document) -> BatchOutcome {
        match (&mut self.watcher, self.phase) {
            (Some(watcher), BootPhase::Live) => watcher.pump(doc),
            _ => BatchOutcome::Inactive,
        }
    }

    pub fn stop(&mut self, doc: &mut Document) {
        if let Some(watcher) = &mut self.watcher {
            watcher.stop(doc);
        }
        self.phase = BootPhase::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raqam_dom::{NodeSnapshot, ObserverFeed};

    fn brochure() -> Document {
        let snapshot = NodeSnapshot::element("html")
            .with_child(
                NodeSnapshot::element("head")
                    .with_child(NodeSnapshot::element("title").with_child(NodeSnapshot::text("Tour 7"))),
            )
            .with_child(
                NodeSnapshot::element("body")
                    .with_child(NodeSnapshot::element("h2").with_child(NodeSnapshot::text("4 days"))),
            );
        Document::from_snapshot(&snapshot).unwrap()
    }

    fn live_feed() -> Option<Box<dyn ChangeFeed>> {
        Some(Box::new(ObserverFeed::default()))
    }

    #[test]
    fn test_static_without_feed() {
        let mut doc = brochure();
        let mut boot = Bootstrapper::new(&EngineConfig::default(), None);

        let activation = boot.start(&mut doc);
        assert_eq!(
            activation,
            Activation::Static(ConversionStats { visited: 1, converted: 1 })
        );
        assert_eq!(boot.phase(), BootPhase::Static);
        assert!(boot.watcher().is_none());

        let body = doc.body();
        let text = doc.create_text("5");
        doc.append_child(body, text).unwrap();
        assert_eq!(boot.pump(&mut doc), BatchOutcome::Inactive);
        assert_eq!(doc.text(text), Some("5"));
    }

    #[test]
    fn test_body_root_leaves_head_alone() {
        let mut doc = brochure();
        let mut boot = Bootstrapper::new(&EngineConfig::default(), None);
        boot.start(&mut doc);

        let root = doc.root();
        assert_eq!(doc.text_content(root), "Tour 7۴ days");
    }

    #[test]
    fn test_document_root_converts_head() {
        let mut doc = brochure();
        let config = EngineConfig {
            root: RootSelector::Document,
            ..EngineConfig::default()
        };
        let mut boot = Bootstrapper::new(&config, None);
        boot.start(&mut doc);

        let root = doc.root();
        assert_eq!(doc.text_content(root), "Tour ۷۴ days");
    }

    #[test]
    fn test_live_activation_arms_watcher() {
        let mut doc = brochure();
        let mut boot = Bootstrapper::new(&EngineConfig::default(), live_feed());

        assert!(matches!(boot.start(&mut doc), Activation::Live(_)));
        assert_eq!(boot.phase(), BootPhase::Live);
        assert!(boot.watcher().map(ChangeWatcher::is_running).unwrap_or(false));

        let body = doc.body();
        let text = doc.create_text("Seat 12");
        doc.append_child(body, text).unwrap();
        assert!(matches!(boot.pump(&mut doc), BatchOutcome::Processed(_)));
        assert_eq!(doc.text(text), Some("Seat ۱۲"));
    }

    #[test]
    fn test_deferred_until_ready() {
        let mut doc = brochure();
        doc.set_ready_state(ReadyState::Loading);
        let mut boot = Bootstrapper::new(&EngineConfig::default(), live_feed());

        assert_eq!(boot.start(&mut doc), Activation::Deferred);
        assert_eq!(boot.on_ready(&mut doc), None);
        assert_eq!(doc.text_content(doc.body()), "4 days");

        doc.set_ready_state(ReadyState::Interactive);
        assert!(matches!(boot.on_ready(&mut doc), Some(Activation::Live(_))));
        assert_eq!(doc.text_content(doc.body()), "۴ days");

        // A second ready signal does nothing
        assert_eq!(boot.on_ready(&mut doc), None);
    }

    #[test]
    fn test_stop_disarms() {
        let mut doc = brochure();
        let mut boot = Bootstrapper::new(&EngineConfig::default(), live_feed());
        boot.start(&mut doc);
        boot.stop(&mut doc);

        assert_eq!(boot.phase(), BootPhase::Stopped);
        let body = doc.body();
        let text = doc.create_text("8");
        doc.append_child(body, text).unwrap();
        assert_eq!(boot.pump(&mut doc), BatchOutcome::Inactive);
        assert_eq!(doc.text(text), Some("8"));
    }
}
