//! # Raqam Engine
//!
//! Live Persian-digit transliteration for document trees.
//!
//! Every Western digit in visible text is rewritten to its Persian glyph
//! (`1250` → `۱۲۵۰`), first in one pass over the document and then
//! continuously as the host changes the tree. Form controls, scripts,
//! editable regions and opted-out subtrees are never touched.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ bootstrap: initial pass, defer while        │
//! │ loading, arm watcher if a feed exists       │
//! └─────────────────────────────────────────────┘
//!          ↓                        ↓
//! ┌──────────────────┐   ┌──────────────────────┐
//! │ converter        │ ← │ watcher: Idle ⇄      │
//! │  walker + glyph  │   │ Processing per batch │
//! └──────────────────┘   └──────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────────┐
//! │ exclusion: ancestor-walk predicate          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use raqam_dom::{Document, NodeSnapshot, ObserverFeed};
//! use raqam_engine::{Activation, Bootstrapper, EngineConfig};
//!
//! let snapshot = NodeSnapshot::element("p").with_child(NodeSnapshot::text("قیمت: 1250 تومان"));
//! let mut doc = Document::from_snapshot(&snapshot).unwrap();
//!
//! let mut engine = Bootstrapper::new(&EngineConfig::default(), Some(Box::new(ObserverFeed::default())));
//! assert!(matches!(engine.start(&mut doc), Activation::Live(_)));
//! assert_eq!(doc.text_content(doc.body()), "قیمت: ۱۲۵۰ تومان");
//!
//! // Later writes by the host are picked up on the next pump
//! let body = doc.body();
//! let note = doc.create_text("2 seats left");
//! doc.append_child(body, note).unwrap();
//! engine.pump(&mut doc);
//! assert_eq!(doc.text(note), Some("۲ seats left"));
//! ```

mod bootstrap;
mod config;
mod converter;
mod errors;
mod exclusion;
mod glyph;
mod walker;
mod watcher;

pub use bootstrap::{Activation, BootPhase, Bootstrapper};
pub use config::{AttributeRule, EngineConfig, RootSelector, DEFAULT_CONFIG_NAME};
pub use converter::{ConversionStats, Converter};
pub use errors::{ConfigError, ConfigResult};
pub use exclusion::{
    AttrMatch, ExclusionMarker, ExclusionPolicy, EDITABLE_ATTRIBUTE, EDITABLE_VALUES,
    FORBIDDEN_TAGS, OPT_OUT_CLASSES,
};
pub use glyph::{
    contains_western_digit, persian_digit, to_persian_digits, GlyphMapper, PERSIAN_DIGITS,
    WESTERN_DIGITS,
};
pub use walker::TextWalker;
pub use watcher::{BatchOutcome, ChangeWatcher, ProcessingGuard, WatcherPhase, WatcherState};
