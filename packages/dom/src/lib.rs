//! # Raqam DOM
//!
//! In-memory document tree that stands in for a browser document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ snapshot: JSON ⇄ NodeSnapshot ⇄ Document    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: arena of element/text/comment     │
//! │  - parent links, ready state                │
//! │  - every write goes through one method      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ observer: queued change records per         │
//! │ observer, exposed through ChangeFeed        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use raqam_dom::{ChangeRecord, Document, ObserveOptions};
//!
//! let mut doc = Document::new();
//! let observer = doc.observe(doc.body(), ObserveOptions::content());
//!
//! let text = doc.create_text("3 nights");
//! doc.append_child(doc.body(), text).unwrap();
//!
//! let records = doc.take_records(observer);
//! assert!(matches!(records[0], ChangeRecord::ChildList { .. }));
//! ```

mod document;
mod errors;
mod html;
mod node;
mod observer;
mod snapshot;

pub use document::{Ancestors, Document, ReadyState};
pub use errors::{DomError, DomResult};
pub use html::{document_to_html, to_html};
pub use node::{Element, Node, NodeData, NodeId};
pub use observer::{ChangeFeed, ChangeRecord, ObserveOptions, ObserverFeed, ObserverId};
pub use snapshot::NodeSnapshot;
