//! Subscription configuration engine for an Alertmanager chat bridge.
//!
//! `alertbot-routing` owns the Alertmanager configuration document that decides which
//! chat receives which alert group. It parses the document, applies receiver and route
//! changes, and writes it back through a [`ConfigStore`] before asking the engine to
//! reload.
//!
//! # Example
//!
//! ```rust
//! use alertbot_routing::{ConfigDocument, Match, ReceiverId};
//!
//! let mut doc = ConfigDocument::from_yaml("route:\n  receiver: default\n").unwrap();
//! let chat = ReceiverId::new(1234);
//!
//! doc.add_receiver(chat, "http://bot:8000/webhook");
//! doc.add_route(chat, Match::group("node")).unwrap();
//!
//! assert_eq!(doc.subscribed_groups(chat), vec!["node".to_string()]);
//! ```
//!
//! Mutations against a live record go through [`MutationEngine`], which serializes
//! writers and skips the write when the change is a no-op.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod document;
pub mod engine;
pub mod error;
pub mod store;

pub use document::{
    ALERT_GROUP_LABEL, ConfigDocument, Match, ReceiverId, Receiver, Route, RouteTree,
    WebhookConfig,
};
pub use engine::{MutationEngine, Outcome, Reloader};
pub use error::{Result, RoutingError};
pub use store::{ConfigStore, DEFAULT_CONFIG_KEY, MemoryStore, Revision, Snapshot, StoreRecord};
