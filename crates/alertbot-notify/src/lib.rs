//! Notification side of the alertbot chat bridge.
//!
//! `alertbot-notify` covers everything between the alert-routing engine and a chat:
//!
//! - **Alert payloads**: webhook bodies and alert listings ([`alert`])
//! - **Formatting**: template rendering and size-safe truncation ([`formatter`])
//! - **Pagination**: per-receiver cursors over selectable lists ([`pagination`])
//! - **Rule groups**: the merged set of alert-group names ([`rules`])
//! - **Engine API**: reload and alert listing over HTTP ([`alertmanager`])
//!
//! # Example
//!
//! ```rust
//! use alertbot_notify::{Alert, MessageTemplate, fit_message};
//!
//! let template = MessageTemplate::builtin("http://alertmanager:9093").unwrap();
//! let text = template.render("42", &[Alert::new("NodeDown")]).unwrap();
//!
//! assert!(fit_message(&text).contains("NodeDown"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod alert;
pub mod alertmanager;
pub mod error;
pub mod formatter;
pub mod pagination;
pub mod rules;

pub use alert::{Alert, AlertStatus, AlertsResponse, ListedAlert, WebhookMessage};
pub use alertmanager::{AlertmanagerClient, AlertmanagerConfig};
pub use error::{NotifyError, Result};
pub use formatter::{
    EMPTY_FALLBACK, MESSAGE_LIMIT, MessageTemplate, TOO_LONG_FALLBACK, TRUNCATION_MARKER,
    escape_html, fit_message, truncate,
};
pub use pagination::{Cursor, CursorMap, DEFAULT_PAGE_SIZE, Page};
pub use rules::{GroupNamesFuture, RuleGroupSource, RuleGroups, StaticRuleGroups};
