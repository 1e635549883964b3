//! Alertmanager-compatible alert payloads.
//!
//! Covers the two shapes the bridge consumes:
//! - [`WebhookMessage`]: the body Alertmanager posts to a webhook receiver
//! - [`AlertsResponse`]: the answer of the v1 alert listing endpoint, where every alert
//!   carries the names of the receivers it was routed to

use std::collections::BTreeMap;
use std::fmt;

use alertbot_routing::ReceiverId;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Label holding the alert name.
pub const ALERT_NAME_LABEL: &str = "alertname";

/// Whether an alert is still active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// The alert is active.
    Firing,
    /// The alert has ended.
    Resolved,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Firing => write!(f, "firing"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

/// A single alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Status as reported by the sender, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AlertStatus>,
    /// Identifying labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Informational annotations.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// When the alert started firing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    /// When the alert ended, or is expected to end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    /// Link to the expression that produced the alert.
    #[serde(default, rename = "generatorURL")]
    pub generator_url: String,
}

impl Alert {
    /// Creates a firing alert with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut labels = BTreeMap::new();
        labels.insert(ALERT_NAME_LABEL.to_string(), name.into());
        Self {
            labels,
            ..Self::default()
        }
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Adds an annotation.
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Sets the end time.
    #[must_use]
    pub const fn with_ends_at(mut self, ends_at: DateTime<Utc>) -> Self {
        self.ends_at = Some(ends_at);
        self
    }

    /// Returns the alert name, or an empty string.
    #[must_use]
    pub fn name(&self) -> &str {
        self.labels.get(ALERT_NAME_LABEL).map_or("", String::as_str)
    }

    /// Resolves the status at `now`.
    ///
    /// An explicit status wins. Otherwise the alert is resolved once its end time has
    /// passed. The zero timestamp some senders use for "no end" counts as unset.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> AlertStatus {
        if let Some(status) = self.status {
            return status;
        }
        match self.ends_at {
            Some(ends_at) if ends_at.year() > 1 && ends_at <= now => AlertStatus::Resolved,
            _ => AlertStatus::Firing,
        }
    }
}

/// Body of a webhook notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookMessage {
    /// Name of the receiver the notification is for.
    pub receiver: String,
    /// The alerts of the notification group.
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

impl WebhookMessage {
    /// Parses the receiver name as a chat id.
    ///
    /// Returns `None` if the receiver is not one the bridge created.
    #[must_use]
    pub fn receiver_id(&self) -> Option<ReceiverId> {
        self.receiver.parse().ok()
    }
}

/// One entry of the alert listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListedAlert {
    /// The alert itself.
    #[serde(flatten)]
    pub alert: Alert,
    /// Receivers the alert was routed to.
    #[serde(default)]
    pub receivers: Vec<String>,
}

/// Response of the v1 alert listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AlertsResponse {
    /// Response status, `success` on success.
    #[serde(default)]
    pub status: String,
    /// Listed alerts.
    #[serde(default)]
    pub data: Vec<ListedAlert>,
}

impl AlertsResponse {
    /// Returns the alerts routed to `receiver`, in listing order.
    #[must_use]
    pub fn for_receiver(self, receiver: ReceiverId) -> Vec<Alert> {
        let name = receiver.name();
        self.data
            .into_iter()
            .filter(|listed| listed.receivers.iter().any(|r| *r == name))
            .map(|listed| listed.alert)
            .collect()
    }
}
