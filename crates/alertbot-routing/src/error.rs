//! Error types for the alertbot-routing crate.

use thiserror::Error;

/// Errors that can occur while reading or mutating the routing configuration.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The external record holding the configuration could not be read or written.
    #[error("config store unavailable: {reason}")]
    StoreUnavailable {
        /// The reason the store call failed.
        reason: String,
    },

    /// The stored payload could not be parsed into a routing configuration.
    #[error("malformed config: {reason}")]
    MalformedConfig {
        /// The parser's description of the problem.
        reason: String,
    },

    /// The record exists but does not carry the expected field.
    #[error("record does not contain key {key}")]
    MissingKey {
        /// The missing field name.
        key: String,
    },

    /// A receiver or route was not found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing entry.
        what: String,
    },

    /// An equivalent route is already present.
    #[error("already exists: {what}")]
    AlreadyExists {
        /// Description of the existing entry.
        what: String,
    },

    /// A group-scoped route was requested while the receiver holds a match-all route.
    #[error("receiver {receiver} is subscribed to all alert groups")]
    MatchAllActive {
        /// The receiver holding the match-all route.
        receiver: String,
    },

    /// The record changed between load and save.
    #[error("write conflict on {record}: {reason}")]
    WriteConflict {
        /// The record that was written concurrently.
        record: String,
        /// Details reported by the store.
        reason: String,
    },

    /// The alert-routing engine rejected or failed the reload call.
    #[error("reload failed: {reason}")]
    ReloadFailed {
        /// The reason the reload failed.
        reason: String,
    },

    /// A chat message could not be delivered.
    #[error("transport send failed: {reason}")]
    TransportSendFailed {
        /// The reason delivery failed.
        reason: String,
    },
}

impl RoutingError {
    /// Returns true for outcomes that idempotent operations treat as no-ops.
    #[must_use]
    pub const fn is_benign(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::AlreadyExists { .. })
    }
}

impl From<serde_yaml::Error> for RoutingError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::MalformedConfig {
            reason: err.to_string(),
        }
    }
}

/// Result type for routing operations.
pub type Result<T> = std::result::Result<T, RoutingError>;
