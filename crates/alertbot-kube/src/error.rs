//! Error types for the alertbot-kube crate.

use alertbot_routing::RoutingError;
use thiserror::Error;

/// Errors that can occur while talking to the Kubernetes API.
#[derive(Debug, Error)]
pub enum KubeError {
    /// Client configuration is unusable.
    #[error("invalid kubernetes config: {reason}")]
    Config {
        /// The reason the config is invalid.
        reason: String,
    },

    /// The API could not be reached.
    #[error("kubernetes request failed: {reason}")]
    Http {
        /// The reason the request failed.
        reason: String,
    },

    /// The object does not exist.
    #[error("{what} not found")]
    NotFound {
        /// The object that was requested.
        what: String,
    },

    /// The object changed since it was read.
    #[error("conflict on {what}: {reason}")]
    Conflict {
        /// The object that was written.
        what: String,
        /// The API server's message.
        reason: String,
    },

    /// Any other error status.
    #[error("kubernetes api returned {status} for {what}: {reason}")]
    Api {
        /// The object that was requested.
        what: String,
        /// HTTP status code.
        status: u16,
        /// The API server's message.
        reason: String,
    },

    /// A response or field could not be decoded.
    #[error("failed to decode: {reason}")]
    Decode {
        /// The reason decoding failed.
        reason: String,
    },
}

impl KubeError {
    /// Classifies a client error for the object `what`.
    pub fn from_client(what: impl Into<String>, err: kube::Error) -> Self {
        let what = what.into();
        match err {
            kube::Error::Api(response) => match response.code {
                404 => Self::NotFound { what },
                409 => Self::Conflict {
                    what,
                    reason: response.message,
                },
                status => Self::Api {
                    what,
                    status,
                    reason: response.message,
                },
            },
            kube::Error::SerdeError(e) => Self::Decode {
                reason: format!("{what}: {e}"),
            },
            other => Self::Http {
                reason: format!("{what}: {other}"),
            },
        }
    }
}

impl From<KubeError> for RoutingError {
    fn from(err: KubeError) -> Self {
        match err {
            KubeError::Conflict { what, reason } => Self::WriteConflict {
                record: what,
                reason,
            },
            KubeError::Decode { reason } => Self::MalformedConfig { reason },
            other => Self::StoreUnavailable {
                reason: other.to_string(),
            },
        }
    }
}

/// Result type for Kubernetes operations.
pub type Result<T> = std::result::Result<T, KubeError>;
