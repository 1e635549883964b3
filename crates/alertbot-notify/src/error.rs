//! Error types for the alertbot-notify crate.

use thiserror::Error;

/// Errors that can occur while rendering, paging or querying alerts.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The receiver has no open list.
    #[error("no open list for receiver {receiver}")]
    NoCursor {
        /// The receiver that has no cursor.
        receiver: String,
    },

    /// Already on the last page.
    #[error("no next page")]
    NoNextPage,

    /// Already on the first page.
    #[error("no previous page")]
    NoPrevPage,

    /// The message template could not be loaded or rendered.
    #[error("template error: {reason}")]
    Template {
        /// The reason rendering failed.
        reason: String,
    },

    /// An HTTP call could not be completed.
    #[error("http request to {url} failed: {reason}")]
    Http {
        /// The request URL.
        url: String,
        /// The reason the request failed.
        reason: String,
    },

    /// The alert-routing engine answered a reload with an error status.
    #[error("reload failed with status {status}: {body}")]
    ReloadFailed {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// A response could not be decoded.
    #[error("failed to decode response: {reason}")]
    Decode {
        /// The decoder's description of the problem.
        reason: String,
    },

    /// A rule-group source could not be listed.
    #[error("rule source {kind} failed: {reason}")]
    RuleSource {
        /// The kind of source that failed.
        kind: String,
        /// The reason listing failed.
        reason: String,
    },
}

impl From<tera::Error> for NotifyError {
    fn from(err: tera::Error) -> Self {
        // tera keeps the useful part of the message in the source chain
        let mut reason = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            reason.push_str(": ");
            reason.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::Template { reason }
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            reason: err.to_string(),
        }
    }
}

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
