//! Error types for the bot.

use alertbot_kube::KubeError;
use alertbot_notify::NotifyError;
use alertbot_routing::RoutingError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for bot operations.
pub type BotResult<T> = Result<T, BotError>;

/// Errors that can occur while serving chats and HTTP requests.
#[derive(Debug, Error)]
pub enum BotError {
    /// Reading or changing the routing configuration failed.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// Rendering, paging or the alert-routing engine API failed.
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// The Kubernetes API failed.
    #[error(transparent)]
    Kube(#[from] KubeError),

    /// Settings are inconsistent.
    #[error("invalid settings: {reason}")]
    InvalidSettings {
        /// The reason the settings were rejected.
        reason: String,
    },

    /// A request carried unusable input.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// The reason the request was rejected.
        reason: String,
    },

    /// The HTTP listener could not be bound.
    #[error("failed to bind to {addr}: {reason}")]
    Bind {
        /// The listen address.
        addr: String,
        /// The underlying error.
        reason: String,
    },

    /// The HTTP server stopped with an error.
    #[error("server error: {reason}")]
    Server {
        /// The underlying error.
        reason: String,
    },
}

impl BotError {
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
            Self::Routing(RoutingError::NotFound { .. }) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Routing(RoutingError::WriteConflict { .. }) => (StatusCode::CONFLICT, "conflict"),
            Self::Routing(RoutingError::ReloadFailed { .. } | RoutingError::TransportSendFailed { .. })
            | Self::Notify(NotifyError::Http { .. } | NotifyError::ReloadFailed { .. }) => {
                (StatusCode::BAD_GATEWAY, "upstream_error")
            }
            Self::Routing(RoutingError::StoreUnavailable { .. }) | Self::Kube(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for BotError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status();

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        let json = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"error":"internal_error","message":"failed to serialize error"}"#.to_string()
        });

        (status, [("content-type", "application/json")], json).into_response()
    }
}
