//! HTTP request handlers.

use std::sync::Arc;

use alertbot_notify::WebhookMessage;
use alertbot_routing::{ConfigStore, ReceiverId, Reloader};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::bot::Bot;
use crate::error::{BotError, BotResult};
use crate::telegram::ChatTransport;

/// Query parameters of the registration link.
#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    /// Chat id to register.
    pub receiver: i64,
}

/// Response of the health and webhook endpoints.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Status message.
    pub status: String,
}

/// Response of the registration endpoint.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// The registered chat id.
    pub receiver: i64,
    /// Whether the stored config was changed.
    pub changed: bool,
}

/// Handle GET /health.
pub async fn health_check() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// Handle POST /webhook - deliver a notification to its chat.
pub async fn receive_webhook<S, R, T>(
    State(bot): State<Arc<Bot<S, R, T>>>,
    body: Result<Json<WebhookMessage>, JsonRejection>,
) -> BotResult<Json<StatusResponse>>
where
    S: ConfigStore,
    R: Reloader,
    T: ChatTransport,
{
    let Json(message) = body.map_err(|e| BotError::InvalidRequest {
        reason: e.body_text(),
    })?;
    bot.deliver_webhook(&message).await?;
    Ok(Json(StatusResponse {
        status: "sent".to_string(),
    }))
}

/// Handle GET /auth/simple - register the chat named in the query.
pub async fn register_simple<S, R, T>(
    State(bot): State<Arc<Bot<S, R, T>>>,
    query: Result<Query<AuthQuery>, QueryRejection>,
) -> BotResult<Json<RegisterResponse>>
where
    S: ConfigStore,
    R: Reloader,
    T: ChatTransport,
{
    let Query(AuthQuery { receiver }) = query.map_err(|e| BotError::InvalidRequest {
        reason: e.body_text(),
    })?;
    let outcome = bot.register(ReceiverId::new(receiver)).await?;
    Ok(Json(RegisterResponse {
        receiver,
        changed: outcome.is_changed(),
    }))
}
