//! Route configuration for the HTTP server.

use std::sync::Arc;

use alertbot_routing::{ConfigStore, Reloader};
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::bot::Bot;
use crate::handlers::{health_check, receive_webhook, register_simple};
use crate::telegram::ChatTransport;

/// Creates the router serving health checks, webhooks and registration links.
pub fn create_router<S, R, T>(bot: Arc<Bot<S, R, T>>) -> Router
where
    S: ConfigStore + 'static,
    R: Reloader + 'static,
    T: ChatTransport + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        // Alertmanager webhook notifier
        .route("/webhook", post(receive_webhook::<S, R, T>))
        // Registration link sent to unregistered chats
        .route("/auth/simple", get(register_simple::<S, R, T>))
        .with_state(bot)
        .layer(TraceLayer::new_for_http())
}
