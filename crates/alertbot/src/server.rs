//! HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use alertbot_routing::{ConfigStore, Reloader};
use tokio::net::TcpListener;
use tracing::info;

use crate::bot::Bot;
use crate::error::{BotError, BotResult};
use crate::routes::create_router;
use crate::telegram::ChatTransport;

/// Serves the HTTP endpoints on `addr` until `shutdown` resolves.
///
/// # Errors
///
/// Returns `BotError::Bind` if the address cannot be bound and `BotError::Server` if the
/// server stops with an error.
pub async fn serve_with_shutdown<S, R, T, F>(
    bot: Arc<Bot<S, R, T>>,
    addr: SocketAddr,
    shutdown: F,
) -> BotResult<()>
where
    S: ConfigStore + 'static,
    R: Reloader + 'static,
    T: ChatTransport + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.map_err(|e| BotError::Bind {
        addr: addr.to_string(),
        reason: e.to_string(),
    })?;

    let local = listener.local_addr().unwrap_or(addr);
    info!(addr = %local, "HTTP server listening");

    axum::serve(listener, create_router(bot))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| BotError::Server {
            reason: e.to_string(),
        })?;

    info!("HTTP server shut down");
    Ok(())
}
