//! HTTP client for the alert-routing engine.
//!
//! Two calls are used: the reload signal after a configuration write, and the v1 alert
//! listing filtered to one receiver.

use alertbot_routing::{ReceiverId, Reloader, RoutingError};
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::alert::{Alert, AlertsResponse};
use crate::error::{NotifyError, Result};

/// Query filters of the alert listing.
const LIST_FILTERS: [(&str, &str); 3] = [
    ("silenced", "false"),
    ("inhibited", "false"),
    ("unprocessed", "false"),
];

/// Connection settings for the alert-routing engine.
///
/// Requests carry no timeout of their own; they end when the engine or the transport
/// gives up.
#[derive(Debug, Clone)]
pub struct AlertmanagerConfig {
    /// Base URL, e.g. `http://alertmanager:9093`.
    pub base_url: String,
}

impl AlertmanagerConfig {
    /// Creates a config for `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

/// Client for the alert-routing engine API.
#[derive(Debug, Clone)]
pub struct AlertmanagerClient {
    http: Client,
    base_url: Url,
}

impl AlertmanagerClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Http` if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &AlertmanagerConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| NotifyError::Http {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        let http = Client::builder()
            .build()
            .map_err(|e| NotifyError::Http {
                url: config.base_url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { http, base_url })
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Asks the engine to re-read its configuration.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Http` if the request fails and `NotifyError::ReloadFailed`
    /// with the response body if the status is 400 or above.
    pub async fn reload_config(&self) -> Result<()> {
        let url = self.endpoint("/-/reload");
        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| NotifyError::Http {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(NotifyError::ReloadFailed {
                status: status.as_u16(),
                body,
            });
        }

        info!(url = %url, "alertmanager config reloaded");
        Ok(())
    }

    /// Lists active, unsilenced, uninhibited alerts routed to `receiver`.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Http` if the request fails and `NotifyError::Decode` if the
    /// response is not an alert listing.
    pub async fn list_alerts(&self, receiver: ReceiverId) -> Result<Vec<Alert>> {
        let url = self.endpoint("/api/v1/alerts");
        let response = self
            .http
            .get(&url)
            .query(&LIST_FILTERS)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| NotifyError::Http {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let body = response.bytes().await.map_err(|e| NotifyError::Http {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        let listing: AlertsResponse = serde_json::from_slice(&body)?;
        let alerts = listing.for_receiver(receiver);
        debug!(receiver = %receiver, alerts = alerts.len(), "listed alerts");
        Ok(alerts)
    }
}

impl Reloader for AlertmanagerClient {
    async fn reload(&self) -> std::result::Result<(), RoutingError> {
        self.reload_config()
            .await
            .map_err(|err| RoutingError::ReloadFailed {
                reason: err.to_string(),
            })
    }
}
