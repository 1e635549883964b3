//! Connecting to the Kubernetes API.
//!
//! Without an explicit API URL the standard discovery applies: `KUBECONFIG` or
//! `~/.kube/config` first, then the in-cluster service account.

use kube::{Client, Config};
use tracing::info;

use crate::error::{KubeError, Result};

/// Connection settings for the Kubernetes API.
#[derive(Debug, Clone, Default)]
pub struct KubeConfig {
    /// API server URL, talked to without credentials. `None` uses the inferred config.
    pub api_url: Option<String>,
}

impl KubeConfig {
    /// Creates a config that infers the cluster from the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Talks to `api_url` instead of the inferred cluster.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }
}

/// Builds a client for the cluster described by `config`.
///
/// # Errors
///
/// Returns `KubeError::Config` if the URL is invalid or no cluster config can be found.
pub async fn connect(config: &KubeConfig) -> Result<Client> {
    let client = match &config.api_url {
        Some(api_url) => {
            let cluster_url = api_url.parse().map_err(|e| KubeError::Config {
                reason: format!("invalid api url {api_url}: {e}"),
            })?;
            Client::try_from(Config::new(cluster_url))
        }
        None => Client::try_default().await,
    }
    .map_err(|e| KubeError::Config {
        reason: e.to_string(),
    })?;

    info!(
        api_url = config.api_url.as_deref().unwrap_or("inferred"),
        namespace = client.default_namespace(),
        "connected kubernetes client"
    );
    Ok(client)
}
