//! Config store backed by Kubernetes Secrets.
//!
//! The destination Secret holds the configuration the alert-routing engine runs with.
//! When a manual Secret is configured, it provides the base document (global settings,
//! default route, inhibition rules) and only the receivers and child routes are taken
//! from the destination. Saves always go to the destination.

use std::fmt;

use alertbot_routing::{
    ConfigDocument, ConfigStore, Result as RoutingResult, Revision, RoutingError, Snapshot,
    StoreRecord,
};
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use serde_json::json;
use tracing::debug;

use crate::error::{KubeError, Result};

/// Decodes the value stored under `key` of a Secret.
///
/// # Errors
///
/// Returns `KubeError::Decode` if the value is not UTF-8.
pub fn secret_value(secret: &Secret, key: &str) -> Result<Option<String>> {
    let Some(ByteString(bytes)) = secret.data.as_ref().and_then(|data| data.get(key)) else {
        return Ok(None);
    };
    String::from_utf8(bytes.clone())
        .map(Some)
        .map_err(|e| KubeError::Decode {
            reason: format!("secret key {key}: {e}"),
        })
}

/// A [`ConfigStore`] reading and writing Kubernetes Secrets.
#[derive(Clone)]
pub struct SecretStore {
    client: Client,
    destination: StoreRecord,
    manual: Option<StoreRecord>,
}

impl fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretStore")
            .field("destination", &self.destination)
            .field("manual", &self.manual)
            .finish_non_exhaustive()
    }
}

impl SecretStore {
    /// Creates a store editing `destination`.
    #[must_use]
    pub const fn new(client: Client, destination: StoreRecord) -> Self {
        Self {
            client,
            destination,
            manual: None,
        }
    }

    /// Takes the base document from `manual` on every load.
    #[must_use]
    pub fn with_manual(mut self, manual: StoreRecord) -> Self {
        self.manual = Some(manual);
        self
    }

    /// Returns the destination record.
    #[must_use]
    pub const fn destination(&self) -> &StoreRecord {
        &self.destination
    }

    fn secrets(&self, record: &StoreRecord) -> Api<Secret> {
        Api::namespaced(self.client.clone(), &record.namespace)
    }

    async fn read(&self, record: &StoreRecord) -> RoutingResult<(ConfigDocument, Option<Revision>)> {
        let secret = self
            .secrets(record)
            .get(&record.name)
            .await
            .map_err(|e| RoutingError::StoreUnavailable {
                reason: format!(
                    "failed to read secret {record}: {}",
                    KubeError::from_client(record.to_string(), e)
                ),
            })?;
        let value = secret_value(&secret, &record.key)?;
        let document = record.decode(value.as_deref())?;
        let revision = secret.metadata.resource_version.map(Revision::new);
        Ok((document, revision))
    }
}

impl ConfigStore for SecretStore {
    async fn load(&self) -> RoutingResult<Snapshot> {
        let (document, revision) = self.read(&self.destination).await?;

        let document = match &self.manual {
            Some(manual) => {
                let (base, _) = self.read(manual).await?;
                debug!(manual = %manual, destination = %self.destination, "merged manual config");
                base.with_routing_from(document)
            }
            None => document,
        };

        Ok(Snapshot::new(document, revision))
    }

    async fn save(&self, snapshot: &Snapshot) -> RoutingResult<()> {
        let text = snapshot.document.to_yaml()?;
        let mut data = serde_json::Map::new();
        data.insert(self.destination.key.clone(), json!(ByteString(text.into_bytes())));
        let mut patch = json!({ "data": data });
        if let Some(revision) = &snapshot.revision {
            patch["metadata"] = json!({ "resourceVersion": revision.as_str() });
        }

        let updated = self
            .secrets(&self.destination)
            .patch(&self.destination.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| KubeError::from_client(self.destination.to_string(), e))?;

        debug!(
            record = %self.destination,
            revision = updated.metadata.resource_version.as_deref().unwrap_or(""),
            "saved config secret"
        );
        Ok(())
    }
}
