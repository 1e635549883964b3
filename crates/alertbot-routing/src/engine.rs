//! Mutation engine for receivers and routes.
//!
//! Every mutating action follows the same cycle:
//!
//! 1. load a fresh [`Snapshot`] from the store (unlocked),
//! 2. take the process-wide mutation lock,
//! 3. apply the document operation,
//! 4. save the document,
//! 5. release the lock,
//! 6. ask the alert-routing engine to reload.
//!
//! The load is not covered by the lock, so two concurrent actions can both start from
//! the same revision. The store's revision check turns the second write into
//! `RoutingError::WriteConflict` instead of silently dropping the first change.
//!
//! Actions whose document operation is a benign no-op (`AlreadyExists`, `NotFound`)
//! skip both the write and the reload. A failed reload is reported after the write has
//! been committed; the write is not rolled back.

use std::future::Future;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::document::{ConfigDocument, Match, ReceiverId};
use crate::error::{Result, RoutingError};
use crate::store::{ConfigStore, Snapshot};

/// Asks the consumer of the configuration to re-read it.
pub trait Reloader: Send + Sync {
    /// Triggers a reload.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::ReloadFailed` if the reload call fails.
    fn reload(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Whether an action changed the stored configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The document was written and a reload requested.
    Changed,
    /// Nothing to do; no write, no reload.
    Unchanged,
}

impl Outcome {
    /// Returns true if the configuration was written.
    #[must_use]
    pub const fn is_changed(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Applies receiver and route actions to the stored configuration.
#[derive(Debug)]
pub struct MutationEngine<S, R> {
    store: S,
    reloader: R,
    webhook_url: String,
    lock: Mutex<()>,
}

impl<S: ConfigStore, R: Reloader> MutationEngine<S, R> {
    /// Creates an engine. `webhook_url` is injected into every registered receiver.
    #[must_use]
    pub fn new(store: S, reloader: R, webhook_url: impl Into<String>) -> Self {
        Self {
            store,
            reloader,
            webhook_url: webhook_url.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the webhook injected into receivers.
    #[must_use]
    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Registers a receiver, or refreshes its webhook if already registered.
    pub async fn register_receiver(&self, id: ReceiverId) -> Result<Outcome> {
        let webhook_url = self.webhook_url.clone();
        self.mutate("register receiver", id, move |doc| {
            doc.add_receiver(id, &webhook_url);
            Ok(())
        })
        .await
    }

    /// Removes a receiver together with all of its routes.
    pub async fn disable_receiver(&self, id: ReceiverId) -> Result<Outcome> {
        self.mutate("disable receiver", id, move |doc| {
            let routes = doc.remove_all_routes(id);
            if doc.remove_receiver(id) || routes > 0 {
                Ok(())
            } else {
                Err(RoutingError::NotFound {
                    what: format!("receiver {id}"),
                })
            }
        })
        .await
    }

    /// Returns true if the receiver is registered.
    pub async fn is_receiver_registered(&self, id: ReceiverId) -> Result<bool> {
        let snapshot = self.store.load().await?;
        Ok(snapshot.document.find_receiver(id).is_some())
    }

    /// Returns true if the receiver holds a route equivalent to `matcher`.
    pub async fn is_subscribed(&self, id: ReceiverId, matcher: &Match) -> Result<bool> {
        let snapshot = self.store.load().await?;
        Ok(snapshot.document.find_route(id, matcher).is_some())
    }

    /// Adds a route for the receiver.
    ///
    /// Repeating a subscription is a no-op. A group subscription while subscribed to
    /// all groups fails with `RoutingError::MatchAllActive`.
    pub async fn subscribe(&self, id: ReceiverId, matcher: Match) -> Result<Outcome> {
        self.mutate("subscribe", id, move |doc| doc.add_route(id, matcher))
            .await
    }

    /// Subscribes the receiver to every alert group, dropping its group routes.
    pub async fn subscribe_all(&self, id: ReceiverId) -> Result<Outcome> {
        self.subscribe(id, Match::all()).await
    }

    /// Removes the route equivalent to `matcher`. Removing a missing route is a no-op.
    pub async fn unsubscribe(&self, id: ReceiverId, matcher: &Match) -> Result<Outcome> {
        let matcher = matcher.clone();
        self.mutate("unsubscribe", id, move |doc| doc.remove_route(id, &matcher))
            .await
    }

    /// Returns the first alert group the receiver is subscribed to that starts with
    /// `prefix`.
    pub async fn find_group_by_prefix(&self, id: ReceiverId, prefix: &str) -> Result<String> {
        let snapshot = self.store.load().await?;
        snapshot.document.find_group_by_prefix(id, prefix)
    }

    /// Returns the alert groups the receiver is subscribed to.
    pub async fn subscribed_groups(&self, id: ReceiverId) -> Result<Vec<String>> {
        let snapshot = self.store.load().await?;
        Ok(snapshot.document.subscribed_groups(id))
    }

    /// Rewrites the stored document as loaded, then reloads.
    ///
    /// Used at startup to push a merged base configuration to the destination record.
    pub async fn sync(&self) -> Result<()> {
        let snapshot = self.store.load().await?;
        {
            let _guard = self.lock.lock().await;
            self.store.save(&snapshot).await?;
        }
        info!("synchronized routing config");
        self.reload().await
    }

    async fn mutate<F>(&self, action: &'static str, id: ReceiverId, apply: F) -> Result<Outcome>
    where
        F: FnOnce(&mut ConfigDocument) -> Result<()> + Send,
    {
        let mut snapshot: Snapshot = self.store.load().await?;

        {
            let _guard = self.lock.lock().await;

            match apply(&mut snapshot.document) {
                Ok(()) => {}
                Err(err) if err.is_benign() => {
                    debug!(action, receiver = %id, reason = %err, "nothing to change");
                    return Ok(Outcome::Unchanged);
                }
                Err(err) => return Err(err),
            }

            self.store.save(&snapshot).await?;
        }

        info!(action, receiver = %id, "updated routing config");
        self.reload().await?;
        Ok(Outcome::Changed)
    }

    async fn reload(&self) -> Result<()> {
        self.reloader.reload().await.inspect_err(|err| {
            warn!(error = %err, "config saved but reload failed");
        })
    }
}
