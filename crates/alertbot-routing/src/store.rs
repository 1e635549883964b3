//! Persistence seam for the routing configuration.
//!
//! A [`ConfigStore`] fetches the serialized document from a named external record and
//! writes it back. The record is the single source of truth: every operation loads a
//! fresh [`Snapshot`] and nothing is cached between operations.
//!
//! Snapshots carry the record's revision token. Stores reject a save whose token no
//! longer matches the record with `RoutingError::WriteConflict`.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use parking_lot::Mutex;
use tracing::debug;

use crate::document::ConfigDocument;
use crate::error::{Result, RoutingError};

/// Field of the record holding the serialized configuration.
pub const DEFAULT_CONFIG_KEY: &str = "alertmanager.yaml";

/// Identifies the external record holding the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreRecord {
    /// Namespace of the record.
    pub namespace: String,
    /// Name of the record.
    pub name: String,
    /// Field inside the record holding the document.
    pub key: String,
}

impl StoreRecord {
    /// Creates a record reference using the default key.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            key: DEFAULT_CONFIG_KEY.to_string(),
        }
    }

    /// Sets the field holding the document.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Parses the document stored under this record's key.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::MissingKey` if `value` is absent and
    /// `RoutingError::MalformedConfig` if it cannot be parsed.
    pub fn decode(&self, value: Option<&str>) -> Result<ConfigDocument> {
        let text = value.ok_or_else(|| RoutingError::MissingKey {
            key: self.key.clone(),
        })?;
        ConfigDocument::from_yaml(text)
    }
}

impl fmt::Display for StoreRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Opaque revision of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    /// Wraps a store-specific revision token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document as loaded, together with the revision it was read at.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The parsed document.
    pub document: ConfigDocument,
    /// Revision of the record when it was read; `None` disables the conflict check.
    pub revision: Option<Revision>,
}

impl Snapshot {
    /// Creates a snapshot.
    #[must_use]
    pub const fn new(document: ConfigDocument, revision: Option<Revision>) -> Self {
        Self { document, revision }
    }
}

/// Reads and writes the routing configuration held in an external record.
pub trait ConfigStore: Send + Sync {
    /// Fetches and parses the current document.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable`, `MalformedConfig` or `MissingKey`.
    fn load(&self) -> impl Future<Output = Result<Snapshot>> + Send;

    /// Serializes the whole document and writes it to the record in one update.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ConfigStore::load`], plus `WriteConflict` if the record
    /// changed since `snapshot` was loaded.
    fn save(&self, snapshot: &Snapshot) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug)]
struct MemoryRecord {
    fields: BTreeMap<String, String>,
    revision: u64,
    available: bool,
    writes: usize,
}

/// A [`ConfigStore`] keeping the record in process memory.
///
/// Behaves like a remote record: every load parses the stored text, every save
/// serializes the whole document, and stale revisions are rejected.
#[derive(Debug)]
pub struct MemoryStore {
    record: StoreRecord,
    state: Mutex<MemoryRecord>,
}

impl MemoryStore {
    /// Creates a store whose record holds `text` under the default key.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let record = StoreRecord::new("memory", "alertmanager");
        let mut fields = BTreeMap::new();
        fields.insert(record.key.clone(), text.into());
        Self {
            record,
            state: Mutex::new(MemoryRecord {
                fields,
                revision: 1,
                available: true,
                writes: 0,
            }),
        }
    }

    /// Creates a store whose record lacks the configuration key.
    #[must_use]
    pub fn without_key() -> Self {
        let store = Self::new(String::new());
        store.state.lock().fields.clear();
        store
    }

    /// Returns the raw text currently stored.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.state.lock().fields.get(&self.record.key).cloned()
    }

    /// Replaces the stored text, as an out-of-band edit would.
    pub fn set_text(&self, text: impl Into<String>) {
        let mut state = self.state.lock();
        state.fields.insert(self.record.key.clone(), text.into());
        state.revision += 1;
    }

    /// Makes every subsequent call fail with `StoreUnavailable` (or succeed again).
    pub fn set_available(&self, available: bool) {
        self.state.lock().available = available;
    }

    /// Returns the current revision.
    #[must_use]
    pub fn revision(&self) -> Revision {
        Revision::new(self.state.lock().revision.to_string())
    }

    /// Returns how many saves were committed.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.state.lock().writes
    }

    /// Loads the current document synchronously.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigStore::load`].
    pub fn document(&self) -> Result<ConfigDocument> {
        let state = self.state.lock();
        self.check_available(&state)?;
        self.record
            .decode(state.fields.get(&self.record.key).map(String::as_str))
    }

    fn check_available(&self, state: &MemoryRecord) -> Result<()> {
        if state.available {
            Ok(())
        } else {
            Err(RoutingError::StoreUnavailable {
                reason: format!("record {} is unreachable", self.record),
            })
        }
    }
}

impl ConfigStore for MemoryStore {
    async fn load(&self) -> Result<Snapshot> {
        let revision = self.revision();
        let document = self.document()?;
        Ok(Snapshot::new(document, Some(revision)))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let text = snapshot.document.to_yaml()?;
        let mut state = self.state.lock();
        self.check_available(&state)?;

        if !state.fields.contains_key(&self.record.key) {
            return Err(RoutingError::MissingKey {
                key: self.record.key.clone(),
            });
        }

        let current = state.revision.to_string();
        if let Some(expected) = &snapshot.revision {
            if expected.as_str() != current {
                return Err(RoutingError::WriteConflict {
                    record: self.record.to_string(),
                    reason: format!("loaded at revision {expected}, record is at {current}"),
                });
            }
        }

        state.fields.insert(self.record.key.clone(), text);
        state.revision += 1;
        state.writes += 1;
        debug!(record = %self.record, revision = state.revision, "saved config");
        Ok(())
    }
}
