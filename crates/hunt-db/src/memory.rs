//! Process-local document store.
//!
//! Documents carry a version number drawn from a store-wide counter; an
//! absent document has version 0. A transaction records the version of
//! every document it reads, and its commit fails with
//! [`StoreError::Conflict`] if any of them changed in the meantime. Commit
//! validation and application happen under one write lock, so committed
//! transactions are serializable.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hunt_types::{ChangeEvent, Collection, LogCollection};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{RwLock, broadcast};

use crate::error::StoreError;
use crate::store::{DocumentStore, LogEntry, Transaction};

/// Capacity of the change broadcast channel.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

type DocKey = (Collection, String);
type LogKey = (LogCollection, String);

#[derive(Debug, Clone)]
struct Versioned {
    version: u64,
    body: Value,
}

#[derive(Debug, Default)]
struct Inner {
    documents: BTreeMap<DocKey, Versioned>,
    logs: BTreeMap<LogKey, Vec<LogEntry<Value>>>,
    last_version: u64,
}

impl Inner {
    fn version_of(&self, key: &DocKey) -> u64 {
        self.documents.get(key).map_or(0, |doc| doc.version)
    }

    fn next_version(&mut self) -> u64 {
        self.last_version = self.last_version.saturating_add(1);
        self.last_version
    }

    /// Write or delete one document and describe the change.
    fn apply(&mut self, key: DocKey, body: Option<Value>) -> Option<ChangeEvent> {
        let (collection, name) = key.clone();
        match body {
            Some(document) => {
                let version = self.next_version();
                let previous = self.documents.insert(
                    key,
                    Versioned {
                        version,
                        body: document.clone(),
                    },
                );
                Some(if previous.is_some() {
                    ChangeEvent::Modified {
                        collection,
                        key: name,
                        document,
                    }
                } else {
                    ChangeEvent::Added {
                        collection,
                        key: name,
                        document,
                    }
                })
            }
            None => self.documents.remove(&key).map(|_| ChangeEvent::Removed {
                collection,
                key: name,
            }),
        }
    }
}

/// In-memory [`DocumentStore`].
///
/// Cloning yields another handle to the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            changes,
        }
    }

    fn publish(&self, events: Vec<ChangeEvent>) {
        for event in events {
            // No subscribers is not an error.
            let _ = self.changes.send(event);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn decode<T: DeserializeOwned>(body: &Value) -> Result<T, StoreError> {
    Ok(T::deserialize(body)?)
}

impl DocumentStore for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        Ok(MemoryTransaction {
            store: self.clone(),
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
            appends: Vec::new(),
        })
    }

    async fn get<T: DeserializeOwned + Send>(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let inner = self.inner.read().await;
        inner
            .documents
            .get(&(collection, key.to_owned()))
            .map(|doc| decode(&doc.body))
            .transpose()
    }

    async fn list<T: DeserializeOwned + Send>(
        &self,
        collection: Collection,
    ) -> Result<Vec<(String, T)>, StoreError> {
        let inner = self.inner.read().await;
        inner
            .documents
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|((_, key), doc)| Ok((key.clone(), decode(&doc.body)?)))
            .collect()
    }

    async fn find<T: DeserializeOwned + Send>(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Vec<(String, T)>, StoreError> {
        let inner = self.inner.read().await;
        inner
            .documents
            .iter()
            .filter(|((c, _), doc)| {
                *c == collection && doc.body.get(field).and_then(Value::as_str) == Some(value)
            })
            .map(|((_, key), doc)| Ok((key.clone(), decode(&doc.body)?)))
            .collect()
    }

    async fn read_log<T: DeserializeOwned + Send>(
        &self,
        log: LogCollection,
        key: &str,
    ) -> Result<Vec<LogEntry<T>>, StoreError> {
        let inner = self.inner.read().await;
        inner
            .logs
            .get(&(log, key.to_owned()))
            .map_or_else(Vec::new, Clone::clone)
            .into_iter()
            .map(|entry| {
                Ok(LogEntry {
                    recorded_at: entry.recorded_at,
                    record: decode(&entry.record)?,
                })
            })
            .collect()
    }

    async fn create<T: Serialize + Sync>(
        &self,
        collection: Collection,
        key: &str,
        document: &T,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_value(document)?;
        let mut inner = self.inner.write().await;
        let doc_key = (collection, key.to_owned());
        if inner.documents.contains_key(&doc_key) {
            return Err(StoreError::AlreadyExists {
                collection: collection.as_str(),
                key: key.to_owned(),
            });
        }
        let event = inner.apply(doc_key, Some(body));
        self.publish(event.into_iter().collect());
        Ok(())
    }

    async fn append<T: Serialize + Sync>(
        &self,
        log: LogCollection,
        key: &str,
        record: &T,
    ) -> Result<(), StoreError> {
        let record = serde_json::to_value(record)?;
        let recorded_at = self.server_time();
        let mut inner = self.inner.write().await;
        inner
            .logs
            .entry((log, key.to_owned()))
            .or_default()
            .push(LogEntry { recorded_at, record });
        Ok(())
    }

    fn server_time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}

/// Transaction over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTransaction {
    store: MemoryStore,
    reads: BTreeMap<DocKey, u64>,
    writes: BTreeMap<DocKey, Option<Value>>,
    appends: Vec<(LogKey, Value)>,
}

impl Transaction for MemoryTransaction {
    async fn get<T: DeserializeOwned + Send>(
        &mut self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let doc_key = (collection, key.to_owned());
        if let Some(buffered) = self.writes.get(&doc_key) {
            return buffered.as_ref().map(decode).transpose();
        }

        let (version, body) = {
            let inner = self.store.inner.read().await;
            let doc = inner.documents.get(&doc_key);
            (inner.version_of(&doc_key), doc.map(|d| d.body.clone()))
        };
        self.reads.entry(doc_key).or_insert(version);
        body.as_ref().map(decode).transpose()
    }

    fn set<T: Serialize>(
        &mut self,
        collection: Collection,
        key: &str,
        document: &T,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_value(document)?;
        self.writes.insert((collection, key.to_owned()), Some(body));
        Ok(())
    }

    fn delete(&mut self, collection: Collection, key: &str) {
        self.writes.insert((collection, key.to_owned()), None);
    }

    fn append<T: Serialize>(
        &mut self,
        log: LogCollection,
        key: &str,
        record: &T,
    ) -> Result<(), StoreError> {
        let record = serde_json::to_value(record)?;
        self.appends.push(((log, key.to_owned()), record));
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let Self {
            store,
            reads,
            writes,
            appends,
        } = self;

        let mut inner = store.inner.write().await;

        for (key, seen) in &reads {
            let current = inner.version_of(key);
            if current != *seen {
                return Err(StoreError::Conflict(format!(
                    "{}/{} changed from version {seen} to {current}",
                    key.0.as_str(),
                    key.1
                )));
            }
        }

        let events: Vec<ChangeEvent> = writes
            .into_iter()
            .filter_map(|(key, body)| inner.apply(key, body))
            .collect();

        let recorded_at = store.server_time();
        for (key, record) in appends {
            inner
                .logs
                .entry(key)
                .or_default()
                .push(LogEntry { recorded_at, record });
        }

        // Published before the lock is released, so subscribers see commits
        // in the order they were applied.
        let changes = events.len();
        store.publish(events);
        drop(inner);

        tracing::debug!(changes, "Memory transaction committed");
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}
