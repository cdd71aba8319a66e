//! Store and transaction traits.
//!
//! A [`DocumentStore`] holds JSON documents addressed by
//! ([`Collection`], key) plus append-only logs addressed by
//! ([`LogCollection`], key). All mutation of shared documents happens in
//! a [`Transaction`]: reads record the version they saw, writes are
//! buffered, and [`Transaction::commit`] applies everything atomically or
//! fails with [`StoreError::Conflict`] if any read went stale.
//!
//! Every future returned here is `Send` so store-generic code can run
//! inside spawned tasks and HTTP handlers.

use std::future::Future;

use chrono::{DateTime, Utc};
use hunt_types::{ChangeEvent, Collection, LogCollection};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

use crate::error::StoreError;

/// One record of an append-only log, with the server time it was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry<T> {
    /// Server time the record was committed.
    pub recorded_at: DateTime<Utc>,
    /// The record itself.
    pub record: T,
}

/// A serializable read-modify-write unit of work.
pub trait Transaction: Send + Sized {
    /// Read a document and record the version seen.
    ///
    /// Returns the transaction's own buffered write if there is one.
    fn get<T: DeserializeOwned + Send>(
        &mut self,
        collection: Collection,
        key: &str,
    ) -> impl Future<Output = Result<Option<T>, StoreError>> + Send;

    /// Buffer a full overwrite of a document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if `document` cannot be
    /// encoded.
    fn set<T: Serialize>(
        &mut self,
        collection: Collection,
        key: &str,
        document: &T,
    ) -> Result<(), StoreError>;

    /// Buffer a document deletion.
    fn delete(&mut self, collection: Collection, key: &str);

    /// Buffer an append to a log.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if `record` cannot be encoded.
    fn append<T: Serialize>(
        &mut self,
        log: LogCollection,
        key: &str,
        record: &T,
    ) -> Result<(), StoreError>;

    /// Validate reads and apply all buffered writes atomically.
    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Discard all buffered writes.
    fn rollback(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Shared document store.
pub trait DocumentStore: Clone + Send + Sync + 'static {
    /// Transaction type produced by [`DocumentStore::begin`].
    type Tx: Transaction;

    /// Start a transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, StoreError>> + Send;

    /// Read a document outside any transaction.
    fn get<T: DeserializeOwned + Send>(
        &self,
        collection: Collection,
        key: &str,
    ) -> impl Future<Output = Result<Option<T>, StoreError>> + Send;

    /// Read every document of a collection, in key order.
    fn list<T: DeserializeOwned + Send>(
        &self,
        collection: Collection,
    ) -> impl Future<Output = Result<Vec<(String, T)>, StoreError>> + Send;

    /// Read the documents of a collection whose top-level string `field`
    /// equals `value`, in key order.
    fn find<T: DeserializeOwned + Send>(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> impl Future<Output = Result<Vec<(String, T)>, StoreError>> + Send;

    /// Read a log in append order.
    fn read_log<T: DeserializeOwned + Send>(
        &self,
        log: LogCollection,
        key: &str,
    ) -> impl Future<Output = Result<Vec<LogEntry<T>>, StoreError>> + Send;

    /// Insert a document that must not exist yet.
    ///
    /// Fails with [`StoreError::AlreadyExists`] otherwise.
    fn create<T: Serialize + Sync>(
        &self,
        collection: Collection,
        key: &str,
        document: &T,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Append to a log outside any transaction.
    fn append<T: Serialize + Sync>(
        &self,
        log: LogCollection,
        key: &str,
        record: &T,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// The store's clock.
    fn server_time(&self) -> DateTime<Utc>;

    /// Subscribe to committed document changes.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}
