//! Data layer for the hunt tracker.
//!
//! The tracker keeps all shared state in a transactional document store.
//! Two implementations are provided: an in-memory store for tests and
//! single-process deployments, and a `PostgreSQL` store for everything
//! else. Both expose the same [`DocumentStore`] and [`Transaction`] traits.
//!
//! # Architecture
//!
//! ```text
//! Request handler
//!     |
//!     +-- run_transaction(body) --> DocumentStore::begin
//!     |       |-- Transaction::get     (records read version)
//!     |       |-- Transaction::set     (buffered)
//!     |       |-- Transaction::append  (buffered)
//!     |       +-- Transaction::commit  (validate + apply, or Conflict -> retry)
//!     |
//!     +-- DocumentStore::subscribe --> ChangeEvent stream
//! ```
//!
//! # Modules
//!
//! - [`store`] -- `DocumentStore` and `Transaction` traits
//! - [`runner`] -- Conflict-retrying transaction runner
//! - [`memory`] -- In-memory store
//! - [`postgres`] -- `PostgreSQL` store and change listener
//! - [`error`] -- Shared error types

pub mod error;
pub mod memory;
pub mod postgres;
pub mod runner;
pub mod store;

// Re-export primary types for convenience.
pub use error::StoreError;
pub use memory::{MemoryStore, MemoryTransaction};
pub use postgres::{PostgresConfig, PostgresStore, PostgresTransaction};
pub use runner::{TransactionBody, TxError, run_transaction};
pub use store::{DocumentStore, LogEntry, Transaction};
