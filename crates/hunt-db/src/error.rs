//! Error types for the data layer.
//!
//! All store operations report failures through [`StoreError`]. A
//! [`StoreError::Conflict`] is the only retryable error: it means another
//! transaction changed something this one read.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A concurrent transaction invalidated this one's reads.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// A create targeted a key that already holds a document.
    #[error("document already exists: {collection}/{key}")]
    AlreadyExists {
        /// Collection storage name.
        collection: &'static str,
        /// Document key.
        key: String,
    },

    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether re-running the whole transaction may succeed.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// SQLSTATE codes that mean "retry the transaction".
///
/// `40001` is a serialization failure, `40P01` a deadlock, and `23505` a
/// unique violation raised when two transactions insert the same key.
const RETRYABLE_SQLSTATES: [&str; 3] = ["40001", "40P01", "23505"];

/// Map a `sqlx` error to a [`StoreError`], turning retryable database
/// failures into [`StoreError::Conflict`].
pub(crate) fn classify(err: sqlx::Error) -> StoreError {
    let code = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned());
    match code {
        Some(code) if RETRYABLE_SQLSTATES.contains(&code.as_str()) => {
            StoreError::Conflict(format!("SQLSTATE {code}"))
        }
        _ => StoreError::Postgres(err),
    }
}
