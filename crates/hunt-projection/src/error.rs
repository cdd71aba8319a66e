//! Error types for the projection layer.

use hunt_db::StoreError;
use hunt_types::Collection;

/// Errors raised while loading or merging projected state.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// Reading from the store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A changed document could not be decoded.
    #[error("malformed {} document {key}: {source}", collection.as_str())]
    Malformed {
        /// Collection of the document.
        collection: Collection,
        /// Document key.
        key: String,
        /// Decoding failure.
        source: serde_json::Error,
    },
}
