//! Error types for report processing.
//!
//! Business-rule rejections (a stale report, nothing to revert, a point of
//! the wrong rank) are not errors; they are returned as outcome values.
//! [`ReportError`] covers malformed input, missing records, and store
//! failures.

use hunt_db::{StoreError, TxError};
use hunt_types::{MobId, ReportId};

/// Errors that can occur while processing reports.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The report to reconcile does not exist.
    #[error("report not found: {0}")]
    ReportNotFound(ReportId),

    /// The mob is not in the catalog.
    #[error("unknown mob: {0}")]
    UnknownMob(MobId),

    /// A submitted report failed validation.
    #[error("invalid report: {0}")]
    InvalidReport(String),

    /// A memo failed validation.
    #[error("invalid memo: {0}")]
    InvalidMemo(String),

    /// The store failed, or kept conflicting after every retry.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<TxError<Self>> for ReportError {
    fn from(err: TxError<Self>) -> Self {
        match err {
            TxError::Store(err) => Self::Store(err),
            TxError::Abort(err) => err,
        }
    }
}
