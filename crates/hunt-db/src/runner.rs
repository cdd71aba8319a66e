//! Optimistic transaction runner.
//!
//! [`run_transaction`] executes a [`TransactionBody`] inside a fresh
//! transaction and re-runs the whole body when the commit (or a read)
//! reports a conflict. Bodies must derive everything from what they read
//! in the current attempt.

use std::future::Future;

use crate::error::StoreError;
use crate::store::{DocumentStore, Transaction};

/// Failure of a transaction body.
#[derive(Debug)]
pub enum TxError<E> {
    /// The store failed; conflicts are retried by the runner.
    Store(StoreError),
    /// The body chose to abort; the transaction is rolled back.
    Abort(E),
}

impl<E> From<StoreError> for TxError<E> {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Work executed inside a transaction.
///
/// Implementors hold their inputs and may be run several times.
pub trait TransactionBody: Sync {
    /// Value produced by a successful run.
    type Output: Send;
    /// Domain error used to abort the transaction.
    type Error: Send;

    /// Perform the reads and buffered writes of one attempt.
    fn run<T: Transaction>(
        &self,
        tx: &mut T,
    ) -> impl Future<Output = Result<Self::Output, TxError<Self::Error>>> + Send;
}

/// Run `body` in a transaction, retrying on conflict.
///
/// At most `max_attempts` attempts are made (at least one). Any error
/// other than a conflict rolls the transaction back and is returned
/// immediately.
///
/// # Errors
///
/// Returns [`TxError::Store`] with the last conflict once attempts are
/// exhausted, or the first non-retryable error.
pub async fn run_transaction<S, B>(
    store: &S,
    max_attempts: u32,
    body: &B,
) -> Result<B::Output, TxError<B::Error>>
where
    S: DocumentStore,
    B: TransactionBody,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        let mut tx = store.begin().await?;

        let outcome = body.run(&mut tx).await;
        let err = match outcome {
            Ok(output) => match tx.commit().await {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::debug!(attempt, "Transaction committed after retry");
                    }
                    return Ok(output);
                }
                Err(err) => TxError::Store(err),
            },
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Transaction rollback failed");
                }
                err
            }
        };

        match err {
            TxError::Store(err) if err.is_conflict() && attempt < max_attempts => {
                tracing::warn!(attempt, max_attempts, error = %err, "Transaction conflict, retrying");
            }
            other => return Err(other),
        }
    }
}
