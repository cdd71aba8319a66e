//! One-step revert of a mob's confirmed kill.

use chrono::{DateTime, TimeDelta, Utc};
use hunt_db::{Transaction, TransactionBody, TxError};
use hunt_types::{Collection, MobId, MobLocationState, MobStatus, MobStatusDocument};
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Which earlier record a revert should restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevertTarget {
    /// The confirmed kill before the current one.
    #[default]
    Previous,
    /// An entry of the bounded history, by position. Not supported.
    History(usize),
}

/// Result of a revert request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RevertOutcome {
    /// The previous kill is now the current one.
    Reverted {
        /// Mob that was reverted.
        mob_id: MobId,
        /// Restored kill instant.
        kill_time: DateTime<Utc>,
    },
    /// There is no prior confirmed record to restore.
    NothingToRevert,
    /// The mob code does not map to a rank bucket.
    UnknownMob,
    /// The requested target is not supported.
    Unsupported,
}

/// Restore the previous kill of `status` in place.
///
/// Returns `false` without touching anything if there is no previous kill.
/// The bounded history is left unchanged.
pub fn revert_to_previous(status: &mut MobStatus) -> bool {
    let Some(previous) = status.prev_kill_time.take() else {
        return false;
    };
    status.current_kill_time = Some(previous);
    status.current_kill_memo = std::mem::take(&mut status.prev_kill_memo);
    status.current_reporter_uid = status.prev_reporter_uid.take();
    status.is_reverted = true;
    true
}

/// Transaction body reverting one mob.
///
/// For ranks that track suppression, the location record follows the
/// restored kill so marks are judged against it again.
pub(crate) struct RevertMob<'a> {
    pub(crate) mob_id: &'a MobId,
    pub(crate) retention: Option<TimeDelta>,
    pub(crate) now: DateTime<Utc>,
}

impl TransactionBody for RevertMob<'_> {
    type Output = RevertOutcome;
    type Error = ReportError;

    async fn run<T: Transaction>(&self, tx: &mut T) -> Result<RevertOutcome, TxError<ReportError>> {
        let Some(rank) = self.mob_id.rank() else {
            return Ok(RevertOutcome::UnknownMob);
        };
        let bucket_key = rank.status_document();
        let Some(mut bucket) = tx
            .get::<MobStatusDocument>(Collection::MobStatus, bucket_key)
            .await?
        else {
            return Ok(RevertOutcome::NothingToRevert);
        };
        let Some(status) = bucket.mobs.get_mut(self.mob_id) else {
            return Ok(RevertOutcome::NothingToRevert);
        };
        if !revert_to_previous(status) {
            return Ok(RevertOutcome::NothingToRevert);
        }
        let restored = status.current_kill_time;

        bucket.updated_at = Some(self.now);
        tx.set(Collection::MobStatus, bucket_key, &bucket)?;

        if let Some(retention) = self.retention {
            let key = self.mob_id.as_str();
            let location: Option<MobLocationState> = tx.get(Collection::MobLocations, key).await?;
            if let Some(mut location) = location {
                location.last_kill_time = restored;
                location.expires_at = restored.and_then(|kill| kill.checked_add_signed(retention));
                tx.set(Collection::MobLocations, key, &location)?;
            }
        }

        tracing::info!(mob_id = %self.mob_id, "Kill reverted");
        Ok(restored.map_or(RevertOutcome::NothingToRevert, |kill_time| {
            RevertOutcome::Reverted {
                mob_id: self.mob_id.clone(),
                kill_time,
            }
        }))
    }
}
