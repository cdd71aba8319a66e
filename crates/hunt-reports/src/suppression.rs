//! Write side of spawn point suppression.
//!
//! A toggle stamps one mark of one point and clears the other. A reset
//! clears every point of a mob in a single write. Both run as transactions
//! on the mob's location record; the catalog checks happen before the
//! transaction starts.

use chrono::{DateTime, Utc};
use hunt_core::MobCatalog;
use hunt_db::{Transaction, TransactionBody, TxError};
use hunt_types::{Collection, MobId, MobLocationState, PointMarks, SuppressionAction};
use serde::Serialize;

use crate::error::ReportError;

/// Result of a toggle request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The mark was written.
    Applied {
        /// Point that was marked.
        point_id: String,
        /// Direction of the mark.
        action: SuppressionAction,
        /// Instant stored on the mark.
        marked_at: DateTime<Utc>,
    },
    /// The mob is not in the catalog.
    UnknownMob,
    /// The mob's rank does not track suppression.
    NotTracked,
    /// The point does not belong to the mob.
    UnknownPoint,
    /// The point does not apply to the mob's rank.
    WrongRank,
}

/// Result of a reset request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResetOutcome {
    /// All points of the mob were cleared.
    Reset {
        /// Number of points that carried marks.
        cleared: usize,
    },
    /// The mob is not in the catalog.
    UnknownMob,
}

/// Check that `point_id` can carry suppression marks for `mob_id`.
///
/// Returns the rejection to report, or `None` if the toggle may proceed.
pub fn validate_toggle(catalog: &MobCatalog, mob_id: &MobId, point_id: &str) -> Option<ToggleOutcome> {
    let Some(mob) = catalog.get(mob_id) else {
        return Some(ToggleOutcome::UnknownMob);
    };
    if !mob.rank.tracks_suppression() {
        return Some(ToggleOutcome::NotTracked);
    }
    let Some(point) = mob.spawn_points.iter().find(|p| p.id == point_id) else {
        return Some(ToggleOutcome::UnknownPoint);
    };
    if !point.applies_to(mob.rank) {
        return Some(ToggleOutcome::WrongRank);
    }
    None
}

/// Apply one mark to `marks`.
///
/// The mark is stamped with the earlier of the client and server clocks,
/// so a fast client cannot produce a mark that outlives a later kill.
pub fn apply_mark(
    marks: &mut PointMarks,
    action: SuppressionAction,
    client_time: DateTime<Utc>,
    server_now: DateTime<Utc>,
) -> DateTime<Utc> {
    let stamp = client_time.min(server_now);
    match action {
        SuppressionAction::Suppress => {
            marks.suppressed_at = Some(stamp);
            marks.unsuppressed_at = None;
        }
        SuppressionAction::Unsuppress => {
            marks.unsuppressed_at = Some(stamp);
            marks.suppressed_at = None;
        }
    }
    stamp
}

/// Transaction body for a single toggle.
pub(crate) struct TogglePoint<'a> {
    pub(crate) mob_id: &'a MobId,
    pub(crate) point_id: &'a str,
    pub(crate) action: SuppressionAction,
    pub(crate) client_time: DateTime<Utc>,
    pub(crate) now: DateTime<Utc>,
}

impl TransactionBody for TogglePoint<'_> {
    type Output = ToggleOutcome;
    type Error = ReportError;

    async fn run<T: Transaction>(&self, tx: &mut T) -> Result<ToggleOutcome, TxError<ReportError>> {
        let key = self.mob_id.as_str();
        let mut state: MobLocationState = tx
            .get(Collection::MobLocations, key)
            .await?
            .unwrap_or_default();

        let marks = state.points.entry(self.point_id.to_owned()).or_default();
        let marked_at = apply_mark(marks, self.action, self.client_time, self.now);
        tx.set(Collection::MobLocations, key, &state)?;

        tracing::debug!(mob_id = %self.mob_id, point_id = self.point_id, action = ?self.action, "Point marked");
        Ok(ToggleOutcome::Applied {
            point_id: self.point_id.to_owned(),
            action: self.action,
            marked_at,
        })
    }
}

/// Transaction body clearing every point of a mob.
pub(crate) struct ResetPoints<'a> {
    pub(crate) mob_id: &'a MobId,
}

impl TransactionBody for ResetPoints<'_> {
    type Output = ResetOutcome;
    type Error = ReportError;

    async fn run<T: Transaction>(&self, tx: &mut T) -> Result<ResetOutcome, TxError<ReportError>> {
        let key = self.mob_id.as_str();
        let Some(mut state) = tx.get::<MobLocationState>(Collection::MobLocations, key).await? else {
            return Ok(ResetOutcome::Reset { cleared: 0 });
        };
        let cleared = state.points.len();
        state.points.clear();
        tx.set(Collection::MobLocations, key, &state)?;

        tracing::info!(mob_id = %self.mob_id, cleared, "Suppression reset");
        Ok(ResetOutcome::Reset { cleared })
    }
}
