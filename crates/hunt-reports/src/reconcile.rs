//! Report reconciliation.
//!
//! Reconciliation is the only writer of a mob's confirmed kill time. It
//! runs as one transaction that reads the report, the mob's rank bucket,
//! and (for ranks that track suppression) the mob's location record, then
//! either accepts the report or marks it rejected. Every path marks the
//! report processed, so running it again is a no-op.

use chrono::{DateTime, TimeDelta, Utc};
use hunt_core::config::{ReportsConfig, SuppressionConfig};
use hunt_db::{Transaction, TransactionBody, TxError};
use hunt_types::{
    Collection, LocationLogRecord, LogCollection, MobId, MobLocationState, MobStatus,
    MobStatusDocument, Report, ReportId, ReportSummary, SkipReason, StatusLogRecord,
};
use serde::Serialize;

use crate::error::ReportError;

/// Result of reconciling one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The report became the mob's confirmed kill.
    Accepted {
        /// Mob the report was about.
        mob_id: MobId,
        /// New confirmed kill instant.
        kill_time: DateTime<Utc>,
    },
    /// The report was marked processed without changing the mob's status.
    Rejected {
        /// Why the report was refused.
        reason: SkipReason,
    },
    /// The report had already been processed.
    AlreadyProcessed,
}

/// Decide whether a claimed kill may replace the current one.
///
/// Returns the rejection reason, or `None` if the claim is acceptable.
pub fn check_claim(
    prior_kill: Option<DateTime<Utc>>,
    claimed: DateTime<Utc>,
    repop_seconds: u32,
    grace: TimeDelta,
) -> Option<SkipReason> {
    let prior = prior_kill?;
    if claimed <= prior {
        return Some(SkipReason::TooOldOrDuplicate);
    }
    // A prior kill so late that its repop overflows leaves nothing later.
    let min_allowed = prior
        .checked_add_signed(TimeDelta::seconds(i64::from(repop_seconds)))
        .and_then(|t| t.checked_sub_signed(grace));
    match min_allowed {
        Some(min_allowed) if claimed >= min_allowed => None,
        _ => Some(SkipReason::TooEarly),
    }
}

/// Transaction body reconciling one stored report.
pub(crate) struct ReconcileReport<'a> {
    pub(crate) report_id: ReportId,
    pub(crate) reports: &'a ReportsConfig,
    pub(crate) suppression: &'a SuppressionConfig,
    pub(crate) now: DateTime<Utc>,
}

impl ReconcileReport<'_> {
    fn mark_processed<T: Transaction>(
        &self,
        tx: &mut T,
        mut report: Report,
        skip_reason: Option<SkipReason>,
    ) -> Result<(), TxError<ReportError>> {
        report.is_processed = true;
        report.skip_reason = skip_reason;
        report.averaging_eligible = skip_reason.is_none();
        report.processed_at = Some(self.now);
        tx.set(Collection::Reports, &self.report_id.to_string(), &report)?;
        Ok(())
    }

    fn accepted_status(&self, prior: &MobStatus, report: &Report) -> MobStatus {
        let mut history = prior.history.clone();
        history.insert(
            0,
            ReportSummary {
                report_id: report.id,
                kill_time: report.kill_time,
                memo: report.memo.clone(),
                reporter_uid: Some(report.reporter_uid.clone()),
            },
        );
        history.truncate(self.reports.history_capacity);

        MobStatus {
            current_kill_time: Some(report.kill_time),
            prev_kill_time: prior.current_kill_time,
            current_kill_memo: report.memo.clone(),
            prev_kill_memo: prior.current_kill_memo.clone(),
            current_reporter_uid: Some(report.reporter_uid.clone()),
            prev_reporter_uid: prior.current_reporter_uid.clone(),
            history,
            is_reverted: false,
        }
    }

    async fn advance_location<T: Transaction>(
        &self,
        tx: &mut T,
        report: &Report,
        retention: TimeDelta,
    ) -> Result<(), TxError<ReportError>> {
        let key = report.mob_id.as_str();
        let existing: Option<MobLocationState> = tx.get(Collection::MobLocations, key).await?;
        let mut state = existing.unwrap_or_default();

        if !state.points.is_empty() {
            tx.append(
                LogCollection::MobLocationLog,
                key,
                &LocationLogRecord {
                    report_id: report.id,
                    archived_at: self.now,
                    points: state.points.clone(),
                },
            )?;
        }

        // Points stay; marks made before the new kill stop counting.
        state.last_kill_time = Some(report.kill_time);
        state.expires_at = report.kill_time.checked_add_signed(retention);
        tx.set(Collection::MobLocations, key, &state)?;
        Ok(())
    }
}

impl TransactionBody for ReconcileReport<'_> {
    type Output = ReconcileOutcome;
    type Error = ReportError;

    async fn run<T: Transaction>(&self, tx: &mut T) -> Result<ReconcileOutcome, TxError<ReportError>> {
        let report: Report = tx
            .get(Collection::Reports, &self.report_id.to_string())
            .await?
            .ok_or(TxError::Abort(ReportError::ReportNotFound(self.report_id)))?;

        if report.is_processed {
            return Ok(ReconcileOutcome::AlreadyProcessed);
        }

        let Some(rank) = report.mob_id.rank() else {
            self.mark_processed(tx, report, Some(SkipReason::UnknownMob))?;
            return Ok(ReconcileOutcome::Rejected {
                reason: SkipReason::UnknownMob,
            });
        };

        let bucket_key = rank.status_document();
        let mut bucket: MobStatusDocument = tx
            .get(Collection::MobStatus, bucket_key)
            .await?
            .unwrap_or_default();
        let prior = bucket.mobs.get(&report.mob_id).cloned();
        let prior_kill = prior.as_ref().and_then(|s| s.current_kill_time);

        if let Some(reason) = check_claim(
            prior_kill,
            report.kill_time,
            report.repop_seconds,
            self.reports.grace_period(),
        ) {
            tracing::info!(
                report_id = %self.report_id,
                mob_id = %report.mob_id,
                %reason,
                "Report rejected"
            );
            self.mark_processed(tx, report, Some(reason))?;
            return Ok(ReconcileOutcome::Rejected { reason });
        }

        if let Some(prior) = &prior {
            tx.append(
                LogCollection::MobStatusLog,
                report.mob_id.as_str(),
                &StatusLogRecord {
                    report_id: report.id,
                    archived_at: self.now,
                    record: prior.clone(),
                },
            )?;
        }

        let status = self.accepted_status(&prior.unwrap_or_default(), &report);
        bucket.mobs.insert(report.mob_id.clone(), status);
        bucket.updated_at = Some(self.now);
        tx.set(Collection::MobStatus, bucket_key, &bucket)?;

        if rank.tracks_suppression() {
            self.advance_location(tx, &report, self.suppression.retention_for(rank))
                .await?;
        }

        let outcome = ReconcileOutcome::Accepted {
            mob_id: report.mob_id.clone(),
            kill_time: report.kill_time,
        };
        self.mark_processed(tx, report, None)?;
        Ok(outcome)
    }
}
