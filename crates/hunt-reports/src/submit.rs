//! Report submission payloads and their validation.

use chrono::{DateTime, TimeDelta, Utc};
use hunt_core::MobCatalog;
use hunt_core::config::ReportsConfig;
use hunt_types::{MobId, Report, ReportId};
use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::reconcile::ReconcileOutcome;

/// Oldest kill a report may claim, relative to server time.
const MAX_REPORT_AGE: TimeDelta = TimeDelta::days(3_650);

/// A kill report as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewReport {
    /// Mob the report is about.
    pub mob_id: MobId,
    /// Claimed kill instant.
    pub kill_time: DateTime<Utc>,
    /// Anonymous identity of the reporter.
    pub reporter_uid: String,
    /// Free-text note.
    #[serde(default)]
    pub memo: String,
    /// Minimum repop the client used; the catalog value applies when
    /// omitted.
    #[serde(default)]
    pub repop_seconds: Option<u32>,
}

/// Result of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    /// Identifier assigned to the stored report.
    pub report_id: ReportId,
    /// What reconciliation did with it.
    pub reconciliation: ReconcileOutcome,
}

impl NewReport {
    /// Validate the payload and build the report to store.
    ///
    /// The mob only has to be known to the catalog when no repop duration
    /// is supplied; unknown rank buckets are left for reconciliation to
    /// reject. The kill time may lie at most one grace period after `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidReport`] describing the first problem.
    pub fn into_report(
        self,
        catalog: &MobCatalog,
        policy: &ReportsConfig,
        now: DateTime<Utc>,
    ) -> Result<Report, ReportError> {
        let max_memo_chars = policy.max_memo_chars;
        if self.mob_id.as_str().trim().is_empty() {
            return Err(ReportError::InvalidReport(String::from("mob_id must not be empty")));
        }
        if self.reporter_uid.trim().is_empty() {
            return Err(ReportError::InvalidReport(String::from(
                "reporter_uid must not be empty",
            )));
        }
        if self.memo.chars().count() > max_memo_chars {
            return Err(ReportError::InvalidReport(format!(
                "memo exceeds {max_memo_chars} characters"
            )));
        }
        let latest = now.checked_add_signed(policy.grace_period());
        if latest.is_none_or(|latest| self.kill_time > latest) {
            return Err(ReportError::InvalidReport(String::from(
                "kill_time is in the future",
            )));
        }
        let oldest = now.checked_sub_signed(MAX_REPORT_AGE);
        if oldest.is_some_and(|oldest| self.kill_time < oldest) {
            return Err(ReportError::InvalidReport(String::from(
                "kill_time is too far in the past",
            )));
        }

        let repop_seconds = match self.repop_seconds {
            Some(secs) => secs,
            None => catalog
                .get(&self.mob_id)
                .map(|mob| mob.repop_seconds)
                .ok_or_else(|| {
                    ReportError::InvalidReport(format!(
                        "repop_seconds is required for unknown mob {}",
                        self.mob_id
                    ))
                })?,
        };
        if repop_seconds == 0 {
            return Err(ReportError::InvalidReport(String::from(
                "repop_seconds must be positive",
            )));
        }

        Ok(Report {
            id: ReportId::new(),
            mob_id: self.mob_id,
            kill_time: self.kill_time,
            reporter_uid: self.reporter_uid,
            memo: self.memo,
            repop_seconds,
            created_at: now,
            is_processed: false,
            skip_reason: None,
            averaging_eligible: false,
            processed_at: None,
        })
    }
}
