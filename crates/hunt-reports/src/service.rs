//! Entry points for every report, revert, suppression, and memo operation.
//!
//! [`ReportService`] ties the catalog and policy to a store. Mutations of
//! shared documents go through [`run_transaction`] with the configured
//! attempt limit, so concurrent writers for the same mob are retried
//! instead of overwriting each other.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hunt_core::MobCatalog;
use hunt_core::config::{ReportsConfig, SuppressionConfig, TrackerConfig};
use hunt_db::{DocumentStore, run_transaction};
use hunt_types::{
    Collection, LocationLogRecord, LogCollection, MemoEntry, MobId, Report, ReportId,
    StatusLogRecord, SuppressionAction,
};

use crate::error::ReportError;
use crate::memo::{newest_first, validate_memo};
use crate::reconcile::{ReconcileOutcome, ReconcileReport};
use crate::revert::{RevertMob, RevertOutcome, RevertTarget};
use crate::submit::{NewReport, SubmitOutcome};
use crate::suppression::{ResetOutcome, ResetPoints, ToggleOutcome, TogglePoint, validate_toggle};

/// Tunables that shape report processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPolicy {
    /// Reconciliation rules.
    pub reports: ReportsConfig,
    /// Suppression retention.
    pub suppression: SuppressionConfig,
    /// Attempts per transaction before a conflict is surfaced.
    pub max_attempts: u32,
}

impl ReportPolicy {
    /// Extract the policy from the tracker configuration.
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            reports: config.reports,
            suppression: config.suppression,
            max_attempts: config.store.max_transaction_attempts,
        }
    }
}

impl Default for ReportPolicy {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}

/// Report processing bound to one store.
#[derive(Debug, Clone)]
pub struct ReportService<S> {
    store: S,
    catalog: Arc<MobCatalog>,
    policy: ReportPolicy,
}

impl<S: DocumentStore> ReportService<S> {
    /// Create a service over `store`.
    pub const fn new(store: S, catalog: Arc<MobCatalog>, policy: ReportPolicy) -> Self {
        Self {
            store,
            catalog,
            policy,
        }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The mob catalog.
    pub fn catalog(&self) -> &MobCatalog {
        &self.catalog
    }

    /// The active policy.
    pub const fn policy(&self) -> &ReportPolicy {
        &self.policy
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    /// Validate and store a report, then reconcile it immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidReport`] for a malformed payload, or a
    /// store error. A report that was stored but whose reconciliation
    /// failed stays unprocessed and can be reconciled again later.
    pub async fn submit(&self, new: NewReport) -> Result<SubmitOutcome, ReportError> {
        let now = self.store.server_time();
        let report = new.into_report(&self.catalog, &self.policy.reports, now)?;
        let report_id = report.id;

        self.store
            .create(Collection::Reports, &report_id.to_string(), &report)
            .await?;
        tracing::debug!(%report_id, mob_id = %report.mob_id, "Report stored");

        let reconciliation = self.reconcile(report_id).await?;
        Ok(SubmitOutcome {
            report_id,
            reconciliation,
        })
    }

    /// Reconcile a stored report against its mob's confirmed status.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::ReportNotFound`] if the report does not
    /// exist, or a store error if the transaction could not commit.
    pub async fn reconcile(&self, report_id: ReportId) -> Result<ReconcileOutcome, ReportError> {
        let body = ReconcileReport {
            report_id,
            reports: &self.policy.reports,
            suppression: &self.policy.suppression,
            now: self.store.server_time(),
        };
        let outcome = run_transaction(&self.store, self.policy.max_attempts, &body).await?;
        if let ReconcileOutcome::Accepted { mob_id, kill_time } = &outcome {
            tracing::info!(%report_id, %mob_id, %kill_time, "Report accepted");
        }
        Ok(outcome)
    }

    /// Reports for `mob_id` whose kill time lies in `[from, to)`, oldest
    /// first. Open bounds are unbounded.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn reports_in_range(
        &self,
        mob_id: &MobId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Report>, ReportError> {
        let found: Vec<(String, Report)> = self
            .store
            .find(Collection::Reports, "mob_id", mob_id.as_str())
            .await?;
        let mut reports: Vec<Report> = found
            .into_iter()
            .map(|(_, report)| report)
            .filter(|r| from.is_none_or(|from| r.kill_time >= from))
            .filter(|r| to.is_none_or(|to| r.kill_time < to))
            .collect();
        reports.sort_by_key(|r| r.kill_time);
        Ok(reports)
    }

    /// Archived status records of a mob, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the read fails.
    pub async fn status_log(&self, mob_id: &MobId) -> Result<Vec<StatusLogRecord>, ReportError> {
        let entries = self
            .store
            .read_log(LogCollection::MobStatusLog, mob_id.as_str())
            .await?;
        Ok(entries.into_iter().map(|e| e.record).collect())
    }

    /// Archived suppression points of a mob, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the read fails.
    pub async fn location_log(&self, mob_id: &MobId) -> Result<Vec<LocationLogRecord>, ReportError> {
        let entries = self
            .store
            .read_log(LogCollection::MobLocationLog, mob_id.as_str())
            .await?;
        Ok(entries.into_iter().map(|e| e.record).collect())
    }

    // -----------------------------------------------------------------------
    // Revert
    // -----------------------------------------------------------------------

    /// Restore a mob's previous confirmed kill.
    ///
    /// # Errors
    ///
    /// Returns a store error if the transaction could not commit.
    pub async fn revert(
        &self,
        mob_id: &MobId,
        target: RevertTarget,
    ) -> Result<RevertOutcome, ReportError> {
        if target != RevertTarget::Previous {
            return Ok(RevertOutcome::Unsupported);
        }
        let retention = mob_id
            .rank()
            .filter(|rank| rank.tracks_suppression())
            .map(|rank| self.policy.suppression.retention_for(rank));
        let body = RevertMob {
            mob_id,
            retention,
            now: self.store.server_time(),
        };
        Ok(run_transaction(&self.store, self.policy.max_attempts, &body).await?)
    }

    // -----------------------------------------------------------------------
    // Suppression
    // -----------------------------------------------------------------------

    /// Mark one spawn point as suppressed or unsuppressed.
    ///
    /// # Errors
    ///
    /// Returns a store error if the transaction could not commit.
    pub async fn toggle_point(
        &self,
        mob_id: &MobId,
        point_id: &str,
        action: SuppressionAction,
        client_time: DateTime<Utc>,
    ) -> Result<ToggleOutcome, ReportError> {
        if let Some(rejection) = validate_toggle(&self.catalog, mob_id, point_id) {
            tracing::debug!(%mob_id, point_id, ?rejection, "Toggle rejected");
            return Ok(rejection);
        }
        let body = TogglePoint {
            mob_id,
            point_id,
            action,
            client_time,
            now: self.store.server_time(),
        };
        Ok(run_transaction(&self.store, self.policy.max_attempts, &body).await?)
    }

    /// Clear every spawn point mark of a mob.
    ///
    /// # Errors
    ///
    /// Returns a store error if the transaction could not commit.
    pub async fn reset_points(&self, mob_id: &MobId) -> Result<ResetOutcome, ReportError> {
        if self.catalog.get(mob_id).is_none() {
            return Ok(ResetOutcome::UnknownMob);
        }
        let body = ResetPoints { mob_id };
        Ok(run_transaction(&self.store, self.policy.max_attempts, &body).await?)
    }

    // -----------------------------------------------------------------------
    // Memos
    // -----------------------------------------------------------------------

    /// Attach a note to a mob.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnknownMob`] or [`ReportError::InvalidMemo`]
    /// for bad input, or a store error.
    pub async fn add_memo(&self, mob_id: &MobId, text: &str) -> Result<MemoEntry, ReportError> {
        if self.catalog.get(mob_id).is_none() {
            return Err(ReportError::UnknownMob(mob_id.clone()));
        }
        let entry = MemoEntry {
            text: validate_memo(text, self.policy.reports.max_memo_chars)?,
            created_at: self.store.server_time(),
        };
        self.store
            .append(LogCollection::Memos, mob_id.as_str(), &entry)
            .await?;
        tracing::debug!(%mob_id, "Memo added");
        Ok(entry)
    }

    /// Notes of a mob, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnknownMob`] or a store error.
    pub async fn memos(&self, mob_id: &MobId) -> Result<Vec<MemoEntry>, ReportError> {
        if self.catalog.get(mob_id).is_none() {
            return Err(ReportError::UnknownMob(mob_id.clone()));
        }
        let entries = self
            .store
            .read_log::<MemoEntry>(LogCollection::Memos, mob_id.as_str())
            .await?;
        Ok(newest_first(entries.into_iter().map(|e| e.record).collect()))
    }
}
