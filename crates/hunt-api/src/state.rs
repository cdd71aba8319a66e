//! Shared application state for the tracker API server.
//!
//! [`AppState`] bundles the report service (the only writer of shared
//! documents), the live projection that read endpoints serve from, and
//! the optional maintenance announcement used by the spawn window
//! calculator.

use chrono::{DateTime, Utc};
use hunt_db::DocumentStore;
use hunt_projection::ProjectionStore;
use hunt_reports::ReportService;
use hunt_types::{ChangeEvent, MaintenanceWindow};
use tokio::sync::broadcast;

/// Shared state for the Axum application.
///
/// Wrapped in [`std::sync::Arc`] and injected via Axum's `State`
/// extractor.
#[derive(Debug, Clone)]
pub struct AppState<S> {
    /// Report, revert, suppression, and memo operations.
    pub reports: ReportService<S>,
    /// Merged mob state kept current from the store.
    pub projection: ProjectionStore,
    /// Announced maintenance, if any.
    pub maintenance: Option<MaintenanceWindow>,
}

impl<S: DocumentStore> AppState<S> {
    /// Create the application state.
    pub const fn new(
        reports: ReportService<S>,
        projection: ProjectionStore,
        maintenance: Option<MaintenanceWindow>,
    ) -> Self {
        Self {
            reports,
            projection,
            maintenance,
        }
    }

    /// The store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.reports.store().server_time()
    }

    /// Subscribe to the store's change stream.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.reports.store().subscribe()
    }
}
