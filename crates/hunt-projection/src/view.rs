//! Timer and suppression views computed from a merged record.

use chrono::{DateTime, Utc};
use hunt_core::suppression::{last_point, remaining_count};
use hunt_core::{PointView, SpawnWindow, calculate, project_points};
use hunt_types::{MaintenanceWindow, MobId, MobStatus, Rank};
use serde::Serialize;

use crate::projection::MobRecord;

/// Everything a client needs to render one mob.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MobView {
    /// Catalog code.
    pub id: MobId,
    /// Display name.
    pub name: String,
    /// Rank of the mob.
    pub rank: Rank,
    /// Area or region.
    pub area: String,
    /// Confirmed kill state.
    pub status: MobStatus,
    /// Spawn window at the time the view was built.
    pub window: SpawnWindow,
    /// Suppression state of each suppressible point.
    pub points: Vec<PointView>,
    /// Number of points not suppressed.
    pub remaining_points: usize,
    /// The single unsuppressed point, when exactly one is left.
    pub last_point: Option<String>,
    /// When the suppression record may be purged.
    pub location_expires_at: Option<DateTime<Utc>>,
}

impl MobView {
    /// Build the view of `record` at `now`.
    ///
    /// Suppression marks past the record's expiry are ignored.
    pub fn build(
        record: &MobRecord,
        maintenance: Option<&MaintenanceWindow>,
        now: DateTime<Utc>,
    ) -> Self {
        let definition = &record.definition;
        let last_kill = record.status.current_kill_time;
        let window = calculate(definition, last_kill, maintenance, now);

        let restart = maintenance
            .map(|m| m.server_restart)
            .filter(|restart| *restart <= now);
        let location = Some(&record.location)
            .filter(|state| state.expires_at.is_none_or(|expiry| expiry > now));
        let points = project_points(definition, location, last_kill, restart);

        Self {
            id: definition.id.clone(),
            name: definition.name.clone(),
            rank: definition.rank,
            area: definition.area.clone(),
            status: record.status.clone(),
            window,
            remaining_points: remaining_count(&points),
            last_point: last_point(&points).map(str::to_owned),
            points,
            location_expires_at: record.location.expires_at,
        }
    }
}
