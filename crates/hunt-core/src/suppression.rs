//! Read side of spawn point suppression.
//!
//! A mark only counts if it was made after both the last server restart and
//! the last confirmed kill. Marks from an earlier spawn cycle are ignored
//! rather than deleted, which is what lets a revert of the kill time bring
//! them back.

use chrono::{DateTime, Utc};
use hunt_types::{MobDefinition, MobLocationState, PointMarks};
use serde::Serialize;

/// Whether a point is currently suppressed.
///
/// When both marks survive the later one wins. Equal instants resolve to
/// not suppressed.
pub fn is_suppressed(
    marks: &PointMarks,
    last_kill: Option<DateTime<Utc>>,
    server_restart: Option<DateTime<Utc>>,
) -> bool {
    let fresh = |mark: Option<DateTime<Utc>>| {
        mark.filter(|at| server_restart.is_none_or(|restart| *at > restart))
            .filter(|at| last_kill.is_none_or(|kill| *at > kill))
    };

    match (fresh(marks.suppressed_at), fresh(marks.unsuppressed_at)) {
        (Some(suppressed), Some(unsuppressed)) => suppressed > unsuppressed,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Projected suppression state of one spawn point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointView {
    /// Spawn point identifier.
    pub id: String,
    /// Whether the point is currently suppressed.
    pub suppressed: bool,
    /// Whether this is the only suppressible point left unsuppressed.
    pub last_point: bool,
}

/// Project every suppressible point of `mob`.
///
/// A missing location record means no point has been marked.
pub fn project_points(
    mob: &MobDefinition,
    state: Option<&MobLocationState>,
    last_kill: Option<DateTime<Utc>>,
    server_restart: Option<DateTime<Utc>>,
) -> Vec<PointView> {
    let mut views: Vec<PointView> = mob
        .suppressible_points()
        .map(|point| {
            let suppressed = state
                .and_then(|s| s.points.get(&point.id))
                .is_some_and(|marks| is_suppressed(marks, last_kill, server_restart));
            PointView {
                id: point.id.clone(),
                suppressed,
                last_point: false,
            }
        })
        .collect();

    if remaining_count(&views) == 1 {
        if let Some(view) = views.iter_mut().find(|v| !v.suppressed) {
            view.last_point = true;
        }
    }
    views
}

/// Number of projected points that are not suppressed.
pub fn remaining_count(views: &[PointView]) -> usize {
    views.iter().filter(|v| !v.suppressed).count()
}

/// Identifier of the single remaining unsuppressed point, if exactly one
/// is left.
pub fn last_point(views: &[PointView]) -> Option<&str> {
    views.iter().find(|v| v.last_point).map(|v| v.id.as_str())
}
