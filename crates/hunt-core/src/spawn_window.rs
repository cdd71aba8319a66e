//! Spawn window calculation.
//!
//! Given a mob's static timing, its last confirmed kill, and the announced
//! maintenance (if any), [`calculate`] derives the earliest and latest
//! respawn instants, progress through the window, the timer status, and the
//! next instants at which the mob's spawn condition holds.
//!
//! The calculation is pure. Callers pass `now` explicitly so the same input
//! always yields the same output.

use chrono::{DateTime, TimeDelta, Utc};
use hunt_types::{MaintenanceWindow, MobDefinition, SpawnStatus};
use serde::Serialize;

use crate::calendar::{ConditionWindow, condition_holds_until, next_condition_windows};

/// Fraction of the normal repop durations that applies after a server
/// restart, as numerator over [`RESTART_DENOMINATOR`].
const RESTART_NUMERATOR: i64 = 3;

/// Denominator of the restart fraction (0.6 = 3/5).
const RESTART_DENOMINATOR: i64 = 5;

/// How far past the earliest allowed instant condition windows are searched.
const CONDITION_SEARCH_HORIZON: TimeDelta = TimeDelta::days(30);

/// What the window is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum WindowAnchor {
    /// The last confirmed kill.
    Kill(DateTime<Utc>),
    /// A server restart that reset the world.
    Restart(DateTime<Utc>),
    /// No kill or restart is known; the window starts now.
    Unknown(DateTime<Utc>),
}

/// Derived timer view for one mob at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnWindow {
    /// Reference instant the window is computed from.
    pub anchor: WindowAnchor,
    /// Earliest possible respawn.
    pub min_repop: DateTime<Utc>,
    /// Latest possible respawn.
    pub max_repop: DateTime<Utc>,
    /// Progress through `[min_repop, max_repop]`, in `[0, 100]`.
    pub elapsed_percent: f64,
    /// Timer status.
    pub status: SpawnStatus,
    /// Earliest instant at or after `now` at which the minimum repop has
    /// passed.
    pub next_min_repop: DateTime<Utc>,
    /// Next instant the spawn condition is satisfied, for gated mobs.
    pub next_condition: Option<DateTime<Utc>>,
    /// Upcoming condition windows, for gated mobs.
    pub condition_windows: Vec<ConditionWindow>,
    /// Seconds left in the current phase of the timer.
    ///
    /// Until the minimum repop while waiting, until the maximum repop
    /// inside the window, until the condition window closes while the
    /// condition is active, and zero once the window is over.
    pub remaining_seconds: i64,
    /// Whether the mob cannot be ready before the announced maintenance.
    pub blocked_by_maintenance: bool,
}

/// Compute the spawn window of `mob` at `now`.
///
/// The restart-anchored window is used only when `maintenance` is given,
/// its server restart has already happened, and the mob was never killed or
/// was last killed before that restart.
/// A never-killed mob without maintenance data is anchored at `now`.
///
/// Instants past the end of the representable range saturate at
/// `DateTime::<Utc>::MAX_UTC`.
pub fn calculate(
    mob: &MobDefinition,
    last_kill: Option<DateTime<Utc>>,
    maintenance: Option<&MaintenanceWindow>,
    now: DateTime<Utc>,
) -> SpawnWindow {
    let repop = i64::from(mob.repop_seconds);
    let max = i64::from(mob.max_repop_seconds);

    let restart = maintenance
        .map(|m| m.server_restart)
        .filter(|restart| *restart <= now)
        .filter(|restart| last_kill.is_none_or(|kill| kill < *restart));

    let (anchor, min_repop, max_repop) = match (restart, last_kill) {
        (Some(restart), _) => (
            WindowAnchor::Restart(restart),
            shift(restart, restart_offset(repop)),
            shift(restart, restart_offset(max)),
        ),
        (None, Some(kill)) => (
            WindowAnchor::Kill(kill),
            shift(kill, TimeDelta::seconds(repop)),
            shift(kill, TimeDelta::seconds(max)),
        ),
        (None, None) => (
            WindowAnchor::Unknown(now),
            shift(now, TimeDelta::seconds(repop)),
            shift(now, TimeDelta::seconds(max)),
        ),
    };

    let mut status = if now < min_repop {
        if matches!(anchor, WindowAnchor::Restart(_)) {
            SpawnStatus::AwaitingRestart
        } else {
            SpawnStatus::Next
        }
    } else if now < max_repop {
        SpawnStatus::PopWindow
    } else {
        SpawnStatus::MaxOver
    };

    let elapsed_percent = elapsed_percent(min_repop, max_repop, now);

    let mut remaining_seconds = match status {
        SpawnStatus::AwaitingRestart | SpawnStatus::Next => (min_repop - now).num_seconds(),
        SpawnStatus::PopWindow | SpawnStatus::ConditionActive => (max_repop - now).num_seconds(),
        SpawnStatus::MaxOver => 0,
    };

    let next_min_repop = min_repop.max(now);

    let mut condition_windows = Vec::new();
    let mut next_condition = None;
    if let Some(condition) = &mob.condition {
        let earliest = next_min_repop;
        let limit = shift(earliest, CONDITION_SEARCH_HORIZON);
        condition_windows = next_condition_windows(mob, min_repop, earliest, limit).collect();

        next_condition = condition_windows.first().map(|window| {
            if condition.requires_sustained_weather() {
                window.end
            } else {
                window.start
            }
        });

        if status == SpawnStatus::PopWindow {
            let active_until = if condition.requires_sustained_weather() {
                // Satisfied once the duration is reached; active until the
                // weather turns.
                next_condition
                    .filter(|ready| *ready <= now)
                    .and_then(|_| condition_holds_until(condition, now, limit))
            } else {
                condition_windows
                    .iter()
                    .find(|w| w.strictly_contains(now))
                    .map(|w| w.end)
            };
            if let Some(until) = active_until {
                status = SpawnStatus::ConditionActive;
                remaining_seconds = (until - now).num_seconds();
            }
        }
    }

    let ready = if mob.condition.is_some() {
        next_condition
    } else {
        Some(min_repop)
    };
    let blocked_by_maintenance = maintenance.is_some_and(|m| is_blocked(m, ready, now));

    SpawnWindow {
        anchor,
        min_repop,
        max_repop,
        elapsed_percent,
        status,
        next_min_repop,
        next_condition,
        condition_windows,
        remaining_seconds,
        blocked_by_maintenance,
    }
}

/// Whether a mob ready at `ready` is cut off by an upcoming maintenance.
///
/// A mob with no known ready instant is never reported as blocked.
pub fn is_blocked(
    maintenance: &MaintenanceWindow,
    ready: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    maintenance.start > now && ready.is_some_and(|ready| ready > maintenance.start)
}

fn shift(instant: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    instant
        .checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn restart_offset(secs: i64) -> TimeDelta {
    TimeDelta::seconds(secs.saturating_mul(RESTART_NUMERATOR) / RESTART_DENOMINATOR)
}

/// Progress through the window as a percentage clamped to `[0, 100]`.
fn elapsed_percent(min: DateTime<Utc>, max: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let span = (max - min).num_seconds();
    if span <= 0 {
        return if now >= max { 100.0 } else { 0.0 };
    }
    let elapsed = (now - min).num_seconds();
    let percent = seconds_f64(elapsed) / seconds_f64(span) * 100.0;
    percent.clamp(0.0, 100.0)
}

fn seconds_f64(secs: i64) -> f64 {
    let clamped = secs.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
    f64::from(i32::try_from(clamped).unwrap_or(0))
}
