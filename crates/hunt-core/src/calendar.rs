//! In-game calendar: time of day, lunar phase, weather seed, and spawn
//! condition evaluation.
//!
//! Everything here is a pure function of a real-world instant. Clients and
//! the server must agree on every value, so all derivations work on whole
//! Unix seconds and the weather seed uses a fixed 32-bit mixing hash.
//!
//! | Unit | Real seconds |
//! |------|--------------|
//! | in-game hour | 175 |
//! | in-game day (24 hours) | 4200 |
//! | weather cycle (8 hours) | 1400 |
//! | lunar cycle (32 days) | 134400 |

use chrono::{DateTime, Utc};
use hunt_types::{MobDefinition, MoonPhase, SpawnCondition};
use serde::Serialize;

/// Real seconds per in-game hour.
pub const GAME_HOUR_SECS: i64 = 175;

/// Real seconds per in-game day.
pub const GAME_DAY_SECS: i64 = 4_200;

/// Real seconds per weather cycle.
pub const WEATHER_CYCLE_SECS: i64 = 1_400;

/// In-game days per lunar cycle.
pub const LUNAR_CYCLE_DAYS: i64 = 32;

/// Phase before which the first-night time ranges apply.
pub const FIRST_NIGHT_BOUNDARY: f64 = 1.5;

/// `f64` form of [`GAME_DAY_SECS`] for phase arithmetic.
const GAME_DAY_SECS_F64: f64 = 4_200.0;

/// Phase window `[start, end)` of the new moon. A start above the cycle
/// length wraps, so the window is `[32.5, 32) ∪ [0, 4.5)`.
const NEW_MOON_WINDOW: (f64, f64) = (32.5, 4.5);

/// Phase window `[start, end)` of the full moon.
const FULL_MOON_WINDOW: (f64, f64) = (16.5, 20.5);

/// Window cap for mobs gated on sustained weather.
const SUSTAINED_WINDOW_CAP: usize = 20;

/// Window cap for every other gated mob.
const DEFAULT_WINDOW_CAP: usize = 2;

/// How far back a sustained-weather scan looks for the start of a run
/// already in progress.
const SUSTAINED_LOOKBACK_SECS: i64 = GAME_DAY_SECS * LUNAR_CYCLE_DAYS;

/// In-game clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameTime {
    /// Hour, 0-23.
    pub hour: u8,
    /// Minute, 0-59.
    pub minute: u8,
}

/// An interval `[start, end)` during which a spawn condition is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConditionWindow {
    /// First instant of the window.
    pub start: DateTime<Utc>,
    /// First instant after the window.
    pub end: DateTime<Utc>,
}

impl ConditionWindow {
    /// Whether `instant` lies strictly between the window bounds.
    pub fn strictly_contains(&self, instant: DateTime<Utc>) -> bool {
        self.start < instant && instant < self.end
    }
}

// ---------------------------------------------------------------------------
// Clock readings
// ---------------------------------------------------------------------------

/// Map a real instant to the in-game hour and minute.
pub fn game_time_of(instant: DateTime<Utc>) -> GameTime {
    game_time_at(instant.timestamp())
}

fn game_time_at(secs: i64) -> GameTime {
    let bell = secs.div_euclid(GAME_HOUR_SECS);
    let hour = u8::try_from(bell.rem_euclid(24)).unwrap_or(0);
    let within = secs.rem_euclid(GAME_HOUR_SECS);
    let minute = u8::try_from(within.saturating_mul(60).div_euclid(GAME_HOUR_SECS)).unwrap_or(0);
    GameTime { hour, minute }
}

/// Continuous lunar phase in `[0, 32)`, measured in in-game days.
pub fn lunar_phase_of(instant: DateTime<Utc>) -> f64 {
    lunar_phase_at(instant.timestamp())
}

fn lunar_phase_at(secs: i64) -> f64 {
    let cycle = GAME_DAY_SECS.saturating_mul(LUNAR_CYCLE_DAYS);
    // Always below 134_400, so the conversion to i32 is lossless.
    let within = i32::try_from(secs.rem_euclid(cycle)).unwrap_or(0);
    f64::from(within) / GAME_DAY_SECS_F64
}

/// Classify a lunar phase value into its label, if it has one.
pub fn moon_phase_label(phase: f64) -> Option<MoonPhase> {
    if in_cycle_window(phase, NEW_MOON_WINDOW) {
        Some(MoonPhase::NewMoon)
    } else if in_cycle_window(phase, FULL_MOON_WINDOW) {
        Some(MoonPhase::FullMoon)
    } else {
        None
    }
}

/// Lunar label at `instant`, if any.
pub fn lunar_label_of(instant: DateTime<Utc>) -> Option<MoonPhase> {
    moon_phase_label(lunar_phase_of(instant))
}

fn in_cycle_window(phase: f64, (start, end): (f64, f64)) -> bool {
    if start <= end {
        phase >= start && phase < end
    } else {
        phase >= start || phase < end
    }
}

/// Deterministic weather seed in `[0, 100)` for the weather cycle that
/// contains `instant`.
///
/// The seed must be bit-exact across implementations: every client uses it
/// to agree on the shared world's weather.
pub fn weather_seed_of(instant: DateTime<Utc>) -> u8 {
    weather_seed_at(instant.timestamp())
}

fn weather_seed_at(secs: i64) -> u8 {
    let bell = secs.div_euclid(GAME_HOUR_SECS);
    let increment = bell
        .saturating_add(8)
        .saturating_sub(bell.rem_euclid(8))
        .rem_euclid(24);
    let days = secs.div_euclid(GAME_DAY_SECS);
    let base = days.saturating_mul(100).saturating_add(increment);
    // Truncate to 32 bits.
    let base = u32::try_from(base.rem_euclid(1_i64 << 32)).unwrap_or(0);
    let step1 = base.wrapping_shl(11) ^ base;
    let step2 = (step1 >> 8) ^ step1;
    u8::try_from(step2 % 100).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Spawn conditions
// ---------------------------------------------------------------------------

/// Whether the mob's spawn condition holds at `instant`.
///
/// A mob without a condition always qualifies. The sustained-duration part
/// of a weather condition is not evaluated here; see
/// [`next_condition_windows`].
pub fn condition_holds(mob: &MobDefinition, instant: DateTime<Utc>) -> bool {
    mob.condition
        .as_ref()
        .is_none_or(|condition| spawn_condition_holds(condition, instant))
}

/// Evaluate a single spawn condition at `instant`.
pub fn spawn_condition_holds(condition: &SpawnCondition, instant: DateTime<Utc>) -> bool {
    condition_holds_at(condition, instant.timestamp())
}

fn condition_holds_at(condition: &SpawnCondition, secs: i64) -> bool {
    let phase = lunar_phase_at(secs);

    if let Some(required) = condition.moon_phase {
        if moon_phase_label(phase) != Some(required) {
            return false;
        }
    }

    if condition.involves_weather() {
        let seed = weather_seed_at(secs);
        if !condition.weather_seed_ranges.iter().any(|r| r.contains(seed)) {
            return false;
        }
    }

    let ranges = if !condition.first_night_ranges.is_empty() && phase < FIRST_NIGHT_BOUNDARY {
        &condition.first_night_ranges
    } else {
        &condition.time_ranges
    };
    if !ranges.is_empty() {
        let hour = game_time_at(secs).hour;
        if !ranges.iter().any(|r| r.contains(hour)) {
            return false;
        }
    }

    true
}

/// Grid on which the condition can change value.
///
/// Pure weather conditions only change at weather-cycle boundaries; any
/// time-of-day or lunar part changes on the hour grid.
fn scan_step(condition: &SpawnCondition) -> i64 {
    let pure_weather = condition.involves_weather()
        && condition.moon_phase.is_none()
        && condition.time_ranges.is_empty()
        && condition.first_night_ranges.is_empty();
    if pure_weather {
        WEATHER_CYCLE_SECS
    } else {
        GAME_HOUR_SECS
    }
}

fn floor_to(secs: i64, step: i64) -> i64 {
    secs.saturating_sub(secs.rem_euclid(step))
}

fn instant(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// End of the condition run that contains `from`.
///
/// Returns `None` if the condition does not hold at `from`. The end is
/// capped at `limit`.
pub fn condition_holds_until(
    condition: &SpawnCondition,
    from: DateTime<Utc>,
    limit: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let step = scan_step(condition);
    let limit = limit.timestamp();
    let mut cursor = floor_to(from.timestamp(), step);
    if !condition_holds_at(condition, cursor) {
        return None;
    }
    while cursor < limit && condition_holds_at(condition, cursor) {
        cursor = cursor.saturating_add(step);
    }
    instant(cursor.min(limit))
}

/// Lazily enumerate windows in which the mob's condition holds.
///
/// Scanning starts at `search_start` floored to the condition's grid and
/// stops at `search_limit` or once the window cap is reached (20 for
/// sustained-weather mobs, 2 otherwise). A window is produced only when it
/// ends after `earliest_allowed`; its start is reported no earlier than
/// `search_start`.
///
/// For sustained-weather mobs a window is produced once a run of
/// satisfying weather cycles lasts the required duration. Its `start` is
/// the start of the run and its `end` is the instant that duration is first
/// reached, or `earliest_allowed` if the run was already satisfied by then.
///
/// The returned iterator is finite and can be cloned to restart the scan.
pub fn next_condition_windows(
    mob: &MobDefinition,
    search_start: DateTime<Utc>,
    earliest_allowed: DateTime<Utc>,
    search_limit: DateTime<Utc>,
) -> ConditionWindows<'_> {
    ConditionWindows::new(
        mob.condition.as_ref(),
        search_start.timestamp(),
        earliest_allowed.timestamp(),
        search_limit.timestamp(),
    )
}

/// Iterator returned by [`next_condition_windows`].
#[derive(Debug, Clone)]
pub struct ConditionWindows<'a> {
    condition: Option<&'a SpawnCondition>,
    cursor: i64,
    step: i64,
    search_start: i64,
    earliest: i64,
    limit: i64,
    sustained_secs: Option<i64>,
    cap: usize,
    emitted: usize,
}

impl<'a> ConditionWindows<'a> {
    fn new(
        condition: Option<&'a SpawnCondition>,
        search_start: i64,
        earliest: i64,
        limit: i64,
    ) -> Self {
        let step = condition.map_or(GAME_HOUR_SECS, scan_step);
        let sustained_secs = condition
            .filter(|c| c.requires_sustained_weather())
            .and_then(|c| c.weather_duration_minutes)
            .map(|minutes| i64::from(minutes).saturating_mul(60));
        let cap = if sustained_secs.is_some() {
            SUSTAINED_WINDOW_CAP
        } else {
            DEFAULT_WINDOW_CAP
        };
        let mut cursor = floor_to(search_start, step);
        if let (Some(condition), Some(_)) = (condition, sustained_secs) {
            // Runs already under way at the search start count toward the
            // sustained duration from their true start.
            let floor = search_start.saturating_sub(SUSTAINED_LOOKBACK_SECS);
            if condition_holds_at(condition, cursor) {
                while cursor > floor && condition_holds_at(condition, cursor.saturating_sub(step)) {
                    cursor = cursor.saturating_sub(step);
                }
            }
        }

        Self {
            condition,
            cursor,
            step,
            search_start,
            earliest,
            limit,
            sustained_secs,
            cap,
            emitted: 0,
        }
    }

    /// Advance to the next maximal run of holding steps.
    fn next_run(&mut self, condition: &SpawnCondition) -> Option<(i64, i64)> {
        while self.cursor < self.limit && !condition_holds_at(condition, self.cursor) {
            self.cursor = self.cursor.saturating_add(self.step);
        }
        if self.cursor >= self.limit {
            return None;
        }
        let start = self.cursor;
        while self.cursor < self.limit && condition_holds_at(condition, self.cursor) {
            self.cursor = self.cursor.saturating_add(self.step);
        }
        Some((start, self.cursor))
    }

    fn window_for_run(&self, run_start: i64, run_end: i64) -> Option<ConditionWindow> {
        match self.sustained_secs {
            Some(required) => {
                let satisfied_from = run_start.saturating_add(required);
                if satisfied_from > run_end || run_end <= self.earliest {
                    return None;
                }
                let end = satisfied_from.max(self.earliest);
                Some(ConditionWindow {
                    start: instant(run_start)?,
                    end: instant(end)?,
                })
            }
            None => {
                if run_end <= self.earliest {
                    return None;
                }
                Some(ConditionWindow {
                    start: instant(run_start.max(self.search_start))?,
                    end: instant(run_end)?,
                })
            }
        }
    }
}

impl Iterator for ConditionWindows<'_> {
    type Item = ConditionWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted >= self.cap {
            return None;
        }

        let Some(condition) = self.condition else {
            // Unconditioned: the whole search range is one window.
            self.emitted = self.cap;
            if self.limit <= self.earliest {
                return None;
            }
            return Some(ConditionWindow {
                start: instant(self.search_start)?,
                end: instant(self.limit)?,
            });
        };

        while let Some((run_start, run_end)) = self.next_run(condition) {
            if let Some(window) = self.window_for_run(run_start, run_end) {
                self.emitted = self.emitted.saturating_add(1);
                return Some(window);
            }
        }
        None
    }
}
