//! Core entity structs for the hunt tracker.
//!
//! Static catalog entries (`MobDefinition` and friends), the shared mutable
//! documents (`MobStatusDocument`, `MobLocationState`), append-only records
//! (`Report`, `MemoEntry`, log records), and the change events the store
//! emits when a document moves.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Collection, MoonPhase, Rank, SkipReason};
use crate::ids::{MobId, ReportId};

// ---------------------------------------------------------------------------
// Static catalog
// ---------------------------------------------------------------------------

/// Half-open range of in-game hours `[start, end)`.
///
/// When `start > end` the range wraps past midnight, so `17..3` covers
/// 17:00 through 02:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HourRange {
    /// First in-game hour inside the range (0-23).
    pub start: u8,
    /// First in-game hour after the range (0-23).
    pub end: u8,
}

impl HourRange {
    /// Whether the given in-game hour falls inside the range.
    pub const fn contains(self, hour: u8) -> bool {
        if self.start <= self.end {
            self.start <= hour && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }
}

/// Inclusive range of weather seed values `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SeedRange {
    /// Lowest matching seed (0-99).
    pub min: u8,
    /// Highest matching seed (0-99).
    pub max: u8,
}

impl SeedRange {
    /// Whether the seed falls inside the range.
    pub const fn contains(self, seed: u8) -> bool {
        self.min <= seed && seed <= self.max
    }
}

/// Gate that must hold for a mob to spawn.
///
/// Every specified part must hold at the same instant. Empty lists and
/// `None` fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct SpawnCondition {
    /// Required lunar phase label.
    pub moon_phase: Option<MoonPhase>,
    /// In-game hour ranges; any one of them must contain the current hour.
    pub time_ranges: Vec<HourRange>,
    /// Hour ranges that replace `time_ranges` on the first night of the
    /// lunar cycle (phase below 1.5).
    pub first_night_ranges: Vec<HourRange>,
    /// Weather seed ranges; any one of them must contain the current seed.
    pub weather_seed_ranges: Vec<SeedRange>,
    /// Minutes the weather condition must hold without interruption.
    pub weather_duration_minutes: Option<u32>,
}

impl SpawnCondition {
    /// Whether the condition depends on the weather seed.
    pub fn involves_weather(&self) -> bool {
        !self.weather_seed_ranges.is_empty()
    }

    /// Whether the condition requires a sustained weather duration.
    pub fn requires_sustained_weather(&self) -> bool {
        self.involves_weather() && self.weather_duration_minutes.is_some_and(|m| m > 0)
    }
}

/// Named sub-location where a mob may spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpawnPoint {
    /// Identifier, unique within the mob.
    pub id: String,
    /// Map X coordinate for display.
    pub x: f64,
    /// Map Y coordinate for display.
    pub y: f64,
    /// Ranks whose mobs may spawn at this point.
    pub ranks: Vec<Rank>,
}

impl SpawnPoint {
    /// Whether mobs of `rank` can use this point.
    pub fn applies_to(&self, rank: Rank) -> bool {
        self.ranks.contains(&rank)
    }
}

/// Static, read-only description of a tracked mob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MobDefinition {
    /// Catalog code.
    pub id: MobId,
    /// Display name.
    pub name: String,
    /// Rank of the mob.
    pub rank: Rank,
    /// Area or region the mob lives in.
    pub area: String,
    /// Minimum seconds after a kill before the mob can respawn.
    pub repop_seconds: u32,
    /// Seconds after a kill by which the mob has certainly respawned.
    pub max_repop_seconds: u32,
    /// Optional spawn gate.
    #[serde(default)]
    pub condition: Option<SpawnCondition>,
    /// Ordered spawn sub-locations.
    #[serde(default)]
    pub spawn_points: Vec<SpawnPoint>,
}

impl MobDefinition {
    /// Spawn points that carry suppression state for this mob.
    pub fn suppressible_points(&self) -> impl Iterator<Item = &SpawnPoint> {
        let rank = self.rank;
        self.spawn_points
            .iter()
            .filter(move |p| rank.tracks_suppression() && p.applies_to(rank))
    }
}

/// Maintenance window published by the game operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MaintenanceWindow {
    /// When the servers go down.
    pub start: DateTime<Utc>,
    /// When the servers come back.
    pub end: DateTime<Utc>,
    /// Instant the world state was reset by the restart.
    pub server_restart: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Shared status
// ---------------------------------------------------------------------------

/// Compact entry in a mob's bounded recent-report history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReportSummary {
    /// Report that produced this kill time.
    pub report_id: ReportId,
    /// Accepted kill instant.
    pub kill_time: DateTime<Utc>,
    /// Reporter-supplied note.
    #[serde(default)]
    pub memo: String,
    /// Anonymous identity of the reporter.
    #[serde(default)]
    pub reporter_uid: Option<String>,
}

/// Per-mob status record inside a rank bucket document.
///
/// `prev_kill_time` is always strictly earlier than `current_kill_time`
/// when both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct MobStatus {
    /// Authoritative last confirmed kill.
    pub current_kill_time: Option<DateTime<Utc>>,
    /// Confirmed kill before the current one, kept for one-step revert.
    pub prev_kill_time: Option<DateTime<Utc>>,
    /// Memo of the current kill.
    pub current_kill_memo: String,
    /// Memo of the previous kill.
    pub prev_kill_memo: String,
    /// Reporter of the current kill.
    pub current_reporter_uid: Option<String>,
    /// Reporter of the previous kill.
    pub prev_reporter_uid: Option<String>,
    /// Recent accepted reports, newest first.
    pub history: Vec<ReportSummary>,
    /// Set when the current kill was restored by a revert.
    pub is_reverted: bool,
}

/// Shared document for one rank bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct MobStatusDocument {
    /// Status records keyed by mob code.
    pub mobs: BTreeMap<MobId, MobStatus>,
    /// Server time of the last write.
    pub updated_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// A single kill report submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Report {
    /// Report identifier.
    pub id: ReportId,
    /// Mob the report is about.
    pub mob_id: MobId,
    /// Claimed kill instant.
    pub kill_time: DateTime<Utc>,
    /// Anonymous identity of the reporter.
    pub reporter_uid: String,
    /// Free-text note.
    #[serde(default)]
    pub memo: String,
    /// Mob's minimum repop duration, captured at submission time.
    pub repop_seconds: u32,
    /// Server time the report was stored.
    pub created_at: DateTime<Utc>,
    /// Whether reconciliation has finalized this report.
    #[serde(default)]
    pub is_processed: bool,
    /// Set when reconciliation rejected the report.
    #[serde(default)]
    pub skip_reason: Option<SkipReason>,
    /// Whether the report may feed a later averaging refinement.
    #[serde(default)]
    pub averaging_eligible: bool,
    /// Server time the report was finalized.
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Suppression
// ---------------------------------------------------------------------------

/// Suppression marks of a single spawn point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct PointMarks {
    /// When the point was last marked searched-and-empty.
    pub suppressed_at: Option<DateTime<Utc>>,
    /// When the point was last marked as possible again.
    pub unsuppressed_at: Option<DateTime<Utc>>,
}

/// Shared suppression document of one mob.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "bindings/")]
pub struct MobLocationState {
    /// Marks keyed by spawn point identifier.
    pub points: BTreeMap<String, PointMarks>,
    /// Last confirmed kill, mirrored from the status bucket.
    pub last_kill_time: Option<DateTime<Utc>>,
    /// After this instant the whole record may be purged.
    pub expires_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Append-only records
// ---------------------------------------------------------------------------

/// Free-form note attached to a mob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MemoEntry {
    /// Note text.
    pub text: String,
    /// Server time the note was created.
    pub created_at: DateTime<Utc>,
}

/// Archived copy of a per-mob status record, written before it is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatusLogRecord {
    /// Report whose acceptance replaced the record.
    pub report_id: ReportId,
    /// Server time of the archive.
    pub archived_at: DateTime<Utc>,
    /// The replaced record.
    pub record: MobStatus,
}

/// Archived copy of a mob's suppression points, written on each new kill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LocationLogRecord {
    /// Report whose acceptance triggered the archive.
    pub report_id: ReportId,
    /// Server time of the archive.
    pub archived_at: DateTime<Utc>,
    /// The points as they were before the new kill.
    pub points: BTreeMap<String, PointMarks>,
}

// ---------------------------------------------------------------------------
// Change feed
// ---------------------------------------------------------------------------

/// A document change published by the store.
///
/// Events for the same document are delivered in commit order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ChangeEvent {
    /// A document was created.
    Added {
        /// Collection of the document.
        collection: Collection,
        /// Document key.
        key: String,
        /// New document body.
        document: serde_json::Value,
    },
    /// An existing document was overwritten.
    Modified {
        /// Collection of the document.
        collection: Collection,
        /// Document key.
        key: String,
        /// New document body.
        document: serde_json::Value,
    },
    /// A document was deleted.
    Removed {
        /// Collection of the document.
        collection: Collection,
        /// Document key.
        key: String,
    },
}

impl ChangeEvent {
    /// Collection the event belongs to.
    pub const fn collection(&self) -> Collection {
        match self {
            Self::Added { collection, .. }
            | Self::Modified { collection, .. }
            | Self::Removed { collection, .. } => *collection,
        }
    }

    /// Key of the changed document.
    pub fn key(&self) -> &str {
        match self {
            Self::Added { key, .. } | Self::Modified { key, .. } | Self::Removed { key, .. } => key,
        }
    }
}
