//! Enumeration types for the hunt tracker.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Rank
// ---------------------------------------------------------------------------

/// Rank of a tracked mob.
///
/// Every rank owns exactly one shared status document (its "bucket") that
/// holds the per-mob status records of all mobs of that rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Rank {
    /// S rank: long repop, condition-gated, spawn points tracked.
    S,
    /// A rank: short repop, spawn points tracked.
    A,
    /// FATE-spawned mob.
    F,
}

impl Rank {
    /// All ranks, in bucket order.
    pub const ALL: [Self; 3] = [Self::S, Self::A, Self::F];

    /// Key of the shared status document for this rank bucket.
    pub const fn status_document(self) -> &'static str {
        match self {
            Self::S => "s_latest",
            Self::A => "a_latest",
            Self::F => "f_latest",
        }
    }

    /// Resolve a rank from its status document key.
    pub fn from_status_document(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rank| rank.status_document() == key)
    }

    /// Whether mobs of this rank carry spawn-point suppression state.
    pub const fn tracks_suppression(self) -> bool {
        matches!(self, Self::S | Self::A)
    }
}

// ---------------------------------------------------------------------------
// Lunar phase labels
// ---------------------------------------------------------------------------

/// Named lunar phase used as a spawn gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum MoonPhase {
    /// Start of the 32-day cycle.
    NewMoon,
    /// Middle of the 32-day cycle.
    FullMoon,
}

// ---------------------------------------------------------------------------
// Spawn timer status
// ---------------------------------------------------------------------------

/// Derived timer state for a mob at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum SpawnStatus {
    /// Window is anchored to a server restart and has not opened yet.
    AwaitingRestart,
    /// Window is anchored to the last kill and has not opened yet.
    Next,
    /// Between the earliest and latest repop instants.
    PopWindow,
    /// Inside the pop window and the spawn condition currently holds.
    ConditionActive,
    /// Past the latest repop instant.
    MaxOver,
}

// ---------------------------------------------------------------------------
// Report skip reasons
// ---------------------------------------------------------------------------

/// Why the reconciliation step refused to apply a report.
///
/// The reason is stored on the report itself; rejected reports are still
/// marked processed so they are never reconciled twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SkipReason {
    /// The mob code does not map to a rank bucket.
    UnknownMob,
    /// The claimed kill is not after the current confirmed kill.
    TooOldOrDuplicate,
    /// The claimed kill is before the earliest plausible repop.
    TooEarly,
}

impl SkipReason {
    /// Human-readable reason stored alongside the report.
    pub const fn message(self) -> &'static str {
        match self {
            Self::UnknownMob => "unknown rank bucket",
            Self::TooOldOrDuplicate => "too old or duplicate",
            Self::TooEarly => "too early",
        }
    }
}

impl core::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

// ---------------------------------------------------------------------------
// Suppression actions
// ---------------------------------------------------------------------------

/// Toggle direction for a spawn point mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SuppressionAction {
    /// Mark the point as searched and empty.
    Suppress,
    /// Withdraw a previous suppression mark.
    Unsuppress,
}

// ---------------------------------------------------------------------------
// Store collections
// ---------------------------------------------------------------------------

/// Mutable document collections in the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Collection {
    /// One document per rank bucket, keyed by [`Rank::status_document`].
    MobStatus,
    /// One document per mob with suppression-capable points.
    MobLocations,
    /// One document per submitted report.
    Reports,
}

impl Collection {
    /// Stable storage name of the collection.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MobStatus => "mob_status",
            Self::MobLocations => "mob_locations",
            Self::Reports => "reports",
        }
    }

    /// Parse a storage name back into a collection.
    pub fn parse(name: &str) -> Option<Self> {
        [Self::MobStatus, Self::MobLocations, Self::Reports]
            .into_iter()
            .find(|c| c.as_str() == name)
    }
}

/// Append-only log collections, each keyed by mob id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum LogCollection {
    /// Archived per-mob status records, one per accepted report.
    MobStatusLog,
    /// Archived suppression points, one per accepted report.
    MobLocationLog,
    /// Free-form notes attached to a mob.
    Memos,
}

impl LogCollection {
    /// Stable storage name of the log.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MobStatusLog => "mob_status_log",
            Self::MobLocationLog => "mob_location_log",
            Self::Memos => "memos",
        }
    }
}
