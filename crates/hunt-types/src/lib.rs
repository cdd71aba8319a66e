//! Shared type definitions for the hunt tracker.
//!
//! This crate is the single source of truth for all types used across the
//! workspace. Types defined here flow downstream to `TypeScript` via `ts-rs`
//! for the browser clients.
//!
//! # Modules
//!
//! - [`ids`] -- Mob codes and report identifiers
//! - [`enums`] -- Ranks, lunar labels, timer states, store collections
//! - [`structs`] -- Catalog entries, shared documents, reports, change events

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Collection, LogCollection, MoonPhase, Rank, SkipReason, SpawnStatus, SuppressionAction};
pub use ids::{MobId, ReportId};
pub use structs::{
    ChangeEvent, HourRange, LocationLogRecord, MaintenanceWindow, MemoEntry, MobDefinition,
    MobLocationState, MobStatus, MobStatusDocument, PointMarks, Report, ReportSummary, SeedRange,
    SpawnCondition, SpawnPoint, StatusLogRecord,
};
