//! Calendar, spawn timing, and suppression rules for the hunt tracker.
//!
//! Everything in this crate is pure and synchronous: the same inputs always
//! produce the same outputs, and nothing here touches the shared store.
//!
//! # Modules
//!
//! - [`calendar`] -- In-game time, lunar phase, weather seed, and spawn
//!   condition windows.
//! - [`catalog`] -- Static mob catalog loading and validation.
//! - [`config`] -- Configuration loading from `hunt-config.yaml` into
//!   strongly-typed structs.
//! - [`spawn_window`] -- Earliest/latest respawn, progress, and timer
//!   status for a mob.
//! - [`suppression`] -- Spawn point suppression predicate and the
//!   "last point" projection.

pub mod calendar;
pub mod catalog;
pub mod config;
pub mod spawn_window;
pub mod suppression;

pub use calendar::{
    ConditionWindow, ConditionWindows, GameTime, condition_holds, game_time_of, lunar_label_of,
    lunar_phase_of, next_condition_windows, weather_seed_of,
};
pub use catalog::{CatalogError, MobCatalog};
pub use config::{ConfigError, StoreBackend, TrackerConfig};
pub use spawn_window::{SpawnWindow, WindowAnchor, calculate};
pub use suppression::{PointView, is_suppressed, project_points};
