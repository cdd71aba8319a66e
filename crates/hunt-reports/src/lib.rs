//! Kill report processing for the hunt tracker.
//!
//! This crate is the only writer of shared mob status. Every operation runs
//! as a conflict-retried transaction on a [`hunt_db::DocumentStore`], so
//! concurrent reports for the same mob are applied one at a time and can
//! never both be accepted against a stale kill time.
//!
//! # Modules
//!
//! - [`reconcile`] -- Accept or reject a stored report
//! - [`revert`] -- One-step undo of a confirmed kill
//! - [`suppression`] -- Spawn point toggle and reset
//! - [`submit`] -- Submission payload validation
//! - [`memo`] -- Free-form mob notes
//! - [`service`] -- [`ReportService`], the entry point for all of the above
//! - [`error`] -- Shared error types

pub mod error;
pub mod memo;
pub mod reconcile;
pub mod revert;
pub mod service;
pub mod submit;
pub mod suppression;

pub use error::ReportError;
pub use reconcile::ReconcileOutcome;
pub use revert::{RevertOutcome, RevertTarget};
pub use service::{ReportPolicy, ReportService};
pub use submit::{NewReport, SubmitOutcome};
pub use suppression::{ResetOutcome, ToggleOutcome};
