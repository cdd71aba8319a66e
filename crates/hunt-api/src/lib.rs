//! Tracker API server for crowd-sourced hunt reports.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for submitting kill reports, reverting a kill,
//!   toggling and resetting spawn point suppression, notes, and report
//!   queries
//! - **Projected mob views** with spawn windows and suppression state
//! - **`WebSocket` endpoint** (`/ws/changes`) streaming every committed
//!   document change
//! - **Minimal HTML status page** (`GET /`)
//!
//! Every endpoint answers with the same `{success, message?, error?,
//! data?}` envelope ([`ApiResponse`]).
//!
//! # Architecture
//!
//! Reads come from a [`hunt_projection::ProjectionStore`] that follows the
//! store's change stream, so list endpoints never touch the store. Writes
//! run as retried transactions through [`hunt_reports::ReportService`].
//! The router is generic over the [`hunt_db::DocumentStore`] backend.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use response::ApiResponse;
pub use router::build_router;
pub use server::{ServeError, start_server};
pub use state::AppState;
