//! Axum router construction for the tracker API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use hunt_db::DocumentStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the tracker server.
///
/// See [`handlers`] for the endpoint table; `GET /ws/changes` streams the
/// store's change events.
///
/// CORS allows any origin so browser clients can be served from anywhere.
pub fn build_router<S: DocumentStore>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index::<S>))
        // WebSocket
        .route("/ws/changes", get(ws::ws_changes::<S>))
        // Reads
        .route("/api/time", get(handlers::server_time::<S>))
        .route("/api/mobs", get(handlers::list_mobs::<S>))
        .route("/api/mobs/{id}", get(handlers::get_mob::<S>))
        .route("/api/mobs/{id}/logs", get(handlers::mob_logs::<S>))
        .route(
            "/api/mobs/{id}/memos",
            get(handlers::list_memos::<S>).post(handlers::add_memo::<S>),
        )
        // Reports
        .route(
            "/api/reports",
            get(handlers::list_reports::<S>).post(handlers::submit_report::<S>),
        )
        .route("/api/revert", post(handlers::revert::<S>))
        // Suppression
        .route("/api/suppression/toggle", post(handlers::toggle_point::<S>))
        .route("/api/suppression/reset", post(handlers::reset_points::<S>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
