//! REST API endpoint handlers for the tracker server.
//!
//! Read endpoints serve from the live projection; every write goes
//! through the [`hunt_reports::ReportService`] transactions.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/time` | Server clock |
//! | `GET` | `/api/mobs` | Projected view of every mob |
//! | `GET` | `/api/mobs/{id}` | Projected view of one mob |
//! | `GET` | `/api/mobs/{id}/logs` | Archived status records |
//! | `GET` | `/api/mobs/{id}/memos` | Notes, newest first |
//! | `POST` | `/api/mobs/{id}/memos` | Add a note |
//! | `POST` | `/api/reports` | Submit a kill report |
//! | `GET` | `/api/reports` | Reports of a mob in a time range |
//! | `POST` | `/api/revert` | Restore the previous kill |
//! | `POST` | `/api/suppression/toggle` | Mark a spawn point |
//! | `POST` | `/api/suppression/reset` | Clear a mob's spawn points |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use chrono::{DateTime, Utc};
use hunt_db::DocumentStore;
use hunt_projection::MobView;
use hunt_reports::{NewReport, RevertTarget};
use hunt_types::{MemoEntry, MobId, Report, StatusLogRecord, SuppressionAction};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::response::{ApiResponse, Outcome};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies and query parameters
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/reports`.
#[derive(Debug, Deserialize)]
pub struct ReportsQuery {
    /// Mob whose reports to list.
    pub mob_id: MobId,
    /// Inclusive lower bound on the kill time.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the kill time.
    pub to: Option<DateTime<Utc>>,
}

/// Body of `POST /api/revert`.
#[derive(Debug, Deserialize)]
pub struct RevertRequest {
    /// Mob to revert.
    pub mob_id: MobId,
    /// Record to restore.
    #[serde(default)]
    pub target: RevertTarget,
}

/// Body of `POST /api/suppression/toggle`.
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    /// Mob the point belongs to.
    pub mob_id: MobId,
    /// Spawn point to mark.
    pub point_id: String,
    /// Mark direction.
    pub action: SuppressionAction,
    /// The client's clock when the mark was made.
    pub client_time: DateTime<Utc>,
}

/// Body of `POST /api/suppression/reset`.
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    /// Mob whose points to clear.
    pub mob_id: MobId,
}

/// Body of `POST /api/mobs/{id}/memos`.
#[derive(Debug, Deserialize)]
pub struct MemoRequest {
    /// Note text.
    pub text: String,
}

/// Payload of `GET /api/time`.
#[derive(Debug, Serialize)]
pub struct ServerTime {
    /// The server's current instant.
    pub now: DateTime<Utc>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing server status and API links.
pub async fn index<S: DocumentStore>(State(state): State<Arc<AppState<S>>>) -> impl IntoResponse {
    let now = state.now();
    let mob_count = state.reports.catalog().len();
    let revision = state.projection.revision();
    let maintenance = state.maintenance.as_ref().map_or_else(
        || String::from("none announced"),
        |m| format!("{} to {}", m.start, m.end),
    );

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Hunt Tracker</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.25rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
    </style>
</head>
<body>
    <h1>Hunt Tracker</h1>
    <div>
        <div class="metric"><div class="label">Server time</div><div class="value">{now}</div></div>
        <div class="metric"><div class="label">Mobs</div><div class="value">{mob_count}</div></div>
        <div class="metric"><div class="label">Revision</div><div class="value">{revision}</div></div>
        <div class="metric"><div class="label">Maintenance</div><div class="value">{maintenance}</div></div>
    </div>
    <h2>API Endpoints</h2>
    <ul>
        <li>GET <a href="/api/time">/api/time</a></li>
        <li>GET <a href="/api/mobs">/api/mobs</a></li>
        <li>GET /api/mobs/{{id}}, /api/mobs/{{id}}/logs, /api/mobs/{{id}}/memos</li>
        <li>GET /api/reports?mob_id=..&amp;from=..&amp;to=..</li>
        <li>POST /api/reports, /api/revert, /api/suppression/toggle, /api/suppression/reset</li>
        <li>WS /ws/changes</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Return the server clock.
pub async fn server_time<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResponse<ServerTime> {
    ApiResponse::ok(ServerTime { now: state.now() })
}

/// Return the projected view of every mob.
pub async fn list_mobs<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResponse<Vec<MobView>> {
    let views = state
        .projection
        .views(state.maintenance.as_ref(), state.now())
        .await;
    ApiResponse::ok(views)
}

/// Return the projected view of one mob.
pub async fn get_mob<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<MobView>, ApiError> {
    let mob_id = MobId::new(id);
    state
        .projection
        .view(&mob_id, state.maintenance.as_ref(), state.now())
        .await
        .map(ApiResponse::ok)
        .ok_or_else(|| ApiError::NotFound(format!("mob {mob_id}")))
}

/// Return the archived status records of one mob, oldest first.
pub async fn mob_logs<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Vec<StatusLogRecord>>, ApiError> {
    let mob_id = known_mob(&state, id)?;
    let records = state.reports.status_log(&mob_id).await?;
    Ok(ApiResponse::ok(records))
}

/// Return the reports of one mob whose kill time lies in `[from, to)`.
pub async fn list_reports<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<ReportsQuery>, QueryRejection>,
) -> Result<ApiResponse<Vec<Report>>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let reports = state
        .reports
        .reports_in_range(&query.mob_id, query.from, query.to)
        .await?;
    Ok(ApiResponse::ok(reports))
}

fn known_mob<S: DocumentStore>(state: &AppState<S>, id: String) -> Result<MobId, ApiError> {
    let mob_id = MobId::new(id);
    if state.reports.catalog().get(&mob_id).is_none() {
        return Err(ApiError::NotFound(format!("mob {mob_id}")));
    }
    Ok(mob_id)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Store a kill report and reconcile it.
pub async fn submit_report<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<NewReport>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let new = body(payload)?;
    let outcome = state.reports.submit(new).await?;
    let reconciled = outcome.reconciliation.clone().into_response_body();
    Ok(ApiResponse {
        success: reconciled.success,
        message: reconciled.message,
        error: reconciled.error,
        data: Some(outcome),
    })
}

/// Restore a mob's previous kill.
pub async fn revert<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<RevertRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body(payload)?;
    let outcome = state.reports.revert(&request.mob_id, request.target).await?;
    Ok(outcome.into_response_body())
}

/// Mark one spawn point.
pub async fn toggle_point<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body(payload)?;
    let outcome = state
        .reports
        .toggle_point(
            &request.mob_id,
            &request.point_id,
            request.action,
            request.client_time,
        )
        .await?;
    Ok(outcome.into_response_body())
}

/// Clear every spawn point of a mob.
pub async fn reset_points<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<ResetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = body(payload)?;
    let outcome = state.reports.reset_points(&request.mob_id).await?;
    Ok(outcome.into_response_body())
}

// ---------------------------------------------------------------------------
// Memos
// ---------------------------------------------------------------------------

/// Attach a note to a mob.
pub async fn add_memo<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<MemoRequest>, JsonRejection>,
) -> Result<ApiResponse<MemoEntry>, ApiError> {
    let request = body(payload)?;
    let entry = state.reports.add_memo(&MobId::new(id), &request.text).await?;
    Ok(ApiResponse::ok(entry).with_message("memo added"))
}

/// List a mob's notes, newest first.
pub async fn list_memos<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Vec<MemoEntry>>, ApiError> {
    let memos = state.reports.memos(&MobId::new(id)).await?;
    Ok(ApiResponse::ok(memos))
}
