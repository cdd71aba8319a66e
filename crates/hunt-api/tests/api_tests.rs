//! Integration tests for the tracker API endpoints.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, over an in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use hunt_api::{AppState, build_router};
use hunt_core::MobCatalog;
use hunt_db::MemoryStore;
use hunt_projection::ProjectionStore;
use hunt_reports::{ReportPolicy, ReportService};
use hunt_types::{MobDefinition, MobId, Rank, SpawnPoint};
use serde_json::{Value, json};
use tower::ServiceExt;

const T0: i64 = 1_700_000_000;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn catalog() -> MobCatalog {
    let mob = |id: &str, rank: Rank, points: &[&str]| MobDefinition {
        id: MobId::from(id),
        name: format!("Mob {id}"),
        rank,
        area: String::from("Test Area"),
        repop_seconds: 3_600,
        max_repop_seconds: 7_200,
        condition: None,
        spawn_points: points
            .iter()
            .map(|p| SpawnPoint {
                id: (*p).to_owned(),
                x: 0.0,
                y: 0.0,
                ranks: vec![rank],
            })
            .collect(),
    };
    MobCatalog::from_definitions([
        mob("62001", Rank::S, &["p1", "p2"]),
        mob("41001", Rank::A, &["a1"]),
        mob("53001", Rank::F, &[]),
    ])
    .unwrap()
}

async fn make_router() -> Router {
    let store = MemoryStore::new();
    let catalog = Arc::new(catalog());
    let projection = ProjectionStore::initialize(&store, Arc::clone(&catalog))
        .await
        .unwrap();
    let reports = ReportService::new(store, catalog, ReportPolicy::default());
    build_router(Arc::new(AppState::new(reports, projection, None)))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(router: &Router, path: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn post(router: &Router, path: &str, body: &Value) -> (StatusCode, Value) {
    post_raw(router, path, body.to_string()).await
}

async fn post_raw(router: &Router, path: &str, body: String) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::post(path)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn report(mob: &str, kill: i64) -> Value {
    json!({
        "mob_id": mob,
        "kill_time": at(kill),
        "reporter_uid": "anon-1",
        "memo": "spotted by the lake",
    })
}

// =========================================================================
// Reads
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let router = make_router().await;
    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_server_time() {
    let router = make_router().await;
    let (status, json) = get(&router, "/api/time").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(json["data"]["now"].is_string());
}

#[tokio::test]
async fn test_list_mobs() {
    let router = make_router().await;
    let (status, json) = get(&router, "/api/mobs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
    assert_eq!(json["data"][0]["id"], "41001");
    assert_eq!(json["data"][0]["window"]["status"], "next");
}

#[tokio::test]
async fn test_get_mob_not_found() {
    let router = make_router().await;
    let (status, json) = get(&router, "/api/mobs/62999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_logs_of_unknown_mob() {
    let router = make_router().await;
    let (status, _) = get(&router, "/api/mobs/62999/logs").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =========================================================================
// Reports
// =========================================================================

#[tokio::test]
async fn test_submit_report_accepted() {
    let router = make_router().await;
    let (status, json) = post(&router, "/api/reports", &report("62001", T0)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["reconciliation"]["outcome"], "accepted");
    assert!(json["data"]["report_id"].is_string());
}

#[tokio::test]
async fn test_duplicate_report_is_rejected_inline() {
    let router = make_router().await;
    post(&router, "/api/reports", &report("62001", T0)).await;
    let (status, json) = post(&router, "/api/reports", &report("62001", T0)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "too_old_or_duplicate");
    assert_eq!(json["data"]["reconciliation"]["reason"], "too_old_or_duplicate");
}

#[tokio::test]
async fn test_malformed_report_is_bad_request() {
    let router = make_router().await;
    let missing_time = json!({"mob_id": "62001", "reporter_uid": "anon-1"});
    let (status, json) = post(&router, "/api/reports", &missing_time).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "bad_request");

    let (status, _) = post_raw(&router, "/api/reports", String::from("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut long_memo = report("62001", T0);
    long_memo["memo"] = json!("x".repeat(201));
    let (status, _) = post(&router, "/api/reports", &long_memo).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_far_future_report_is_bad_request() {
    let router = make_router().await;
    let mut far_future = report("62001", T0);
    far_future["kill_time"] = json!("+262142-12-01T00:00:00Z");
    let (status, json) = post(&router, "/api/reports", &far_future).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");

    let (status, _) = get(&router, "/api/mobs").await;
    assert_eq!(status, StatusCode::OK);
    let (_, json) = post(&router, "/api/reports", &report("62001", T0)).await;
    assert_eq!(json["data"]["reconciliation"]["outcome"], "accepted");
}

#[tokio::test]
async fn test_projection_follows_accepted_report() {
    let router = make_router().await;
    post(&router, "/api/reports", &report("41001", T0)).await;

    let expected = json!(at(T0));
    let mut seen = Value::Null;
    for _ in 0..50 {
        let (_, json) = get(&router, "/api/mobs/41001").await;
        seen = json["data"]["status"]["current_kill_time"].clone();
        if seen == expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_reports_query() {
    let router = make_router().await;
    post(&router, "/api/reports", &report("62001", T0)).await;
    post(&router, "/api/reports", &report("62001", T0 + 7_200)).await;
    post(&router, "/api/reports", &report("41001", T0)).await;

    let (status, json) = get(&router, "/api/reports?mob_id=62001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let (_, json) = get(
        &router,
        "/api/reports?mob_id=62001&from=2023-11-14T23:00:00Z",
    )
    .await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let (status, _) = get(&router, "/api/reports").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_logs_after_second_kill() {
    let router = make_router().await;
    post(&router, "/api/reports", &report("62001", T0)).await;
    post(&router, "/api/reports", &report("62001", T0 + 3_600)).await;

    let (status, json) = get(&router, "/api/mobs/62001/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["record"]["current_kill_time"], json!(at(T0)));
}

// =========================================================================
// Revert
// =========================================================================

#[tokio::test]
async fn test_revert_flow() {
    let router = make_router().await;
    post(&router, "/api/reports", &report("62001", T0)).await;
    post(&router, "/api/reports", &report("62001", T0 + 3_600)).await;

    let (status, json) = post(&router, "/api/revert", &json!({"mob_id": "62001"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["kill_time"], json!(at(T0)));

    let (status, json) = post(&router, "/api/revert", &json!({"mob_id": "62001"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "nothing_to_revert");
}

#[tokio::test]
async fn test_revert_deeper_target_is_unsupported() {
    let router = make_router().await;
    let body = json!({"mob_id": "62001", "target": {"history": 2}});
    let (status, json) = post(&router, "/api/revert", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "unsupported");
}

// =========================================================================
// Suppression
// =========================================================================

#[tokio::test]
async fn test_toggle_and_reset() {
    let router = make_router().await;
    let toggle = json!({
        "mob_id": "62001",
        "point_id": "p1",
        "action": "suppress",
        "client_time": at(T0),
    });
    let (status, json) = post(&router, "/api/suppression/toggle", &toggle).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["outcome"], "applied");

    let (status, json) = post(&router, "/api/suppression/reset", &json!({"mob_id": "62001"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["cleared"], 1);
}

#[tokio::test]
async fn test_toggle_rejections() {
    let router = make_router().await;
    let not_tracked = json!({
        "mob_id": "53001",
        "point_id": "p1",
        "action": "suppress",
        "client_time": at(T0),
    });
    let (status, json) = post(&router, "/api/suppression/toggle", &not_tracked).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "not_tracked");

    let bad_action = json!({
        "mob_id": "62001",
        "point_id": "p1",
        "action": "explode",
        "client_time": at(T0),
    });
    let (status, _) = post(&router, "/api/suppression/toggle", &bad_action).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =========================================================================
// Memos
// =========================================================================

#[tokio::test]
async fn test_memos() {
    let router = make_router().await;
    let (status, json) = post(&router, "/api/mobs/62001/memos", &json!({"text": "camp at the ridge"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (status, json) = get(&router, "/api/mobs/62001/memos").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["text"], "camp at the ridge");

    let (status, _) = post(&router, "/api/mobs/62999/memos", &json!({"text": "hello"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(&router, "/api/mobs/62001/memos", &json!({"text": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
