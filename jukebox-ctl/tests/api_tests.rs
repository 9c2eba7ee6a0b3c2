//! HTTP API integration tests
//!
//! Requests go through the full router (tower `oneshot`) to a dispatcher
//! backed by the recording service caller.

mod helpers;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use helpers::{Harness, RecordingCaller, PLAY_SERVICE, TAG_SENSOR};
use jukebox_ctl::api::{create_router, AppContext};
use jukebox_ctl::controller::ControllerHandle;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

struct TestApp {
    router: Router,
    caller: Arc<RecordingCaller>,
    _dir: TempDir,
}

async fn setup_app(mappings: &str) -> TestApp {
    let h = Harness::new(mappings).await;
    let (handle, _task) = ControllerHandle::spawn(h.controller);
    let (ctx, _closing) = AppContext::new(handle, h.events);
    TestApp {
        router: create_router(ctx),
        caller: h.caller,
        _dir: h.dir,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

fn sensor(state: &str) -> Value {
    json!({
        "entity_id": TAG_SENSOR,
        "new_state": { "state": state },
    })
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app("").await;

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "jukebox-ctl");
    assert!(body["version"].is_string());
}

// =============================================================================
// Sensor Webhook
// =============================================================================

#[tokio::test]
async fn test_sensor_events_drive_playback() {
    let app = setup_app("AB12: Road Trip Mix\n").await;

    let (status, body) = send(&app, post_json("/api/v1/sensor", sensor("AB12"))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "accepted");

    // Session requests queue behind the sensor event
    let (status, session) = send(&app, get("/api/v1/session")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session, json!({ "last_tag": "AB12", "current_tag": "AB12" }));
    assert_eq!(app.caller.count(PLAY_SERVICE), 1);
}

#[tokio::test]
async fn test_sensor_removed_state_is_ignored() {
    let app = setup_app("AB12: Road Trip Mix\n").await;

    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/sensor",
            json!({ "entity_id": TAG_SENSOR, "new_state": null }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (_, session) = send(&app, get("/api/v1/session")).await;
    assert_eq!(session, json!({ "last_tag": null, "current_tag": null }));
    assert!(app.caller.calls().is_empty());
}

#[tokio::test]
async fn test_sensor_rejects_malformed_body() {
    let app = setup_app("").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/sensor")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert!(response.status().is_client_error());
}

// =============================================================================
// Mappings
// =============================================================================

#[tokio::test]
async fn test_get_mappings_returns_structured_records() {
    let app = setup_app("AB12: Road Trip Mix\n").await;

    let (status, body) = send(&app, get("/api/v1/mappings")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "AB12": { "type": "playlist", "name": "Road Trip Mix", "alias": "AB12" }
        })
    );
}

#[tokio::test]
async fn test_map_tag_request() {
    let app = setup_app("").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/mappings",
            json!({ "tag_id": "CD34", "media_type": "folder", "media_name": "Kids/Songs" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tag_id"], "CD34");
    assert_eq!(
        body["media"],
        json!({ "kind": "folder", "name": "Kids/Songs", "alias": "CD34" })
    );

    let (_, mappings) = send(&app, get("/api/v1/mappings")).await;
    assert_eq!(mappings["CD34"]["type"], "folder");
}

#[tokio::test]
async fn test_map_tag_missing_fields_is_bad_request() {
    let app = setup_app("").await;

    let (status, body) = send(
        &app,
        post_json("/api/v1/mappings", json!({ "tag_id": "", "media_name": "Lullabies" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["status"].as_str().unwrap().contains("missing"));

    let (status, _) = send(&app, post_json("/api/v1/mappings", json!({ "tag_id": "AB12" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, mappings) = send(&app, get("/api/v1/mappings")).await;
    assert_eq!(mappings, json!({}));
}

#[tokio::test]
async fn test_map_last_scanned_tag() {
    let app = setup_app("").await;

    let request = json!({ "media_name": "Road Trip Mix" });
    let (status, _) = send(&app, post_json("/api/v1/mappings/last", request.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(&app, post_json("/api/v1/sensor", sensor("ZZ99"))).await;
    let (status, body) = send(&app, post_json("/api/v1/mappings/last", request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (_, mappings) = send(&app, get("/api/v1/mappings")).await;
    assert_eq!(mappings["ZZ99"]["name"], "Road Trip Mix");
}

#[tokio::test]
async fn test_reload_endpoint() {
    let app = setup_app("AB12: Road Trip Mix\nCD34: Lullabies\n").await;

    let (status, body) = send(&app, post_json("/api/v1/mappings/reload", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
}

// =============================================================================
// Events
// =============================================================================

#[tokio::test]
async fn test_event_stream_content_type() {
    let app = setup_app("").await;

    let response = app.router.clone().oneshot(get("/api/v1/events")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}
