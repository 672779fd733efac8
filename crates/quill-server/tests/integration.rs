use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use quill_core::ServiceConfig;
use quill_server::{build_router, AppState};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a router over a simulated-generator state with a long cleanup grace
/// so snapshots stay readable for the duration of a test.
fn test_app() -> Router {
    let state = AppState::with_cleanup_grace(ServiceConfig::default(), Duration::from_secs(30));
    build_router(state)
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send a GET request via `oneshot` and return (status, raw body text).
/// For SSE responses this resolves once the stream ends.
async fn get_raw(app: Router, uri: &str) -> (StatusCode, String) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&body).into_owned())
}

/// Send a POST request with a JSON body via `oneshot` and return (status, parsed JSON body).
async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Start a generation and return its id.
async fn start(app: &Router, body: serde_json::Value) -> String {
    let (status, json) = post_json(app.clone(), "/api/generate", body).await;
    assert_eq!(status, StatusCode::OK);
    json["generation_id"].as_str().unwrap().to_string()
}

/// Poll the snapshot endpoint until `pred` holds or the timeout elapses.
/// Returns the last snapshot seen.
async fn wait_for(
    app: &Router,
    id: &str,
    timeout: Duration,
    pred: impl Fn(&serde_json::Value) -> bool,
) -> serde_json::Value {
    let deadline = tokio::time::Instant::now() + timeout;
    let uri = format!("/api/generate/{id}");
    let mut last = serde_json::Value::Null;
    while tokio::time::Instant::now() < deadline {
        let (status, json) = get(app.clone(), &uri).await;
        if status == StatusCode::OK {
            if pred(&json) {
                return json;
            }
            last = json;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("timed out waiting for generation {id}; last snapshot: {last}");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_simulated_generator() {
    let app = test_app();
    let (status, json) = get(app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["generator"], "simulated");
    assert_eq!(json["active"], 0);
}

#[tokio::test]
async fn start_generation_returns_id_immediately() {
    let app = test_app();
    let (status, json) = post_json(
        app,
        "/api/generate",
        serde_json::json!({
            "agent": "prose_stylist",
            "action": "generate_scene",
            "context": {"scene": "the harbor at dawn"},
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "started");
    let id = json["generation_id"].as_str().unwrap();
    assert!(id.starts_with("gen-"), "unexpected id format: {id}");
}

#[tokio::test]
async fn snapshot_unknown_id_is_404() {
    let app = test_app();
    let (status, json) = get(app, "/api/generate/gen-nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("gen-nope"));
}

#[tokio::test]
async fn sse_stream_can_attach_before_the_first_event() {
    let app = test_app();
    let id = start(
        &app,
        serde_json::json!({"agent": "prose_stylist", "action": "generate_scene"}),
    )
    .await;

    // Attach immediately: the id exists before the spawned run has emitted
    // anything, and the subscription must still be accepted.
    let (status, body) = tokio::time::timeout(
        Duration::from_secs(10),
        get_raw(app.clone(), &format!("/api/generate/{id}/events")),
    )
    .await
    .expect("SSE stream should end after the terminal event");

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("initializing"), "body was: {body}");
    assert!(body.contains("completed"), "body was: {body}");
}

#[tokio::test]
async fn cancel_unknown_id_reports_unknown() {
    let app = test_app();
    let (status, json) = post_json(
        app,
        "/api/generate/gen-nope/cancel",
        serde_json::json!({}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "unknown");
}

#[tokio::test]
async fn generation_runs_to_completion() {
    let app = test_app();
    let id = start(
        &app,
        serde_json::json!({
            "agent": "plot_architect",
            "action": "outline_plot",
            "context": {"premise": "a lighthouse keeper finds a letter"},
        }),
    )
    .await;

    let snapshot = wait_for(&app, &id, Duration::from_secs(5), |s| {
        s["status"] == "completed"
    })
    .await;

    assert_eq!(snapshot["progress"], 100);
    assert!(!snapshot["result"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_action_completes_with_placeholder() {
    let app = test_app();
    let id = start(
        &app,
        serde_json::json!({"agent": "prose_stylist", "action": "compose_sonnet"}),
    )
    .await;

    let snapshot = wait_for(&app, &id, Duration::from_secs(5), |s| {
        s["status"] == "completed"
    })
    .await;

    let result = snapshot["result"].as_str().unwrap();
    assert!(result.contains("not implemented"), "got: {result}");
}

#[tokio::test]
async fn cancel_endpoint_stops_a_running_generation() {
    let app = test_app();
    let id = start(
        &app,
        serde_json::json!({"agent": "prose_stylist", "action": "generate_scene"}),
    )
    .await;

    // Wait until it has registered and started emitting progress.
    wait_for(&app, &id, Duration::from_secs(2), |s| s["progress"] != 0).await;

    let (status, json) = post_json(
        app.clone(),
        &format!("/api/generate/{id}/cancel"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "cancelled");

    let snapshot = wait_for(&app, &id, Duration::from_secs(5), |s| {
        s["status"] == "cancelled"
    })
    .await;
    assert_eq!(snapshot["progress"], 0);
    assert!(snapshot["result"].is_null());
}

#[tokio::test]
async fn concurrent_generations_are_independent() {
    let app = test_app();
    let doomed = start(
        &app,
        serde_json::json!({"agent": "prose_stylist", "action": "generate_scene"}),
    )
    .await;
    let survivor = start(
        &app,
        serde_json::json!({"agent": "character_psychologist", "action": "develop_character"}),
    )
    .await;

    wait_for(&app, &doomed, Duration::from_secs(2), |s| s["progress"] != 0).await;
    let (_, json) = post_json(
        app.clone(),
        &format!("/api/generate/{doomed}/cancel"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(json["status"], "cancelled");

    let done = wait_for(&app, &survivor, Duration::from_secs(5), |s| {
        s["status"] == "completed"
    })
    .await;
    assert_eq!(done["progress"], 100);

    let dead = wait_for(&app, &doomed, Duration::from_secs(5), |s| {
        s["status"] == "cancelled"
    })
    .await;
    assert_eq!(dead["progress"], 0);
}
