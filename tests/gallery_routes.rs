//! HTTP routing specifications driven through `tower::ServiceExt::oneshot`,
//! validating status codes and payload shapes without a live listener.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use chrono::{Duration, Local};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use contest_tally::config::ContestConfig;
use contest_tally::contest::{contest_router, ContestService, SubmissionStore};

fn contest_config(dir: &TempDir) -> ContestConfig {
    let now = Local::now().naive_local();
    ContestConfig {
        data_dir: dir.path().to_path_buf(),
        registration_opens: now - Duration::days(1),
        registration_closes: now + Duration::days(1),
        event_day: now + Duration::days(3),
        max_team_members: 5,
        export_pin: "serviciomedico".to_string(),
        service_email: "organizadora@example.com".to_string(),
        service_extensions: "5552".to_string(),
    }
}

fn router(dir: &TempDir) -> axum::Router {
    let store = Arc::new(SubmissionStore::open(dir.path()).expect("store opens"));
    contest_router(Arc::new(ContestService::new(store, contest_config(dir))))
}

fn closed_router(dir: &TempDir) -> axum::Router {
    let now = Local::now().naive_local();
    let mut config = contest_config(dir);
    config.registration_opens = now - Duration::days(14);
    config.registration_closes = now - Duration::days(7);
    let store = Arc::new(SubmissionStore::open(dir.path()).expect("store opens"));
    contest_router(Arc::new(ContestService::new(store, config)))
}

fn json_request(uri: &str, payload: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

async fn read_json_body(response: Response<axum::body::Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}

async fn read_text_body(response: Response<axum::body::Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    String::from_utf8(bytes.to_vec()).expect("body is utf-8")
}

async fn submit(router: &axum::Router, team: &str, photo: &str) -> String {
    let payload = serde_json::json!({ "equipo": team, "photo": photo });
    let response = router
        .clone()
        .oneshot(json_request("/api/submissions", &payload))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    body.get("filename")
        .and_then(Value::as_str)
        .expect("filename returned")
        .to_string()
}

#[tokio::test]
async fn submissions_route_returns_the_stored_filename() {
    let dir = TempDir::new().expect("temp dir");
    let router = router(&dir);

    let filename = submit(&router, "Rosa", "cartel.png").await;
    assert!(filename.contains("Rosa"));
    assert!(filename.ends_with(".png"));
}

#[tokio::test]
async fn submissions_route_rejects_when_the_window_is_closed() {
    let dir = TempDir::new().expect("temp dir");
    let router = closed_router(&dir);

    let payload = serde_json::json!({ "equipo": "Rosa", "photo": "cartel.png" });
    let response = router
        .oneshot(json_request("/api/submissions", &payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json_body(response).await;
    assert_eq!(body.get("ok"), Some(&Value::Bool(false)));
}

#[tokio::test]
async fn submissions_route_rejects_disallowed_formats() {
    let dir = TempDir::new().expect("temp dir");
    let router = router(&dir);

    let payload = serde_json::json!({ "equipo": "Rosa", "photo": "cartel.gif" });
    let response = router
        .oneshot(json_request("/api/submissions", &payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn vote_route_returns_updated_counters_and_total() {
    let dir = TempDir::new().expect("temp dir");
    let router = router(&dir);
    let filename = submit(&router, "Rosa", "cartel.png").await;

    let payload = serde_json::json!({ "filename": filename, "category": "mensaje" });
    let response = router
        .oneshot(json_request("/api/vote", &payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(
        body.pointer("/votes/mensaje").and_then(Value::as_u64),
        Some(1)
    );
    assert_eq!(body.get("total").and_then(Value::as_u64), Some(1));
}

#[tokio::test]
async fn vote_route_rejects_unknown_categories() {
    let dir = TempDir::new().expect("temp dir");
    let router = router(&dir);
    let filename = submit(&router, "Rosa", "cartel.png").await;

    let payload = serde_json::json!({ "filename": filename, "category": "originalidad" });
    let response = router
        .oneshot(json_request("/api/vote", &payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn vote_route_returns_not_found_for_unknown_filenames() {
    let dir = TempDir::new().expect("temp dir");
    let router = router(&dir);

    let payload =
        serde_json::json!({ "filename": "20990101_000000_Fantasma.png", "category": "equipo" });
    let response = router
        .oneshot(json_request("/api/vote", &payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_route_serves_items_and_the_top_five() {
    let dir = TempDir::new().expect("temp dir");
    let router = router(&dir);
    submit(&router, "Rosa", "uno.png").await;
    submit(&router, "Lazo", "dos.png").await;

    let response = router
        .clone()
        .oneshot(
            Request::get("/api/list")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(
        body.get("items").and_then(Value::as_array).map(Vec::len),
        Some(2)
    );
    assert_eq!(
        body.get("top5").and_then(Value::as_array).map(Vec::len),
        Some(2)
    );
    assert_eq!(
        body.get("categories"),
        Some(&serde_json::json!(["creatividad", "mensaje", "equipo"]))
    );

    let limited = router
        .oneshot(
            Request::get("/api/list?sort=top_votes&limit=1")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    let body = read_json_body(limited).await;
    assert_eq!(
        body.get("items").and_then(Value::as_array).map(Vec::len),
        Some(1)
    );
}

#[tokio::test]
async fn meta_route_reports_the_window_state() {
    let dir = TempDir::new().expect("temp dir");
    let router = router(&dir);

    let response = router
        .oneshot(
            Request::get("/api/meta")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body.get("state"), Some(&Value::String("open".to_string())));
    assert_eq!(body.get("max_team").and_then(Value::as_u64), Some(5));
}

#[tokio::test]
async fn export_routes_are_pin_gated() {
    let dir = TempDir::new().expect("temp dir");
    let router = router(&dir);
    submit(&router, "Rosa", "cartel.png").await;

    let denied = router
        .clone()
        .oneshot(
            Request::get("/api/export/all")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let allowed = router
        .oneshot(
            Request::get("/api/export/all?pin=serviciomedico")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(
        allowed
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/csv; charset=utf-8")
    );

    let csv = read_text_body(allowed).await;
    assert!(csv.starts_with("ts,equipo"));
    assert_eq!(csv.lines().count(), 2);
}
