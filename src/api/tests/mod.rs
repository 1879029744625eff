use super::*;
use crate::test_helpers::{create_test_worker, test_config};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;


/// Router over a fresh worker; the tempdir must be kept alive
async fn test_app(server: &MockServer) -> (Router, ParaphraseWorker, TempDir) {
    let (worker, temp_dir) = create_test_worker(server).await;
    (create_router(worker.clone()), worker, temp_dir)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    let (app, _worker, _dir) = test_app(&server).await;

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["accepting"], true);
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let server = MockServer::start().await;
    let (app, _worker, _dir) = test_app(&server).await;

    let response = app
        .oneshot(Request::get("/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["info"]["title"], "paraphrase-worker REST API");
    assert!(json["paths"]["/documents"].is_object());
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let server = MockServer::start().await;
    let (app, _worker, _dir) = test_app(&server).await;

    let response = app
        .oneshot(
            Request::get("/health")
                .header("Origin", "http://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_api_key_guards_every_route() {
    let server = MockServer::start().await;
    let (mut config, _dir) = test_config(&server);
    config.api.api_key = Some("letmein".to_string());
    let worker = ParaphraseWorker::new(config).await.unwrap();
    let app = create_router(worker);

    let denied = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(denied).await["error"]["code"], "unauthorized");

    let allowed = app
        .oneshot(
            Request::get("/health")
                .header("X-Api-Key", "letmein")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let server = MockServer::start().await;
    let (app, _worker, _dir) = test_app(&server).await;

    let response = app
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_serve_stops_on_cancel() {
    let server = MockServer::start().await;
    let (worker, _dir) = create_test_worker(&server).await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(serve(listener, worker, cancel.clone()));

    let health: Value = reqwest::get(format!("http://{}/health", address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    cancel.cancel();
    let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("server should stop after cancel")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_health_reports_not_accepting_after_shutdown_begins() {
    let server = MockServer::start().await;
    let (app, worker, _dir) = test_app(&server).await;

    worker
        .accepting_new
        .store(false, std::sync::atomic::Ordering::SeqCst);

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(response).await["accepting"], false);
}
