//! API integration tests against the router with a stub pipeline.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use reel_api::{create_router, ApiConfig, ApiError, ApiResult, AppState, HighlightPipeline, PipelineOutput};
use reel_models::{HighlightSet, TimeInterval};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

enum Outcome {
    Highlights(Vec<(f64, f64)>),
    DownloadFails,
    RenderFails,
}

struct StubPipeline {
    outcome: Outcome,
    files_dir: PathBuf,
    urls: Mutex<Vec<String>>,
}

#[async_trait]
impl HighlightPipeline for StubPipeline {
    async fn process(&self, url: &str, _request_id: &str) -> ApiResult<PipelineOutput> {
        self.urls.lock().unwrap().push(url.to_string());
        match &self.outcome {
            Outcome::Highlights(ranges) => {
                let highlights =
                    HighlightSet::coalesce(ranges.iter().map(|&r| TimeInterval::from(r)), 1.5);
                let clip_path = (!highlights.is_empty())
                    .then(|| self.files_dir.join("highlights").join("highlight.mp4"));
                Ok(PipelineOutput {
                    highlights,
                    clip_path,
                })
            }
            Outcome::DownloadFails => Err(ApiError::DownloadFailed("yt-dlp exited with 1".into())),
            Outcome::RenderFails => Err(ApiError::RenderFailed("no segments rendered".into())),
        }
    }
}

struct TestApp {
    router: Router,
    pipeline: Arc<StubPipeline>,
    files: TempDir,
}

fn test_app(outcome: Outcome, public_base_url: Option<&str>) -> TestApp {
    let files = TempDir::new().unwrap();
    std::fs::create_dir_all(files.path().join("highlights")).unwrap();

    let config = ApiConfig {
        files_dir: files.path().to_path_buf(),
        public_base_url: public_base_url.map(str::to_string),
        ..ApiConfig::default()
    };
    let pipeline = Arc::new(StubPipeline {
        outcome,
        files_dir: files.path().to_path_buf(),
        urls: Mutex::new(Vec::new()),
    });
    let state = AppState::with_pipeline(config, pipeline.clone());

    TestApp {
        router: create_router(state, None),
        pipeline,
        files,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process")
        .header(header::HOST, "reels.test:10000")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_process_json_returns_key_moments_and_clip_url() {
    let app = test_app(Outcome::Highlights(vec![(10.0, 11.0), (0.0, 2.0), (3.0, 4.0)]), None);

    let response = app
        .router
        .oneshot(post_json(r#"{"url": "https://www.youtube.com/watch?v=abc"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "key_moments": [
                {"timestamp": "0.00", "caption": "Engaging moment detected"},
                {"timestamp": "10.00", "caption": "Engaging moment detected"}
            ],
            "highlight_clip_url": "http://reels.test:10000/files/highlights/highlight.mp4"
        })
    );
    assert_eq!(
        *app.pipeline.urls.lock().unwrap(),
        vec!["https://www.youtube.com/watch?v=abc".to_string()]
    );
}

#[tokio::test]
async fn test_process_form_body() {
    let app = test_app(Outcome::Highlights(vec![(5.5, 7.0)]), None);

    let request = Request::builder()
        .method("POST")
        .uri("/process")
        .header(header::HOST, "localhost:10000")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("url=https%3A%2F%2Fexample.com%2Fvideo.mp4"))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["key_moments"][0]["timestamp"], "5.50");
    assert_eq!(
        *app.pipeline.urls.lock().unwrap(),
        vec!["https://example.com/video.mp4".to_string()]
    );
}

#[tokio::test]
async fn test_process_uses_public_base_url() {
    let app = test_app(
        Outcome::Highlights(vec![(1.0, 2.0)]),
        Some("https://cdn.example.com"),
    );

    let response = app
        .router
        .oneshot(post_json(r#"{"url": "https://example.com/v"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["highlight_clip_url"],
        "https://cdn.example.com/files/highlights/highlight.mp4"
    );
}

#[tokio::test]
async fn test_process_without_highlights_returns_null_clip() {
    let app = test_app(Outcome::Highlights(vec![]), None);

    let response = app
        .router
        .oneshot(post_json(r#"{"url": "https://example.com/calm"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"key_moments": [], "highlight_clip_url": null})
    );
}

#[tokio::test]
async fn test_process_missing_url_is_bad_request() {
    for body in [r#"{}"#, r#"{"url": ""}"#, r#"{"link": "https://example.com"}"#] {
        let app = test_app(Outcome::Highlights(vec![(0.0, 1.0)]), None);

        let response = app.router.oneshot(post_json(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(
            body_json(response).await,
            json!({"error": "No video URL provided"})
        );
        assert!(app.pipeline.urls.lock().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_process_malformed_json_is_bad_request() {
    let app = test_app(Outcome::Highlights(vec![(0.0, 1.0)]), None);

    let response = app.router.oneshot(post_json("{\"url\": ")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_process_download_failure_is_server_error() {
    let app = test_app(Outcome::DownloadFails, None);

    let response = app
        .router
        .oneshot(post_json(r#"{"url": "https://example.com/missing"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Failed to download video"), "{error}");
}

#[tokio::test]
async fn test_process_render_failure_is_server_error() {
    let app = test_app(Outcome::RenderFails, None);

    let response = app
        .router
        .oneshot(post_json(r#"{"url": "https://example.com/v"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = body_json(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Failed to create highlight reel"), "{error}");
}

#[tokio::test]
async fn test_files_serves_highlight_as_mp4() {
    let app = test_app(Outcome::Highlights(vec![]), None);
    std::fs::write(
        app.files.path().join("highlights").join("highlight.mp4"),
        b"fake mp4 bytes",
    )
    .unwrap();

    for uri in ["/files/highlights/highlight.mp4", "/files/highlight.mp4"] {
        let response = app.router.clone().oneshot(get(uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK, "uri: {uri}");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"fake mp4 bytes");
    }
}

#[tokio::test]
async fn test_files_missing_is_not_found() {
    let app = test_app(Outcome::Highlights(vec![]), None);

    let response = app.router.oneshot(get("/files/nope.mp4")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({"error": "File not found"}));
}

#[tokio::test]
async fn test_files_rejects_traversal() {
    let app = test_app(Outcome::Highlights(vec![]), None);
    let secret_dir = app.files.path().join("highlights");
    std::fs::write(app.files.path().join("secret.txt"), b"top secret").unwrap();

    // secret.txt exists one level above highlights/
    assert!(secret_dir.join("../secret.txt").exists());

    for uri in [
        "/files/highlights/../secret.txt",
        "/files/highlights/%2e%2e/secret.txt",
        "/files/%2e%2e/%2e%2e/etc/passwd",
    ] {
        let response = app.router.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri: {uri}");
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(Outcome::Highlights(vec![]), None);

    let response = app.router.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_route_absent_without_handle() {
    let app = test_app(Outcome::Highlights(vec![]), None);

    let response = app.router.oneshot(get("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_header() {
    let app = test_app(Outcome::Highlights(vec![]), None);

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");

    let request = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "trace-42")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-42");
}
