//! Integration Tests for API Endpoints
//!
//! Drives the full router against fake upstreams and checks status codes,
//! headers, bodies and how often upstream was contacted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{Request, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use mrms_proxy::{
    api::create_router,
    error::Result,
    proxy::{ReqwestUpstream, UpstreamClient, UpstreamResponse},
    AppState, Config, ProxyError,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const EXPORT_BASE: &str = "https://maps.test/arcgis/rest/services/radar/MapServer/export";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image";

// == Helper Types ==

/// Upstream fake that answers every request the same way and counts calls.
struct CountingUpstream {
    answer: Result<UpstreamResponse>,
    calls: AtomicUsize,
}

impl CountingUpstream {
    fn new(answer: Result<UpstreamResponse>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: AtomicUsize::new(0),
        })
    }

    fn responding(status: u16, content_type: Option<&str>, body: &'static [u8]) -> Arc<Self> {
        Self::new(Ok(UpstreamResponse {
            status,
            content_type: content_type.map(str::to_string),
            body: Bytes::from_static(body),
        }))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamClient for CountingUpstream {
    async fn get(&self, _url: &str) -> Result<UpstreamResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

// == Helper Functions ==

fn configured() -> Config {
    Config::default().with_export_base(EXPORT_BASE)
}

fn create_test_app(config: Config, upstream: Arc<CountingUpstream>) -> Router {
    create_router(AppState::with_upstream(&config, upstream))
}

async fn send(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

async fn body_to_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// == Export Endpoint Tests ==

#[tokio::test]
async fn test_export_second_identical_request_served_from_cache() {
    let upstream = CountingUpstream::responding(200, Some("image/png"), PNG);
    let app = create_test_app(configured(), upstream.clone());
    let uri = "/api/mrms/export?bbox=-100,30,-90,40&size=256,256";

    let first = send(&app, uri).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-cache"], "MISS");
    assert_eq!(first.headers()["content-type"], "image/png");
    assert_eq!(first.headers()["cache-control"], "public, max-age=60");
    assert_eq!(body_bytes(first).await, Bytes::from_static(PNG));

    let second = send(&app, uri).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers()["x-cache"], "HIT");
    assert_eq!(second.headers()["cache-control"], "public, max-age=60");
    assert_eq!(body_bytes(second).await, Bytes::from_static(PNG));

    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_export_extraneous_params_hit_same_entry() {
    let upstream = CountingUpstream::responding(200, None, PNG);
    let app = create_test_app(configured(), upstream.clone());

    send(&app, "/api/mrms/export?bbox=1,2,3,4&size=256,256").await;
    let response = send(
        &app,
        "/api/mrms/export?size=256,256&bbox=1,2,3,4&cachebust=99&f=json&format=jpg",
    )
    .await;

    assert_eq!(response.headers()["x-cache"], "HIT");
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_export_different_bbox_misses() {
    let upstream = CountingUpstream::responding(200, None, PNG);
    let app = create_test_app(configured(), upstream.clone());

    send(&app, "/api/mrms/export?bbox=1,2,3,4").await;
    let response = send(&app, "/api/mrms/export?bbox=1,2,3,5").await;

    assert_eq!(response.headers()["x-cache"], "MISS");
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_export_defaults_content_type() {
    let upstream = CountingUpstream::responding(200, None, PNG);
    let app = create_test_app(configured(), upstream);

    let response = send(&app, "/api/mrms/export?bbox=1,2,3,4").await;
    assert_eq!(response.headers()["content-type"], "image/png");
}

#[tokio::test]
async fn test_export_unconfigured_returns_500() {
    let upstream = CountingUpstream::responding(200, None, PNG);
    let app = create_test_app(Config::default(), upstream.clone());

    let response = send(&app, "/api/mrms/export?bbox=1,2,3,4").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_to_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("not configured"));
    assert!(json.get("status").is_none());
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_export_upstream_failure_returns_502() {
    let upstream = CountingUpstream::responding(404, Some("text/plain"), b"no such layer");
    let app = create_test_app(configured(), upstream.clone());

    let response = send(&app, "/api/mrms/export?bbox=1,2,3,4").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_to_json(response).await;
    assert_eq!(
        json,
        json!({ "error": "Upstream failed", "status": 404, "body": "no such layer" })
    );

    // failures are not cached
    send(&app, "/api/mrms/export?bbox=1,2,3,4").await;
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_export_transport_failure_returns_500() {
    let upstream = CountingUpstream::new(Err(ProxyError::Transport("dns failure".to_string())));
    let app = create_test_app(configured(), upstream);

    let response = send(&app, "/api/mrms/export?bbox=1,2,3,4").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_to_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("dns failure"));
}

// == Times Endpoint Tests ==

#[tokio::test]
async fn test_times_returns_normalized_list() {
    let upstream = CountingUpstream::responding(
        200,
        Some("application/json"),
        br#"{"timeInfo":{"timeValues":[1699999880000,"1700000000"]}}"#,
    );
    let app = create_test_app(configured(), upstream.clone());

    let response = send(&app, "/api/mrms/times").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(
        json["source"],
        "https://maps.test/arcgis/rest/services/radar/ImageServer?f=json"
    );
    assert!(json["fetchedAt"].is_string());
    assert_eq!(
        json["times"],
        json!(["2023-11-14T22:13:20.000Z", "2023-11-14T22:11:20.000Z"])
    );

    let again = send(&app, "/api/mrms/times").await;
    assert_eq!(again.headers()["x-cache"], "HIT");
    assert_eq!(body_to_json(again).await, json);
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_times_upstream_failure_returns_502() {
    let upstream = CountingUpstream::responding(500, None, b"boom");
    let app = create_test_app(configured(), upstream);

    let response = send(&app, "/api/mrms/times").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_to_json(response).await;
    assert_eq!(json["status"], 500);
    assert!(json.get("body").is_none());
}

#[tokio::test]
async fn test_times_unconfigured_returns_500() {
    let upstream = CountingUpstream::responding(200, None, b"{}");
    let app = create_test_app(Config::default(), upstream.clone());

    let response = send(&app, "/api/mrms/times").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(upstream.calls(), 0);
}

// == Misc Endpoint Tests ==

#[tokio::test]
async fn test_stats_reflect_traffic() {
    let upstream = CountingUpstream::responding(200, None, PNG);
    let app = create_test_app(configured(), upstream);

    send(&app, "/api/mrms/export?bbox=1,2,3,4").await;
    send(&app, "/api/mrms/export?bbox=1,2,3,4").await;

    let json = body_to_json(send(&app, "/api/mrms/stats").await).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["max_entries"], 500);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(Config::default(), CountingUpstream::responding(200, None, b""));

    let response = send(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["ok"], true);
}

#[tokio::test]
async fn test_unknown_api_route_returns_json_404() {
    let app = create_test_app(configured(), CountingUpstream::responding(200, None, b""));

    let response = send(&app, "/api/other").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_to_json(response).await, json!({ "error": "Not found" }));
}

// == Real HTTP Round Trip ==

/// Serves a tiny upstream on an ephemeral port and returns its base URL.
async fn spawn_upstream(hits: Arc<AtomicUsize>) -> String {
    let export_hits = hits.clone();
    let upstream = Router::new()
        .route(
            "/rest/MapServer/export",
            get(move || {
                let hits = export_hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    ([("content-type", "image/png")], PNG)
                }
            }),
        )
        .route(
            "/rest/ImageServer",
            get(|| async { axum::Json(json!({ "timeExtent": [0, 1_700_000_000_000i64] })) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });

    format!("http://{}/rest/MapServer/export", addr)
}

#[tokio::test]
async fn test_round_trip_through_reqwest() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = spawn_upstream(hits.clone()).await;

    let config = configured().with_export_base(base);
    let upstream = Arc::new(ReqwestUpstream::new(config.upstream_timeout()).unwrap());
    let app = create_router(AppState::with_upstream(&config, upstream));

    let uri = "/api/mrms/export?bbox=-100,30,-90,40&size=256,256";
    let first = send(&app, uri).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(body_bytes(first).await, Bytes::from_static(PNG));

    let second = send(&app, uri).await;
    assert_eq!(second.headers()["x-cache"], "HIT");
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let times = body_to_json(send(&app, "/api/mrms/times").await).await;
    assert_eq!(times["times"], json!(["2023-11-14T22:13:20.000Z"]));
}
