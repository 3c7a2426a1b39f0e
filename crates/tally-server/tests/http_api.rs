#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use tally_core::credentials::Credentials;
use tally_core::protocol::CounterView;
use tally_server::{app_state::AppState, auth, config, router};

const CFG: &str = r#"
version: 1
limits:
  max_name_len: 16
security:
  properties:
    security-username: "admin"
    security-password: "s3cret"
"#;

fn app() -> Router {
    app_with(CFG)
}

fn app_with(cfg: &str) -> Router {
    let cfg = config::load_from_str(cfg).unwrap();
    router::build_router(AppState::new(cfg).unwrap())
}

fn request(method: Method, uri: &str, creds: Option<(&str, &str)>) -> Request<Body> {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    if let Some((user, pass)) = creds {
        auth::apply_credentials(req.headers_mut(), &Credentials::new(user, pass)).unwrap();
    }
    req
}

const ADMIN: Option<(&str, &str)> = Some(("admin", "s3cret"));

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn counter(app: &Router, method: Method, uri: &str) -> CounterView {
    let (status, body) = send(app, request(method, uri, ADMIN)).await;
    assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&body));
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn increment_then_read_through() {
    let app = app();

    let v = counter(&app, Method::POST, "/v1/counters/requests/increment").await;
    assert_eq!(v, CounterView::new("requests", 1));
    let v = counter(&app, Method::POST, "/v1/counters/requests/increment").await;
    assert_eq!(v.value, 2);

    // hit: returns the last written value without advancing
    let v = counter(&app, Method::GET, "/v1/counters/requests").await;
    assert_eq!(v.value, 2);
    let v = counter(&app, Method::GET, "/v1/counters/requests").await;
    assert_eq!(v.value, 2);
}

#[tokio::test]
async fn read_through_miss_increments_once() {
    let app = app();
    let v = counter(&app, Method::GET, "/v1/counters/fresh").await;
    assert_eq!(v.value, 1);
    let v = counter(&app, Method::GET, "/v1/counters/fresh").await;
    assert_eq!(v.value, 1);
}

#[tokio::test]
async fn reset_starts_over() {
    let app = app();
    counter(&app, Method::POST, "/v1/counters/requests/increment").await;
    counter(&app, Method::POST, "/v1/counters/requests/increment").await;

    let (status, _) = send(&app, request(Method::DELETE, "/v1/counters/requests", ADMIN)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // idempotent
    let (status, _) = send(&app, request(Method::DELETE, "/v1/counters/requests", ADMIN)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let v = counter(&app, Method::POST, "/v1/counters/requests/increment").await;
    assert_eq!(v.value, 1);
}

#[tokio::test]
async fn list_is_sorted_snapshot() {
    let app = app();
    counter(&app, Method::POST, "/v1/counters/requests/increment").await;
    counter(&app, Method::POST, "/v1/counters/errors/increment").await;
    counter(&app, Method::POST, "/v1/counters/requests/increment").await;

    let (status, body) = send(&app, request(Method::GET, "/v1/counters", ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    let views: Vec<CounterView> = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        views,
        vec![CounterView::new("errors", 1), CounterView::new("requests", 2)]
    );
}

#[tokio::test]
async fn missing_or_wrong_credentials_are_401() {
    let app = app();

    let (status, body) = send(&app, request(Method::GET, "/v1/counters", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["error"], "AUTH_FAILED");

    let (status, _) = send(
        &app,
        request(Method::POST, "/v1/counters/x/increment", Some(("test", "test"))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // nothing was materialized by the rejected call
    let (_, body) = send(&app, request(Method::GET, "/v1/counters", ADMIN)).await;
    let views: Vec<CounterView> = serde_json::from_slice(&body).unwrap();
    assert!(views.is_empty());
}

#[tokio::test]
async fn default_identity_when_properties_are_absent() {
    let app = app_with("version: 1\n");
    let (status, _) = send(
        &app,
        request(Method::POST, "/v1/counters/x/increment", Some(("test", "test"))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn overlong_name_is_400() {
    let app = app();
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/v1/counters/this-name-is-far-too-long/increment",
            ADMIN,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["error"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn http_rate_limit_is_429() {
    let app = app_with(
        r#"
version: 1
limits:
  rate_limit_rps: 1
  rate_limit_burst: 2
security:
  enabled: false
"#,
    );
    for _ in 0..2 {
        let (status, _) = send(&app, request(Method::GET, "/v1/counters", None)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(&app, request(Method::GET, "/v1/counters", None)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["error"], "RATE_LIMITED");
}

#[tokio::test]
async fn metrics_report_requests_and_cache_stats() {
    let app = app();
    counter(&app, Method::POST, "/v1/counters/m/increment").await;
    counter(&app, Method::GET, "/v1/counters/m").await;
    send(&app, request(Method::GET, "/v1/counters", None)).await;

    let (status, body) = send(&app, request(Method::GET, "/metrics", None)).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains(r#"tally_requests_total{op="incr",outcome="ok",transport="http"} 1"#));
    assert!(text.contains(r#"tally_auth_rejections_total{transport="http"} 1"#));
    assert!(text.contains("tally_cache_hits_total 1"));
    assert!(text.contains("tally_cache_misses_total 0"));
    assert!(text.contains("tally_cache_entries 1"));
    assert!(text.contains("tally_draining 0"));
}

#[tokio::test]
async fn ops_endpoints_need_no_auth() {
    let app = app();
    let (status, body) = send(&app, request(Method::GET, "/healthz", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
    let (status, _) = send(&app, request(Method::GET, "/readyz", None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn readyz_is_503_once_draining() {
    let state = AppState::new(config::load_from_str(CFG).unwrap()).unwrap();
    let app = router::build_router(state.clone());

    state.metrics().set_draining();

    let (status, _) = send(&app, request(Method::GET, "/readyz", None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (status, _) = send(&app, request(Method::GET, "/healthz", None)).await;
    assert_eq!(status, StatusCode::OK);
}
