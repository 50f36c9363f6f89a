use axum::extract::ConnectInfo;
use gatekeeper::{
    build_app,
    config::{AppConfig, RateLimiterOptions},
    rate_limit::RateLimiter,
};
use http::{Request, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

const CONFIG: &str = r#"
server:
  host: "127.0.0.1"
  port: 0

rate_limiter:
  enabled: true
  default_window_ms: 60000
  default_max_count: 3
  trust_forwarded_for_header: true
  endpoint_overrides:
    - path: "/api/login"
      window_ms: 60000
      max_count: 1
"#;

/// Helper function to create a test app from YAML configuration
fn setup_test_app(yaml: &str) -> axum::Router {
    let config = AppConfig::from_yaml(yaml).unwrap();
    config.validate().unwrap();

    let limiter = Arc::new(RateLimiter::new(config.rate_limiter).unwrap());
    build_app(limiter, None)
}

fn request(uri: &str, peer: &str, forwarded: Option<&str>) -> Request<axum::body::Body> {
    let mut builder = Request::builder().uri(uri).method("GET");
    if let Some(value) = forwarded {
        builder = builder.header("X-Forwarded-For", value);
    }

    let mut request = builder.body(axum::body::Body::empty()).unwrap();
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

async fn status_of(app: &axum::Router, request: Request<axum::body::Body>) -> StatusCode {
    app.clone().oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn test_admitted_request_reaches_handler() {
    let app = setup_test_app(CONFIG);

    let response = app
        .oneshot(request("/api/users", "10.0.0.1:4000", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();
    assert!(body_str.contains("admitted"));
    assert!(body_str.contains("/api/users"));
}

#[tokio::test]
async fn test_global_bucket_shared_across_paths() {
    let app = setup_test_app(CONFIG);

    assert_eq!(status_of(&app, request("/a", "10.0.0.1:1", None)).await, StatusCode::OK);
    assert_eq!(status_of(&app, request("/b", "10.0.0.1:1", None)).await, StatusCode::OK);
    assert_eq!(status_of(&app, request("/health", "10.0.0.1:1", None)).await, StatusCode::OK);
    assert_eq!(
        status_of(&app, request("/c", "10.0.0.1:1", None)).await,
        StatusCode::TOO_MANY_REQUESTS
    );

    // Another client is unaffected
    assert_eq!(status_of(&app, request("/a", "10.0.0.2:1", None)).await, StatusCode::OK);
}

#[tokio::test]
async fn test_endpoint_override_is_separate_bucket() {
    let app = setup_test_app(CONFIG);

    assert_eq!(
        status_of(&app, request("/api/login", "10.0.0.1:1", None)).await,
        StatusCode::OK
    );
    assert_eq!(
        status_of(&app, request("/API/Login/", "10.0.0.1:1", None)).await,
        StatusCode::TOO_MANY_REQUESTS
    );

    // The global budget is still intact
    for _ in 0..3 {
        assert_eq!(status_of(&app, request("/x", "10.0.0.1:1", None)).await, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_forwarded_header_identifies_client() {
    let app = setup_test_app(CONFIG);

    // Same proxy address, different forwarded clients
    assert_eq!(
        status_of(&app, request("/api/login", "192.168.0.1:1", Some("1.2.3.4, 5.6.6.7"))).await,
        StatusCode::OK
    );
    assert_eq!(
        status_of(&app, request("/api/login", "192.168.0.1:1", Some("8.8.8.8"))).await,
        StatusCode::OK
    );
    assert_eq!(
        status_of(&app, request("/api/login", "192.168.0.2:1", Some("1.2.3.4"))).await,
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_forwarded_header_ignored_when_untrusted() {
    let yaml = CONFIG.replace(
        "trust_forwarded_for_header: true",
        "trust_forwarded_for_header: false",
    );
    let app = setup_test_app(&yaml);

    assert_eq!(
        status_of(&app, request("/api/login", "192.168.0.1:1", Some("1.2.3.4"))).await,
        StatusCode::OK
    );
    assert_eq!(
        status_of(&app, request("/api/login", "192.168.0.1:1", Some("8.8.8.8"))).await,
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_disabled_limiter_admits_everything() {
    let options = RateLimiterOptions {
        enabled: false,
        default_max_count: 1,
        ..Default::default()
    };
    let app = build_app(Arc::new(RateLimiter::new(options).unwrap()), None);

    for _ in 0..100 {
        assert_eq!(status_of(&app, request("/a", "10.0.0.1:1", None)).await, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_invalid_config_fails_fast() {
    let yaml = r#"
rate_limiter:
  endpoint_overrides:
    - path: "/api/login"
      window_ms: 0
      max_count: 1
"#;
    let config = AppConfig::from_yaml(yaml).unwrap();
    assert!(config.validate().is_err());
    assert!(RateLimiter::new(config.rate_limiter).is_err());
}
