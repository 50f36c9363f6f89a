pub mod config;
pub mod error;
pub mod metrics;
pub mod rate_limit;

use crate::config::AppConfig;
use crate::error::{GatekeeperError, Result};
use crate::metrics::{metrics_handler, MetricsService};
use crate::rate_limit::{apply_rate_limiting, RateLimiter};
use axum::{extract::Request, routing::get, Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router: every route is rate limited except
/// `/metrics`, which is attached only when a metrics service is given.
pub fn build_app(limiter: Arc<RateLimiter>, metrics: Option<MetricsService>) -> Router {
    let limited = apply_rate_limiting(
        Router::new()
            .route("/health", get(|| async { "OK" }))
            .fallback(echo_handler),
        limiter,
    );

    let app = match metrics {
        Some(service) => Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(service)
            .merge(limited),
        None => limited,
    };

    app.layer(TraceLayer::new_for_http())
}

/// Answers admitted requests with the method and path they were made for
async fn echo_handler(request: Request) -> Json<serde_json::Value> {
    Json(json!({
        "status": "admitted",
        "method": request.method().as_str(),
        "path": request.uri().path(),
    }))
}

/// Initialize the server
pub async fn init_server(config: AppConfig) -> Result<()> {
    // Validate configuration
    config.validate()?;

    info!("Starting gatekeeper");
    info!(
        "Server listening on {}:{}",
        config.server.host, config.server.port
    );

    let limiter = Arc::new(RateLimiter::new(config.rate_limiter.clone())?);
    let _eviction = limiter.spawn_eviction();

    let metrics = if config.server.metrics_enabled {
        Some(MetricsService::new()?)
    } else {
        None
    };

    let app = build_app(limiter, metrics);

    // Bind and serve
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(GatekeeperError::Io)?;

    info!("Gatekeeper ready to accept connections");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| GatekeeperError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

/// Initialize tracing/logging
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatekeeper=debug,tower_http=debug".into()),
        )
        .with_target(false)
        .compact()
        .init();
}
