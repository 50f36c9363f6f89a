use crate::error::{GatekeeperError, Result};
use crate::rate_limit::Decision;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tracing::{debug, info};

/// Metrics service for collecting and exposing Prometheus metrics
#[derive(Clone)]
pub struct MetricsService {
    handle: Arc<PrometheusHandle>,
}

impl MetricsService {
    /// Create a new metrics service and install the global recorder
    pub fn new() -> Result<Self> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            GatekeeperError::Internal(format!("Failed to install metrics recorder: {}", e))
        })?;

        Self::register_metrics();

        info!("Metrics service initialized successfully");

        Ok(Self {
            handle: Arc::new(handle),
        })
    }

    fn register_metrics() {
        describe_counter!(
            "gatekeeper_rate_limit_decisions_total",
            "Total number of admission decisions, by scope and outcome"
        );
        describe_counter!(
            "gatekeeper_rate_limit_exceeded_total",
            "Total number of requests rejected due to rate limiting"
        );

        debug!("All metrics registered with descriptions");
    }

    /// Render metrics in Prometheus format
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Metrics endpoint handler
pub async fn metrics_handler(State(service): State<MetricsService>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        service.render(),
    )
}

/// Record one admission decision.
///
/// Scope is either an overridden endpoint path or the global marker, so label
/// cardinality stays bounded by configuration. Client identities are never
/// used as labels.
pub fn record_rate_limit_decision(scope: &str, decision: Decision) {
    let labels = [
        ("scope", scope.to_string()),
        ("outcome", decision.as_str().to_string()),
    ];

    counter!("gatekeeper_rate_limit_decisions_total", &labels).increment(1);

    if !decision.is_allowed() {
        counter!("gatekeeper_rate_limit_exceeded_total", "scope" => scope.to_string())
            .increment(1);
    }
}
