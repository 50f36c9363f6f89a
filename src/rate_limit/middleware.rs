use super::service::{RateLimiter, RequestInfo};
use super::types::Decision;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;

/// Axum middleware function for rate limiting.
///
/// Denied requests get an empty `429 Too Many Requests` and never reach the
/// inner service. The peer address comes from `ConnectInfo<SocketAddr>` when
/// the server was started with connect info; otherwise it is unknown.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let decision = {
        let remote_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip());

        limiter.check(&RequestInfo {
            path: request.uri().path(),
            headers: request.headers(),
            remote_ip,
        })
    };

    match decision {
        Decision::Allowed => next.run(request).await,
        Decision::Denied => StatusCode::TOO_MANY_REQUESTS.into_response(),
    }
}

/// Wrap every route of `router` with the rate limiting middleware
pub fn apply_rate_limiting<S>(router: Router<S>, limiter: Arc<RateLimiter>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
}
