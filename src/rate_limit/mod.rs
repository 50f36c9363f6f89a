//! Rate limiting module
//!
//! Per-client admission control over a sliding time window. Each request is
//! mapped to a bucket keyed by client identity and scope:
//!
//! - **Endpoint scope**: the request path matches a configured override
//!   (normalized, case-insensitive exact match) and uses its policy
//! - **Global scope**: every other path of the same client shares one bucket
//!   under the default policy
//!
//! A bucket is a log of admission timestamps. A request is admitted only if
//! fewer than `max_count` admissions fall inside the trailing window, so there
//! is no burst at window boundaries as with fixed-window counters.
//!
//! # Example
//!
//! ```rust,no_run
//! use gatekeeper::config::RateLimiterOptions;
//! use gatekeeper::rate_limit::{apply_rate_limiting, RateLimiter};
//! use axum::{routing::get, Router};
//! use std::sync::Arc;
//!
//! let limiter = Arc::new(RateLimiter::new(RateLimiterOptions::default()).unwrap());
//! let app: Router = apply_rate_limiting(Router::new().route("/", get(|| async { "ok" })), limiter);
//! ```

pub mod clock;
pub mod identity;
pub mod middleware;
pub mod policy;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use identity::resolve_client_identity;
pub use middleware::{apply_rate_limiting, rate_limit_middleware};
pub use policy::{normalize_path, EndpointPolicyResolver};
pub use service::{RateLimiter, RequestInfo};
pub use store::{RateLimitStore, SlidingWindowStore};
pub use types::{
    Decision, EndpointOverride, RateLimitKey, Scope, WindowPolicy, GLOBAL_SCOPE, UNKNOWN_CLIENT,
};
