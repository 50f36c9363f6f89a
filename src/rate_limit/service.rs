use super::clock::{Clock, MonotonicClock};
use super::identity::resolve_client_identity;
use super::policy::EndpointPolicyResolver;
use super::store::{RateLimitStore, SlidingWindowStore};
use super::types::{Decision, RateLimitKey, WindowPolicy};
use crate::config::RateLimiterOptions;
use crate::error::Result;
use crate::metrics::record_rate_limit_decision;
use axum::http::HeaderMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// The parts of an inbound request the limiter looks at
#[derive(Debug, Clone, Copy)]
pub struct RequestInfo<'a> {
    /// Request path
    pub path: &'a str,
    /// Request headers
    pub headers: &'a HeaderMap,
    /// Transport-level peer address, if known
    pub remote_ip: Option<IpAddr>,
}

/// Admission service: resolves identity and policy, then asks the store
pub struct RateLimiter {
    options: RateLimiterOptions,
    default_policy: WindowPolicy,
    endpoints: EndpointPolicyResolver,
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("options", &self.options)
            .field("store", &"<dyn RateLimitStore>")
            .finish()
    }
}

impl RateLimiter {
    /// Create a rate limiter with an in-memory store and the process clock
    pub fn new(options: RateLimiterOptions) -> Result<Self> {
        Self::with_store(
            options,
            Arc::new(SlidingWindowStore::new()),
            Arc::new(MonotonicClock::new()),
        )
    }

    /// Create a rate limiter with an explicit store and clock
    pub fn with_store(
        options: RateLimiterOptions,
        store: Arc<dyn RateLimitStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        options.validate()?;

        let endpoints = EndpointPolicyResolver::new(
            options
                .endpoint_overrides
                .iter()
                .map(|o| (o.path.clone(), o.policy)),
        );

        info!(
            enabled = options.enabled,
            default_window_ms = options.default_window_ms,
            default_max_count = options.default_max_count,
            overrides = endpoints.overrides().len(),
            trust_forwarded = options.trust_forwarded_for_header,
            "Initializing sliding window rate limiter"
        );

        Ok(Self {
            default_policy: options.default_policy(),
            options,
            endpoints,
            store,
            clock,
        })
    }

    /// Decide whether a request observed at `now_ms` is admitted
    pub fn decide(&self, request: &RequestInfo<'_>, now_ms: u64) -> Decision {
        if !self.options.enabled {
            return Decision::Allowed;
        }

        let (key, policy) = self.resolve(request);
        let store_key = key.to_store_key();

        let decision = if self
            .store
            .try_acquire(&store_key, policy.window_ms, policy.max_count, now_ms)
        {
            debug!(key = %store_key, "Rate limit check passed");
            Decision::Allowed
        } else {
            warn!(
                client = %key.client,
                scope = %key.scope.as_str(),
                window_ms = policy.window_ms,
                max_count = policy.max_count,
                "Rate limit exceeded"
            );
            Decision::Denied
        };

        record_rate_limit_decision(key.scope.as_str(), decision);
        decision
    }

    /// Decide using the limiter's own clock
    pub fn check(&self, request: &RequestInfo<'_>) -> Decision {
        self.decide(request, self.clock.now_ms())
    }

    /// Resolve the bucket key and policy for a request
    pub fn resolve(&self, request: &RequestInfo<'_>) -> (RateLimitKey, WindowPolicy) {
        let client = resolve_client_identity(
            request.headers,
            request.remote_ip,
            self.options.trust_forwarded_for_header,
            &self.options.forwarded_for_header_name,
        );

        // Overrides are keyed by the configured path, so every spelling of a
        // path that matches an override shares its bucket.
        match self.endpoints.resolve(request.path) {
            Some(endpoint) => (
                RateLimitKey::endpoint(client, endpoint.path.clone()),
                endpoint.policy,
            ),
            None => (RateLimitKey::global(client), self.default_policy),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.options.enabled
    }

    pub fn options(&self) -> &RateLimiterOptions {
        &self.options
    }

    /// Start the background sweep that drops idle buckets.
    ///
    /// A bucket is idle once its newest admission is older than the largest
    /// configured window, at which point every entry in it would be pruned on
    /// its next access anyway. Returns `None` when the sweep is disabled.
    pub fn spawn_eviction(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.options.enabled || self.options.eviction_interval_secs == 0 {
            info!("Idle bucket eviction disabled");
            return None;
        }

        let limiter = Arc::clone(self);
        let period = Duration::from_secs(self.options.eviction_interval_secs);
        let idle_ms = self.options.max_window_ms();

        Some(tokio::spawn(async move {
            let mut ticker = interval(period);

            info!(
                interval_secs = period.as_secs(),
                idle_ms, "Started idle bucket eviction"
            );

            loop {
                ticker.tick().await;

                let removed = limiter.store.evict_idle(limiter.clock.now_ms(), idle_ms);
                if removed > 0 {
                    info!(removed, "Evicted idle rate limit buckets");
                }
            }
        }))
    }
}
