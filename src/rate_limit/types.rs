use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Scope marker used when no endpoint override applies to a request
pub const GLOBAL_SCOPE: &str = "__GLOBAL__";

/// Client identity used when neither a forwarded header nor a remote
/// address is available. All such requests share one bucket.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Sliding window policy: at most `max_count` admissions in any trailing
/// window of `window_ms` milliseconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowPolicy {
    /// Window length in milliseconds
    pub window_ms: u64,
    /// Maximum number of admissions inside the window
    pub max_count: u32,
}

impl WindowPolicy {
    /// Create a new window policy
    pub fn new(window_ms: u64, max_count: u32) -> Self {
        Self {
            window_ms,
            max_count,
        }
    }

    /// Get the window as a Duration
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// A per-endpoint policy, matched by normalized path equality
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointOverride {
    /// Normalized endpoint path
    pub path: String,
    /// Policy applied to requests for this path
    pub policy: WindowPolicy,
}

/// What a rate limit bucket is scoped to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Shared by every path without an override
    Global,
    /// A single overridden endpoint (normalized path)
    Endpoint(String),
}

impl Scope {
    /// Scope identifier as rendered into keys and metric labels
    pub fn as_str(&self) -> &str {
        match self {
            Scope::Global => GLOBAL_SCOPE,
            Scope::Endpoint(path) => path,
        }
    }
}

/// Rate limit key components
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    /// Client identifier (IP address or forwarded identity)
    pub client: String,
    /// Scope the bucket applies to
    pub scope: Scope,
}

impl RateLimitKey {
    /// Create a key for the global scope
    pub fn global(client: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            scope: Scope::Global,
        }
    }

    /// Create a key for an overridden endpoint
    pub fn endpoint(client: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            scope: Scope::Endpoint(path.into()),
        }
    }

    /// Convert to the string the store buckets by
    pub fn to_store_key(&self) -> String {
        format!("{}|{}", self.client, self.scope.as_str())
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.client, self.scope.as_str())
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Continue normal processing
    Allowed,
    /// Short-circuit with 429 Too Many Requests
    Denied,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    /// Label used for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allowed => "allowed",
            Decision::Denied => "denied",
        }
    }
}
