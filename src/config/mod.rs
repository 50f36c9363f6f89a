use crate::error::{GatekeeperError, Result};
use crate::rate_limit::types::WindowPolicy;
use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Rate limiter configuration
    #[serde(default)]
    pub rate_limiter: RateLimiterOptions,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Expose Prometheus metrics on `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

/// Rate limiter options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterOptions {
    /// Master switch; when false every request is admitted
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Window of the global default policy, in milliseconds
    #[serde(default = "default_window_ms")]
    pub default_window_ms: u64,
    /// Admissions allowed per window by the global default policy
    #[serde(default = "default_max_count")]
    pub default_max_count: u32,
    /// Per-endpoint policies, first match wins
    #[serde(default)]
    pub endpoint_overrides: Vec<EndpointOverrideConfig>,
    /// Identify clients by the forwarded header instead of the peer address
    #[serde(default)]
    pub trust_forwarded_for_header: bool,
    /// Header carrying the forwarded client chain
    #[serde(default = "default_forwarded_header")]
    pub forwarded_for_header_name: String,
    /// Interval of the idle bucket sweep in seconds (0 disables it)
    #[serde(default = "default_eviction_interval")]
    pub eviction_interval_secs: u64,
}

/// Endpoint override as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointOverrideConfig {
    /// Endpoint path, compared after normalization
    pub path: String,
    #[serde(flatten)]
    pub policy: WindowPolicy,
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_window_ms() -> u64 {
    1000
}

fn default_max_count() -> u32 {
    10
}

fn default_forwarded_header() -> String {
    "X-Forwarded-For".to_string()
}

fn default_eviction_interval() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            metrics_enabled: default_true(),
        }
    }
}

impl Default for RateLimiterOptions {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            default_window_ms: default_window_ms(),
            default_max_count: default_max_count(),
            endpoint_overrides: Vec::new(),
            trust_forwarded_for_header: false,
            forwarded_for_header_name: default_forwarded_header(),
            eviction_interval_secs: default_eviction_interval(),
        }
    }
}

impl RateLimiterOptions {
    /// The global default policy
    pub fn default_policy(&self) -> WindowPolicy {
        WindowPolicy::new(self.default_window_ms, self.default_max_count)
    }

    /// Largest window across the default policy and all overrides
    pub fn max_window_ms(&self) -> u64 {
        self.endpoint_overrides
            .iter()
            .map(|o| o.policy.window_ms)
            .fold(self.default_window_ms, u64::max)
    }

    /// Validate rate limiter options
    pub fn validate(&self) -> Result<()> {
        if self.default_window_ms == 0 {
            return Err(GatekeeperError::Config(
                "Default rate limit window must be > 0".to_string(),
            ));
        }
        if self.default_max_count == 0 {
            return Err(GatekeeperError::Config(
                "Default rate limit count must be > 0".to_string(),
            ));
        }

        for endpoint in &self.endpoint_overrides {
            if endpoint.policy.window_ms == 0 {
                return Err(GatekeeperError::Config(format!(
                    "Rate limit window must be > 0 for endpoint: {}",
                    endpoint.path
                )));
            }
            if endpoint.policy.max_count == 0 {
                return Err(GatekeeperError::Config(format!(
                    "Rate limit count must be > 0 for endpoint: {}",
                    endpoint.path
                )));
            }
        }

        HeaderName::from_bytes(self.forwarded_for_header_name.as_bytes()).map_err(|e| {
            GatekeeperError::Config(format!(
                "Invalid forwarded header name '{}': {}",
                self.forwarded_for_header_name, e
            ))
        })?;

        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GatekeeperError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| GatekeeperError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(GatekeeperError::Config(
                "Server host cannot be empty".to_string(),
            ));
        }

        self.rate_limiter.validate()
    }
}
