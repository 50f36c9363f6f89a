//! Endpoint policy resolution.
//!
//! Overrides match by exact path equality after normalization, ignoring
//! ASCII case. No prefix or pattern matching is performed.

use super::types::{EndpointOverride, WindowPolicy};
use tracing::debug;

/// Normalize a path for comparison.
///
/// An empty path becomes `/`, a missing leading `/` is added, and a single
/// trailing `/` is removed unless the path is the root.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }

    normalized
}

/// Per-endpoint override table, compiled once from configuration
#[derive(Debug, Clone, Default)]
pub struct EndpointPolicyResolver {
    overrides: Vec<EndpointOverride>,
}

impl EndpointPolicyResolver {
    /// Build a resolver; configured paths are normalized up front.
    /// List order is kept, the first matching entry wins.
    pub fn new<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (String, WindowPolicy)>,
    {
        let overrides = overrides
            .into_iter()
            .map(|(path, policy)| EndpointOverride {
                path: normalize_path(&path),
                policy,
            })
            .collect();

        Self { overrides }
    }

    /// Find the override for a request path, if any
    pub fn resolve(&self, request_path: &str) -> Option<&EndpointOverride> {
        if self.overrides.is_empty() {
            return None;
        }

        let normalized = normalize_path(request_path);
        let matched = self
            .overrides
            .iter()
            .find(|o| o.path.eq_ignore_ascii_case(&normalized));

        if let Some(o) = matched {
            debug!(path = %request_path, endpoint = %o.path, "Endpoint override matched");
        }

        matched
    }

    /// Configured overrides in resolution order
    pub fn overrides(&self) -> &[EndpointOverride] {
        &self.overrides
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}
