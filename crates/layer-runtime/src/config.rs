//! Runtime settings for the layer lifecycle.

use std::time::Duration;

use overlay_protocol::directive::DEFAULT_PROXY_ENDPOINT;
use overlay_protocol::AdapterContext;

/// Default quiet period before a viewport refresh fires.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Settings shared by the lifecycle manager, scheduler and metadata tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Same-origin relay for CORS-restricted raster services
    pub proxy_endpoint: String,
    /// Debounce interval for viewport refreshes
    pub debounce: Duration,
    /// Ask feature services for viewport-scaled simplification
    pub simplify_geometry: bool,
    /// `resultRecordCount` cap for feature queries
    pub max_records: Option<u32>,
    /// Per-request timeout for the HTTP transport
    pub http_timeout: Duration,
    /// Data edited within this many days is current
    pub current_days: i64,
    /// Data edited within this many days is aging; older is stale
    pub aging_days: i64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            proxy_endpoint: DEFAULT_PROXY_ENDPOINT.to_string(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            simplify_geometry: true,
            max_records: Some(2000),
            http_timeout: Duration::from_secs(30),
            current_days: 90,
            aging_days: 365,
        }
    }
}

impl RuntimeConfig {
    /// Load settings from `OVERLAY_*` environment variables, falling back to
    /// the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let proxy_endpoint = std::env::var("OVERLAY_PROXY_ENDPOINT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.proxy_endpoint);

        let debounce = std::env::var("OVERLAY_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.debounce);

        let simplify_geometry = std::env::var("OVERLAY_SIMPLIFY_GEOMETRY")
            .ok()
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(defaults.simplify_geometry);

        // 0 disables the cap
        let max_records = match std::env::var("OVERLAY_MAX_RECORDS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            Some(0) => None,
            Some(n) => Some(n),
            None => defaults.max_records,
        };

        let http_timeout = std::env::var("OVERLAY_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        let current_days = std::env::var("OVERLAY_CURRENT_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.current_days);

        let aging_days = std::env::var("OVERLAY_AGING_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.aging_days);

        Self {
            proxy_endpoint,
            debounce,
            simplify_geometry,
            max_records,
            http_timeout,
            current_days,
            aging_days,
        }
    }

    /// Adapter inputs for the given viewport.
    pub fn adapter_context(&self, bbox: Option<overlay_common::BoundingBox>) -> AdapterContext {
        AdapterContext {
            proxy_endpoint: self.proxy_endpoint.clone(),
            bbox,
            simplify: self.simplify_geometry,
            max_records: self.max_records,
            ..AdapterContext::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.debounce, Duration::from_millis(300));
        assert_eq!(config.proxy_endpoint, "/api/tile-proxy");
        assert!(config.current_days < config.aging_days);
    }

    #[test]
    fn test_adapter_context_carries_settings() {
        let config = RuntimeConfig {
            proxy_endpoint: "/relay".to_string(),
            simplify_geometry: false,
            ..Default::default()
        };
        let ctx = config.adapter_context(None);
        assert_eq!(ctx.proxy_endpoint, "/relay");
        assert!(!ctx.simplify);
        assert_eq!(ctx.max_records, Some(2000));
    }
}
