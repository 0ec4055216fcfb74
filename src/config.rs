//! Process configuration. Upstream base URLs follow the crate-wide
//! `env_base` convention: a compiled-in default, overridable by an
//! environment variable (handy for pointing adapters at a mock server
//! in tests or a regional mirror in production).

use std::time::Duration;

/// Resolves a base URL: the environment variable if set and non-empty,
/// otherwise the compiled-in default.
pub fn env_base(default: &str, env_var: &str) -> String {
    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Per-IP requests allowed per rolling window (spec §5: 60/60s).
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: std::env::var("AGGREGATOR_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("AGGREGATOR_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            rate_limit_max_requests: 60,
            rate_limit_window: Duration::from_secs(60),
            allowed_origins: vec![
                "https://evidence-aggregator.example".to_string(),
                "https://app.evidence-aggregator.example".to_string(),
                "https://staging.evidence-aggregator.example".to_string(),
            ],
        }
    }
}
