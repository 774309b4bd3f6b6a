//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the builder.
//! All types derive Serde traits for deserialization from config files. Keys
//! from the older JSON layout (`haproxyReloadCmd`, `consulHostPort`, ...) are
//! accepted as aliases.

use serde::{Deserialize, Serialize};

/// Root configuration for the builder.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Command run after a new configuration is activated.
    #[serde(alias = "haproxyReloadCmd")]
    pub reload_cmd: String,

    /// VIP allowlist. Only these names are ever rendered.
    pub vips: Vec<String>,

    /// Registry base URL (e.g., "http://127.0.0.1:8500").
    #[serde(alias = "consulHostPort")]
    pub registry_url: String,

    /// Active proxy configuration file.
    #[serde(alias = "configFile")]
    pub config_file: String,

    /// Staging file the candidate document is written to.
    #[serde(alias = "tempFile")]
    pub staging_file: String,

    /// KV prefix holding global/defaults/frontend/backend specs.
    #[serde(alias = "consulConfigPath")]
    pub key_prefix: String,

    /// Content-diff executable used for change detection.
    pub diff_cmd: String,

    /// Restore the previous active file when the reload command fails.
    pub rollback_on_reload_failure: bool,

    /// Long-poll settings.
    pub watch: WatchConfig,

    /// Retry policy after a failed cycle.
    pub retry: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            reload_cmd: "service haproxy reload".to_string(),
            vips: Vec::new(),
            registry_url: "http://127.0.0.1:8500".to_string(),
            config_file: "/etc/haproxy/haproxy.cfg".to_string(),
            staging_file: "/tmp/cb.out".to_string(),
            key_prefix: "/apps/haproxy".to_string(),
            diff_cmd: "diff".to_string(),
            rollback_on_reload_failure: false,
            watch: WatchConfig::default(),
            retry: RetryConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl BuilderConfig {
    /// Registry base URL with a scheme, without a trailing slash.
    ///
    /// A bare `host:port` is treated as plain HTTP.
    pub fn registry_base(&self) -> String {
        let url = self.registry_url.trim().trim_end_matches('/');
        if url.contains("://") {
            url.to_string()
        } else {
            format!("http://{}", url)
        }
    }

    /// KV prefix with surrounding slashes removed.
    pub fn normalized_prefix(&self) -> String {
        self.key_prefix.trim().trim_matches('/').to_string()
    }
}

/// Long-poll configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Server-side wait for blocking catalog queries, in seconds.
    pub wait_secs: u64,

    /// Timeout for non-blocking registry calls, in seconds.
    pub request_timeout_secs: u64,

    /// Index the watcher starts from.
    pub resume_index: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            wait_secs: 300,
            request_timeout_secs: 10,
            resume_index: 0,
        }
    }
}

/// How the delay between failed cycles grows.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategy {
    /// Always wait `base_delay_ms`.
    #[default]
    Fixed,
    /// Double from `base_delay_ms` up to `max_delay_ms`, with jitter.
    Exponential,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub strategy: RetryStrategy,

    /// Delay after the first failure in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound for exponential delays in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: RetryStrategy::Fixed,
            base_delay_ms: 2000,
            max_delay_ms: 60_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9102".to_string(),
        }
    }
}
