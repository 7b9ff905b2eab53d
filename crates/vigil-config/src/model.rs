// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Vigil alerting service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Vigil configuration.
///
/// Loaded from TOML files with environment variable overrides. All sections
/// are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VigilConfig {
    /// HTTP/WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Event bus settings.
    #[serde(default)]
    pub bus: BusConfig,

    /// Statistics cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Publish retry settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Circuit breaker settings for notification sinks.
    #[serde(default)]
    pub breaker: BreakerConfig,

    /// Notification sink settings.
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Alert expiration sweeper settings.
    #[serde(default)]
    pub expiration: ExpirationConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP/WebSocket server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds allowed for in-flight requests to drain at shutdown.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "vigil.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Event bus configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Per-instance consumer identity within consumer groups.
    #[serde(default = "default_consumer_id")]
    pub consumer_id: String,

    /// Maximum entries fetched per blocking group read.
    #[serde(default = "default_read_count")]
    pub read_count: u32,

    /// Blocking read window in seconds.
    #[serde(default = "default_block_secs")]
    pub block_secs: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            consumer_id: default_consumer_id(),
            read_count: default_read_count(),
            block_secs: default_block_secs(),
        }
    }
}

fn default_consumer_id() -> String {
    "vigil-1".to_string()
}

fn default_read_count() -> u32 {
    10
}

fn default_block_secs() -> u64 {
    5
}

/// Statistics cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// TTL for the aggregated statistics entry, in seconds.
    #[serde(default = "default_stats_ttl_secs")]
    pub stats_ttl_secs: u64,

    /// Interval between expired-entry sweeps, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stats_ttl_secs: default_stats_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_stats_ttl_secs() -> u64 {
    60
}

fn default_sweep_interval_secs() -> u64 {
    60
}

/// Publish retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
            jitter: default_jitter(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> bool {
    true
}

/// Circuit breaker configuration for notification sinks.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerConfig {
    /// Consecutive failures before the breaker opens.
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,

    /// Seconds the breaker stays open before probing.
    #[serde(default = "default_breaker_timeout_secs")]
    pub timeout_secs: u64,

    /// Trial calls admitted in the half-open state.
    #[serde(default = "default_half_open_requests")]
    pub half_open_requests: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: default_max_failures(),
            timeout_secs: default_breaker_timeout_secs(),
            half_open_requests: default_half_open_requests(),
        }
    }
}

fn default_max_failures() -> u32 {
    5
}

fn default_breaker_timeout_secs() -> u64 {
    30
}

fn default_half_open_requests() -> u32 {
    3
}

/// Notification sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
    /// Webhook URL for the JSON sink. `None` disables the sink.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Minimum severity that triggers a notification.
    #[serde(default = "default_min_severity")]
    pub min_severity: String,

    /// Global cap on notifications per minute.
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            min_severity: default_min_severity(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
        }
    }
}

fn default_min_severity() -> String {
    "medium".to_string()
}

fn default_rate_limit_per_minute() -> u32 {
    30
}

/// Alert expiration sweeper configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExpirationConfig {
    /// Interval between expiration scans, in seconds.
    #[serde(default = "default_expiration_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for ExpirationConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_expiration_interval_secs(),
        }
    }
}

fn default_expiration_interval_secs() -> u64 {
    60
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
