// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order: compiled defaults, `/etc/vigil/vigil.toml`, `./vigil.toml`,
//! then `VIGIL_*` environment variable overrides.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::VigilConfig;

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<VigilConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VigilConfig::default()))
        .merge(Toml::file("/etc/vigil/vigil.toml"))
        .merge(Toml::file("vigil.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no file lookup).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<VigilConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VigilConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VigilConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VigilConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `VIGIL_STORAGE_DATABASE_PATH` must map
/// to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("VIGIL_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("bus_", "bus.", 1)
            .replacen("cache_", "cache.", 1)
            .replacen("retry_", "retry.", 1)
            .replacen("breaker_", "breaker.", 1)
            .replacen("notifications_", "notifications.", 1)
            .replacen("expiration_", "expiration.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_with_empty_input() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.shutdown_timeout_secs, 10);
        assert_eq!(config.storage.database_path, "vigil.db");
        assert!(config.storage.wal_mode);
        assert_eq!(config.bus.read_count, 10);
        assert_eq!(config.bus.block_secs, 5);
        assert_eq!(config.cache.stats_ttl_secs, 60);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.initial_backoff_ms, 100);
        assert_eq!(config.retry.max_backoff_ms, 30_000);
        assert_eq!(config.breaker.max_failures, 5);
        assert_eq!(config.breaker.timeout_secs, 30);
        assert_eq!(config.breaker.half_open_requests, 3);
        assert!(config.notifications.webhook_url.is_none());
    }

    #[test]
    fn toml_values_override_defaults() {
        let config = load_config_from_str(
            r#"
            [server]
            port = 9090

            [storage]
            database_path = "/var/lib/vigil/vigil.db"

            [notifications]
            webhook_url = "https://hooks.example.com/alerts"
            min_severity = "high"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.storage.database_path, "/var/lib/vigil/vigil.db");
        assert_eq!(
            config.notifications.webhook_url.as_deref(),
            Some("https://hooks.example.com/alerts")
        );
        assert_eq!(config.notifications.min_severity, "high");
        // Untouched sections keep their defaults.
        assert_eq!(config.bus.consumer_id, "vigil-1");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = load_config_from_str(
            r#"
            [server]
            prot = 9090
            "#,
        );
        assert!(result.is_err(), "typo'd key should be rejected");
    }
}
