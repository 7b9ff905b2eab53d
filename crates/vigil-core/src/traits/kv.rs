// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value cache with per-key TTL.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::VigilError;

/// Short-TTL key-value storage.
///
/// Backs the statistics cache, the dead-letter records and index, and the
/// rate-limit counters consumed by external collaborators. Values are JSON
/// documents; a missing or expired key reads as `None`.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Store a value, optionally expiring after `ttl`.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), VigilError>;

    async fn get(&self, key: &str) -> Result<Option<Value>, VigilError>;

    async fn delete(&self, key: &str) -> Result<(), VigilError>;

    async fn exists(&self, key: &str) -> Result<bool, VigilError>;

    /// Store only if the key is absent. Returns whether the value was set.
    async fn set_nx(&self, key: &str, value: Value, ttl: Option<Duration>)
        -> Result<bool, VigilError>;

    /// Increment a counter, creating it at 1 when absent.
    async fn incr(&self, key: &str) -> Result<i64, VigilError>;

    async fn decr(&self, key: &str) -> Result<i64, VigilError>;

    /// Set a TTL on an existing key. A no-op when the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), VigilError>;

    /// Keys matching a prefix pattern (a literal prefix ending in `*`, or an
    /// exact key).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, VigilError>;
}
