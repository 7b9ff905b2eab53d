// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! DashMap-backed [`KvStore`] with per-key TTL.
//!
//! Expired entries are dropped lazily on access; a background sweeper
//! reclaims the rest. Counters are stored as JSON numbers so they read back
//! through the same `get` path as every other value.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use vigil_core::{KvStore, VigilError};

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process KV store.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: DashMap<String, Entry>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining TTL of a live key; `None` for absent, expired, or
    /// non-expiring keys.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let entry = self.entries.get(key)?;
        if entry.is_expired() {
            return None;
        }
        entry
            .expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Drop every expired entry. Returns the number reclaimed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before - self.entries.len()
    }

    /// Run the periodic sweeper until cancelled.
    pub async fn run_sweeper(&self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // skip the immediate first tick
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = self.purge_expired();
                    if purged > 0 {
                        debug!(purged, "cache sweeper reclaimed expired entries");
                    }
                }
                _ = cancel.cancelled() => break,
            }
        }
    }

    /// Read a live entry, dropping it if expired.
    fn live(&self, key: &str) -> Option<Value> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => return Some(entry.value.clone()),
            None => return None,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    fn adjust_counter(&self, key: &str, delta: i64) -> Result<i64, VigilError> {
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::from(0i64),
            expires_at: None,
        });

        if entry.is_expired() {
            *entry = Entry {
                value: Value::from(0i64),
                expires_at: None,
            };
        }

        let current = entry.value.as_i64().ok_or_else(|| {
            VigilError::InvalidData(format!("key '{key}' does not hold an integer"))
        })?;
        let next = current + delta;
        entry.value = Value::from(next);
        Ok(next)
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), VigilError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, VigilError> {
        Ok(self.live(key))
    }

    async fn delete(&self, key: &str) -> Result<(), VigilError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, VigilError> {
        Ok(self.live(key).is_some())
    }

    async fn set_nx(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<bool, VigilError> {
        if self.live(key).is_some() {
            return Ok(false);
        }
        self.set(key, value, ttl).await?;
        Ok(true)
    }

    async fn incr(&self, key: &str) -> Result<i64, VigilError> {
        self.adjust_counter(key, 1)
    }

    async fn decr(&self, key: &str) -> Result<i64, VigilError> {
        self.adjust_counter(key, -1)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), VigilError> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if !entry.is_expired() {
                entry.expires_at = Some(Instant::now() + ttl);
            }
        }
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, VigilError> {
        let matches: Vec<String> = match pattern.strip_suffix('*') {
            Some(prefix) => self
                .entries
                .iter()
                .filter(|entry| !entry.value().is_expired() && entry.key().starts_with(prefix))
                .map(|entry| entry.key().clone())
                .collect(),
            None => self
                .entries
                .get(pattern)
                .filter(|entry| !entry.is_expired())
                .map(|_| vec![pattern.to_string()])
                .unwrap_or_default(),
        };
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_delete_round_trip() {
        let kv = MemoryKv::new();
        kv.set("user:1", json!({"name": "dana"}), None).await.unwrap();

        let value = kv.get("user:1").await.unwrap().unwrap();
        assert_eq!(value["name"], "dana");
        assert!(kv.exists("user:1").await.unwrap());

        kv.delete("user:1").await.unwrap();
        assert!(kv.get("user:1").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let kv = MemoryKv::new();
        kv.set("stats:alerts", json!({"total": 3}), Some(Duration::from_secs(60)))
            .await
            .unwrap();

        assert!(kv.ttl("stats:alerts").unwrap() <= Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(kv.get("stats:alerts").await.unwrap().is_none());
        assert!(!kv.exists("stats:alerts").await.unwrap());
        assert!(kv.ttl("stats:alerts").is_none());
    }

    #[tokio::test]
    async fn set_nx_only_sets_when_absent() {
        let kv = MemoryKv::new();
        assert!(kv.set_nx("lock", json!(1), None).await.unwrap());
        assert!(!kv.set_nx("lock", json!(2), None).await.unwrap());
        assert_eq!(kv.get("lock").await.unwrap().unwrap(), json!(1));
    }

    #[tokio::test(start_paused = true)]
    async fn set_nx_succeeds_after_expiry() {
        let kv = MemoryKv::new();
        assert!(kv
            .set_nx("lock", json!(1), Some(Duration::from_secs(1)))
            .await
            .unwrap());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(kv.set_nx("lock", json!(2), None).await.unwrap());
    }

    #[tokio::test]
    async fn counters_increment_and_decrement() {
        let kv = MemoryKv::new();
        assert_eq!(kv.incr("ratelimit:u1").await.unwrap(), 1);
        assert_eq!(kv.incr("ratelimit:u1").await.unwrap(), 2);
        assert_eq!(kv.decr("ratelimit:u1").await.unwrap(), 1);
        assert_eq!(kv.decr("hits").await.unwrap(), -1);
    }

    #[tokio::test]
    async fn incr_on_non_numeric_value_fails() {
        let kv = MemoryKv::new();
        kv.set("name", json!("dana"), None).await.unwrap();
        assert!(kv.incr("name").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn expire_sets_ttl_on_existing_key() {
        let kv = MemoryKv::new();
        kv.set("session:1", json!(true), None).await.unwrap();
        kv.expire("session:1", Duration::from_secs(5)).await.unwrap();

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(kv.get("session:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn keys_match_prefix_patterns() {
        let kv = MemoryKv::new();
        kv.set("failed_event:a", json!(1), None).await.unwrap();
        kv.set("failed_event:b", json!(2), None).await.unwrap();
        kv.set("stats:alerts", json!(3), None).await.unwrap();

        let mut keys = kv.keys("failed_event:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["failed_event:a", "failed_event:b"]);

        assert_eq!(kv.keys("stats:alerts").await.unwrap(), vec!["stats:alerts"]);
        assert!(kv.keys("missing:*").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_reclaims_only_expired_entries() {
        let kv = MemoryKv::new();
        kv.set("short", json!(1), Some(Duration::from_secs(1))).await.unwrap();
        kv.set("long", json!(2), Some(Duration::from_secs(100))).await.unwrap();
        kv.set("forever", json!(3), None).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(kv.purge_expired(), 1);
        assert!(kv.exists("long").await.unwrap());
        assert!(kv.exists("forever").await.unwrap());
    }
}
