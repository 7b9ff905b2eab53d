// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The alert service: single entry point for lifecycle commands.
//!
//! Every mutation runs the same transactional sequence: load, validate the
//! transition, persist, then fan out. The fan-out order is fixed: (1)
//! statistics cache invalidation, (2) hub broadcast, (3) durable event
//! publish. A store failure aborts the command; after the store has
//! committed, fan-out failures are logged but never roll back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use vigil_core::alert::{Alert, AlertSeverity, AlertStatistics, AlertStatus};
use vigil_core::valueobject::{AlertFilter, PaginatedResult, Pagination};
use vigil_core::{AlertBroadcaster, AlertStore, KvStore, VigilError, STATS_CACHE_KEY};

use crate::producer::AlertEventProducer;

/// Input for creating a new alert.
#[derive(Debug, Clone, Default)]
pub struct CreateAlertInput {
    pub title: String,
    pub message: String,
    pub severity: Option<AlertSeverity>,
    pub source: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Input for listing alerts.
#[derive(Debug, Clone, Default)]
pub struct ListInput {
    pub filter: AlertFilter,
    pub pagination: Option<Pagination>,
}

/// Orchestrates alert lifecycle commands across the store, the statistics
/// cache, the broadcast plane, and the event bus.
pub struct AlertService {
    store: Arc<dyn AlertStore>,
    cache: Arc<dyn KvStore>,
    broadcaster: Arc<dyn AlertBroadcaster>,
    producer: AlertEventProducer,
    stats_ttl: Duration,
}

impl AlertService {
    pub fn new(
        store: Arc<dyn AlertStore>,
        cache: Arc<dyn KvStore>,
        broadcaster: Arc<dyn AlertBroadcaster>,
        producer: AlertEventProducer,
        stats_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            broadcaster,
            producer,
            stats_ttl,
        }
    }

    /// Create a new active alert.
    pub async fn create(&self, input: CreateAlertInput) -> Result<Alert, VigilError> {
        let severity = input.severity.ok_or_else(|| {
            VigilError::Validation("alert severity is required".into())
        })?;

        let mut alert = Alert::new(input.title, input.message, severity, input.source)?;
        for (key, value) in input.metadata {
            alert.add_metadata(key, value);
        }

        self.store.create(&alert).await?;

        self.invalidate_stats().await;
        self.broadcaster.alert_created(&alert);
        self.producer.alert_created(&alert).await;

        Ok(alert)
    }

    /// Fetch a single alert.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Alert, VigilError> {
        self.store.get_by_id(id).await.map_err(Self::map_not_found)
    }

    /// Paginated listing with filters.
    pub async fn list(&self, input: ListInput) -> Result<PaginatedResult<Alert>, VigilError> {
        let pagination = input.pagination.unwrap_or_default();
        self.store.list(&input.filter, pagination).await
    }

    /// All currently active alerts.
    pub async fn get_active_alerts(&self) -> Result<Vec<Alert>, VigilError> {
        self.store.list_active().await
    }

    /// Transition `active -> acknowledged`.
    pub async fn acknowledge(&self, alert_id: Uuid, user_id: Uuid) -> Result<Alert, VigilError> {
        let mut alert = self
            .store
            .get_by_id(alert_id)
            .await
            .map_err(Self::map_not_found)?;

        alert.acknowledge(user_id)?;
        self.store.update(&alert).await?;

        self.invalidate_stats().await;
        self.broadcaster.alert_acknowledged(&alert);
        self.producer.alert_acknowledged(&alert).await;

        Ok(alert)
    }

    /// Transition `{active, acknowledged} -> resolved`.
    pub async fn resolve(&self, alert_id: Uuid, user_id: Uuid) -> Result<Alert, VigilError> {
        let mut alert = self
            .store
            .get_by_id(alert_id)
            .await
            .map_err(Self::map_not_found)?;

        alert.resolve(user_id)?;
        self.store.update(&alert).await?;

        self.invalidate_stats().await;
        self.broadcaster.alert_resolved(&alert);
        self.producer.alert_resolved(&alert).await;

        Ok(alert)
    }

    /// Background-only transition to `expired`, permitted once `expires_at`
    /// has passed. A no-op for alerts that are not active or not yet lapsed.
    pub async fn expire(&self, alert_id: Uuid) -> Result<(), VigilError> {
        let mut alert = self
            .store
            .get_by_id(alert_id)
            .await
            .map_err(Self::map_not_found)?;

        if alert.status != AlertStatus::Active {
            return Ok(());
        }
        if !alert.is_expired() {
            debug!(alert_id = %alert_id, "alert not yet past its expiration, skipping");
            return Ok(());
        }

        alert.expire();
        self.store.update(&alert).await?;

        self.invalidate_stats().await;
        self.producer.alert_expired(&alert).await;

        Ok(())
    }

    /// Expire every active alert whose expiration has lapsed. Returns the
    /// number transitioned.
    pub async fn expire_lapsed(&self) -> Result<usize, VigilError> {
        let lapsed = self.store.list_expired().await?;
        let count = lapsed.len();
        for alert in lapsed {
            if let Err(err) = self.expire(alert.id).await {
                warn!(alert_id = %alert.id, error = %err, "failed to expire alert");
            }
        }
        Ok(count)
    }

    /// Physically remove an alert. Role enforcement happens at the edge;
    /// `actor_id` is recorded in the deletion event.
    pub async fn delete(&self, alert_id: Uuid, actor_id: Option<Uuid>) -> Result<(), VigilError> {
        self.store
            .delete(alert_id)
            .await
            .map_err(Self::map_not_found)?;

        self.invalidate_stats().await;
        self.broadcaster.alert_deleted(alert_id);
        self.producer.alert_deleted(alert_id, actor_id).await;

        Ok(())
    }

    /// Aggregated statistics, cache-aside with the configured TTL.
    pub async fn get_statistics(&self) -> Result<AlertStatistics, VigilError> {
        if let Some(cached) = self.cache.get(STATS_CACHE_KEY).await? {
            match serde_json::from_value::<AlertStatistics>(cached) {
                Ok(stats) => return Ok(stats),
                Err(err) => warn!(error = %err, "discarding malformed cached statistics"),
            }
        }

        let stats = self.store.get_statistics().await?;

        if let Ok(value) = serde_json::to_value(&stats) {
            if let Err(err) = self
                .cache
                .set(STATS_CACHE_KEY, value, Some(self.stats_ttl))
                .await
            {
                warn!(error = %err, "failed to cache statistics");
            }
        }
        self.broadcaster.stats_update(&stats);

        Ok(stats)
    }

    /// Statistics invalidation precedes both fan-out legs so downstream
    /// consumers that re-read statistics never observe pre-mutation totals.
    async fn invalidate_stats(&self) {
        if let Err(err) = self.cache.delete(STATS_CACHE_KEY).await {
            warn!(error = %err, "failed to invalidate statistics cache");
        }
    }

    fn map_not_found(err: VigilError) -> VigilError {
        match err {
            VigilError::NotFound => VigilError::AlertNotFound,
            other => other,
        }
    }
}
