// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event-driven counters exposed to the admin surface.
//!
//! The process-wide snapshot backs `GET /api/v1/admin/metrics/events`; the
//! same handler feeds the Prometheus counters and the active-alerts gauge.
//! The gauge drops exactly once when an alert leaves `active`: on
//! acknowledge, or on a resolve that skipped acknowledgment.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;

use vigil_core::event::{AlertDeletedPayload, AlertEventPayload};
use vigil_core::VigilError;
use vigil_metrics::recording;

use crate::consumer::AlertLifecycleHandler;

/// Counts alert lifecycle events.
#[derive(Debug, Default)]
pub struct EventMetricsHandler {
    alerts_created: AtomicI64,
    alerts_acknowledged: AtomicI64,
    alerts_resolved: AtomicI64,
    alerts_deleted: AtomicI64,
    alerts_expired: AtomicI64,
}

impl EventMetricsHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time snapshot of every counter.
    pub fn snapshot(&self) -> BTreeMap<String, i64> {
        BTreeMap::from([
            ("alerts_created".into(), self.alerts_created.load(Ordering::Relaxed)),
            (
                "alerts_acknowledged".into(),
                self.alerts_acknowledged.load(Ordering::Relaxed),
            ),
            ("alerts_resolved".into(), self.alerts_resolved.load(Ordering::Relaxed)),
            ("alerts_deleted".into(), self.alerts_deleted.load(Ordering::Relaxed)),
            ("alerts_expired".into(), self.alerts_expired.load(Ordering::Relaxed)),
        ])
    }
}

#[async_trait]
impl AlertLifecycleHandler for EventMetricsHandler {
    async fn on_created(&self, payload: &AlertEventPayload) -> Result<(), VigilError> {
        self.alerts_created.fetch_add(1, Ordering::Relaxed);
        recording::record_alert_created(&payload.severity.to_string());
        Ok(())
    }

    async fn on_acknowledged(&self, _payload: &AlertEventPayload) -> Result<(), VigilError> {
        self.alerts_acknowledged.fetch_add(1, Ordering::Relaxed);
        recording::record_alert_acknowledged();
        Ok(())
    }

    async fn on_resolved(&self, payload: &AlertEventPayload) -> Result<(), VigilError> {
        self.alerts_resolved.fetch_add(1, Ordering::Relaxed);
        // Resolved straight from active: the alert never passed through
        // acknowledge, so it leaves the active gauge here.
        recording::record_alert_resolved(payload.acknowledged_by.is_none());
        Ok(())
    }

    async fn on_deleted(&self, _payload: &AlertDeletedPayload) -> Result<(), VigilError> {
        self.alerts_deleted.fetch_add(1, Ordering::Relaxed);
        recording::record_alert_deleted();
        Ok(())
    }

    async fn on_expired(&self, _payload: &AlertEventPayload) -> Result<(), VigilError> {
        self.alerts_expired.fetch_add(1, Ordering::Relaxed);
        recording::record_alert_expired();
        Ok(())
    }
}
