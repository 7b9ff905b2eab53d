// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publishes alert lifecycle events onto the bus.
//!
//! Publishing is fire-and-forget from the caller's perspective: the store
//! is authoritative, so a publish failure after the retry budget is logged
//! and swallowed, never surfaced to the client.

use std::sync::Arc;

use chrono::Utc;
use tracing::error;
use uuid::Uuid;

use vigil_core::alert::Alert;
use vigil_core::event::{AlertDeletedPayload, AlertEventPayload, Event, EventType};
use vigil_core::EventPublisher;

/// Producer for `alert.*` events.
pub struct AlertEventProducer {
    publisher: Arc<dyn EventPublisher>,
}

impl AlertEventProducer {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    pub async fn alert_created(&self, alert: &Alert) {
        self.publish_lifecycle(EventType::AlertCreated, alert).await;
    }

    pub async fn alert_acknowledged(&self, alert: &Alert) {
        self.publish_lifecycle(EventType::AlertAcknowledged, alert).await;
    }

    pub async fn alert_resolved(&self, alert: &Alert) {
        self.publish_lifecycle(EventType::AlertResolved, alert).await;
    }

    pub async fn alert_expired(&self, alert: &Alert) {
        self.publish_lifecycle(EventType::AlertExpired, alert).await;
    }

    pub async fn alert_deleted(&self, alert_id: Uuid, deleted_by: Option<Uuid>) {
        let payload = AlertDeletedPayload {
            id: alert_id.to_string(),
            deleted_at: Utc::now(),
            deleted_by: deleted_by.map(|u| u.to_string()).unwrap_or_default(),
        };
        self.publish(EventType::AlertDeleted, &payload, &alert_id.to_string())
            .await;
    }

    async fn publish_lifecycle(&self, event_type: EventType, alert: &Alert) {
        let payload = AlertEventPayload::from(alert);
        self.publish(event_type, &payload, &payload.id).await;
    }

    async fn publish<P: serde::Serialize>(&self, event_type: EventType, payload: &P, alert_id: &str) {
        let event = match Event::new(event_type, payload) {
            Ok(event) => event,
            Err(err) => {
                error!(alert_id, event_type = %event_type, error = %err, "failed to build event");
                return;
            }
        };

        if let Err(err) = self.publisher.publish(&event).await {
            error!(alert_id, event_type = %event_type, error = %err, "failed to publish event");
        }
    }
}
