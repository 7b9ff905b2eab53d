// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatches `alert.*` events from the bus to registered handlers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use vigil_core::event::{AlertDeletedPayload, AlertEventPayload, Event, EventType};
use vigil_core::{EventHandler, VigilError};

/// Receives each alert lifecycle event per delivery.
///
/// Deliveries are at-least-once: implementations must tolerate republished
/// copies of the same `(event id, type)`.
#[async_trait]
pub trait AlertLifecycleHandler: Send + Sync {
    async fn on_created(&self, payload: &AlertEventPayload) -> Result<(), VigilError>;
    async fn on_acknowledged(&self, payload: &AlertEventPayload) -> Result<(), VigilError>;
    async fn on_resolved(&self, payload: &AlertEventPayload) -> Result<(), VigilError>;
    async fn on_deleted(&self, payload: &AlertDeletedPayload) -> Result<(), VigilError>;
    async fn on_expired(&self, payload: &AlertEventPayload) -> Result<(), VigilError>;
}

/// Fans one bus event out to every registered lifecycle handler.
///
/// The first failing handler aborts the chain and fails the delivery,
/// feeding the bus retry path.
#[derive(Default)]
pub struct AlertConsumer {
    handlers: Vec<Arc<dyn AlertLifecycleHandler>>,
}

impl AlertConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_handler(&mut self, handler: Arc<dyn AlertLifecycleHandler>) {
        self.handlers.push(handler);
    }

    fn alert_payload(event: &Event) -> Result<AlertEventPayload, VigilError> {
        event.payload_as().map_err(|err| {
            error!(
                event_id = event.id.as_str(),
                event_type = %event.event_type,
                error = %err,
                "failed to unmarshal alert payload"
            );
            err
        })
    }

    async fn handle_created(&self, event: &Event) -> Result<(), VigilError> {
        let payload = Self::alert_payload(event)?;
        for handler in &self.handlers {
            if let Err(err) = handler.on_created(&payload).await {
                error!(alert_id = payload.id.as_str(), error = %err, "handler failed for alert.created");
                return Err(err);
            }
        }
        Ok(())
    }

    async fn handle_acknowledged(&self, event: &Event) -> Result<(), VigilError> {
        let payload = Self::alert_payload(event)?;
        for handler in &self.handlers {
            if let Err(err) = handler.on_acknowledged(&payload).await {
                error!(alert_id = payload.id.as_str(), error = %err, "handler failed for alert.acknowledged");
                return Err(err);
            }
        }
        Ok(())
    }

    async fn handle_resolved(&self, event: &Event) -> Result<(), VigilError> {
        let payload = Self::alert_payload(event)?;
        for handler in &self.handlers {
            if let Err(err) = handler.on_resolved(&payload).await {
                error!(alert_id = payload.id.as_str(), error = %err, "handler failed for alert.resolved");
                return Err(err);
            }
        }
        Ok(())
    }

    async fn handle_expired(&self, event: &Event) -> Result<(), VigilError> {
        let payload = Self::alert_payload(event)?;
        for handler in &self.handlers {
            if let Err(err) = handler.on_expired(&payload).await {
                error!(alert_id = payload.id.as_str(), error = %err, "handler failed for alert.expired");
                return Err(err);
            }
        }
        Ok(())
    }

    async fn handle_deleted(&self, event: &Event) -> Result<(), VigilError> {
        let payload: AlertDeletedPayload = event.payload_as().map_err(|err| {
            error!(event_id = event.id.as_str(), error = %err, "failed to unmarshal alert deleted payload");
            err
        })?;
        for handler in &self.handlers {
            if let Err(err) = handler.on_deleted(&payload).await {
                error!(alert_id = payload.id.as_str(), error = %err, "handler failed for alert.deleted");
                return Err(err);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler for AlertConsumer {
    async fn handle(&self, event: &Event) -> Result<(), VigilError> {
        debug!(
            event_id = event.id.as_str(),
            event_type = %event.event_type,
            retries = event.retries,
            "processing event"
        );

        match event.event_type {
            EventType::AlertCreated => self.handle_created(event).await,
            EventType::AlertAcknowledged => self.handle_acknowledged(event).await,
            EventType::AlertResolved => self.handle_resolved(event).await,
            EventType::AlertExpired => self.handle_expired(event).await,
            EventType::AlertDeleted => self.handle_deleted(event).await,
            EventType::UserCreated | EventType::UserUpdated => {
                debug!(event_type = %event.event_type, "ignoring non-alert event");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vigil_core::alert::{Alert, AlertSeverity};

    #[derive(Default)]
    struct Counting {
        created: AtomicUsize,
        acknowledged: AtomicUsize,
        resolved: AtomicUsize,
        deleted: AtomicUsize,
        expired: AtomicUsize,
        fail_created: bool,
    }

    #[async_trait]
    impl AlertLifecycleHandler for Counting {
        async fn on_created(&self, _p: &AlertEventPayload) -> Result<(), VigilError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            if self.fail_created {
                return Err(VigilError::Internal("nope".into()));
            }
            Ok(())
        }
        async fn on_acknowledged(&self, _p: &AlertEventPayload) -> Result<(), VigilError> {
            self.acknowledged.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn on_resolved(&self, _p: &AlertEventPayload) -> Result<(), VigilError> {
            self.resolved.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn on_deleted(&self, _p: &AlertDeletedPayload) -> Result<(), VigilError> {
            self.deleted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn on_expired(&self, _p: &AlertEventPayload) -> Result<(), VigilError> {
            self.expired.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn event_for(event_type: EventType) -> Event {
        let alert = Alert::new("t", "m", AlertSeverity::Low, "src").unwrap();
        Event::new(event_type, &AlertEventPayload::from(&alert)).unwrap()
    }

    #[tokio::test]
    async fn dispatches_each_event_type_to_every_handler() {
        let h1 = Arc::new(Counting::default());
        let h2 = Arc::new(Counting::default());
        let mut consumer = AlertConsumer::new();
        consumer.register_handler(h1.clone());
        consumer.register_handler(h2.clone());

        consumer.handle(&event_for(EventType::AlertCreated)).await.unwrap();
        consumer.handle(&event_for(EventType::AlertAcknowledged)).await.unwrap();
        consumer.handle(&event_for(EventType::AlertResolved)).await.unwrap();
        consumer.handle(&event_for(EventType::AlertExpired)).await.unwrap();

        let deleted = Event::new(
            EventType::AlertDeleted,
            &AlertDeletedPayload {
                id: "a1".into(),
                deleted_at: chrono::Utc::now(),
                deleted_by: String::new(),
            },
        )
        .unwrap();
        consumer.handle(&deleted).await.unwrap();

        for h in [&h1, &h2] {
            assert_eq!(h.created.load(Ordering::SeqCst), 1);
            assert_eq!(h.acknowledged.load(Ordering::SeqCst), 1);
            assert_eq!(h.resolved.load(Ordering::SeqCst), 1);
            assert_eq!(h.expired.load(Ordering::SeqCst), 1);
            assert_eq!(h.deleted.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn a_failing_handler_fails_the_delivery() {
        let failing = Arc::new(Counting {
            fail_created: true,
            ..Counting::default()
        });
        let downstream = Arc::new(Counting::default());
        let mut consumer = AlertConsumer::new();
        consumer.register_handler(failing);
        consumer.register_handler(downstream.clone());

        let err = consumer.handle(&event_for(EventType::AlertCreated)).await;
        assert!(err.is_err());
        // The chain aborts at the failing handler.
        assert_eq!(downstream.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn user_events_are_ignored() {
        let handler = Arc::new(Counting::default());
        let mut consumer = AlertConsumer::new();
        consumer.register_handler(handler.clone());

        let event = Event::new(EventType::UserCreated, &serde_json::json!({"id": "u1"})).unwrap();
        consumer.handle(&event).await.unwrap();
        assert_eq!(handler.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_payload_is_an_error() {
        let mut consumer = AlertConsumer::new();
        consumer.register_handler(Arc::new(Counting::default()));

        let mut event = event_for(EventType::AlertCreated);
        event.payload = "not json".into();
        assert!(consumer.handle(&event).await.is_err());
    }
}
