// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dead-letter processor: captures events that exhausted their retry
//! budget, retains them for operator review, and exposes the admin retry
//! and suppression operations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use vigil_core::event::{Event, EventType, GROUP_DEAD_LETTER_PROCESSORS, STREAM_DEAD_LETTER};
use vigil_core::{
    EventBus, EventHandler, EventPublisher, EventSubscriber, KvStore, VigilError,
    FAILED_EVENTS_INDEX_KEY, FAILED_EVENT_KEY_PREFIX,
};

/// Retention of dead-letter records.
const FAILED_EVENT_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);
/// Upper bound on the dead-letter index.
const INDEX_LIMIT: usize = 1000;

/// Administrative disposition of a failed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailedEventStatus {
    Pending,
    Retried,
    Ignored,
}

/// A dead-lettered event retained for operator review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedEvent {
    pub id: String,
    pub event_id: String,
    pub event_type: EventType,
    /// Original serialized payload.
    pub payload: String,
    /// Retry count at death.
    pub retries: i64,
    pub failed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    pub status: FailedEventStatus,
}

fn record_key(event_id: &str) -> String {
    format!("{FAILED_EVENT_KEY_PREFIX}{event_id}")
}

/// Consumes the dead-letter stream and owns the failed-event records.
pub struct DeadLetterProcessor {
    bus: Arc<dyn EventBus>,
    kv: Arc<dyn KvStore>,
}

impl DeadLetterProcessor {
    pub fn new(bus: Arc<dyn EventBus>, kv: Arc<dyn KvStore>) -> Self {
        Self { bus, kv }
    }

    /// Subscribe to the dead-letter stream.
    pub async fn start(self: &Arc<Self>) -> Result<(), VigilError> {
        info!("starting dead letter processor");
        self.bus
            .subscribe(
                STREAM_DEAD_LETTER,
                GROUP_DEAD_LETTER_PROCESSORS,
                Arc::clone(self) as Arc<dyn EventHandler>,
            )
            .await?;
        info!("dead letter processor started");
        Ok(())
    }

    /// Stop is handled by the bus-wide unsubscribe at shutdown; kept for
    /// symmetry with the worker contract and safe to call repeatedly.
    pub async fn stop(&self) -> Result<(), VigilError> {
        info!("dead letter processor stopped");
        Ok(())
    }

    /// Enumerate the index and hydrate each record. Records expired out of
    /// the KV are skipped silently.
    pub async fn get_failed_events(&self) -> Result<Vec<FailedEvent>, VigilError> {
        let index = self.read_index().await?;

        let mut events = Vec::with_capacity(index.len());
        for event_id in index {
            let Some(value) = self.kv.get(&record_key(&event_id)).await? else {
                continue;
            };
            match serde_json::from_value::<FailedEvent>(value) {
                Ok(event) => events.push(event),
                Err(err) => {
                    warn!(event_id = event_id.as_str(), error = %err, "skipping malformed failed event record")
                }
            }
        }
        Ok(events)
    }

    /// Republish a failed event as a fresh copy with a reset retry counter,
    /// then mark the record retried.
    ///
    /// Idempotent from the record's point of view; each call republishes
    /// another copy, which downstream consumers deduplicate by event id.
    pub async fn retry_event(&self, event_id: &str) -> Result<(), VigilError> {
        let mut failed = self.load(event_id).await?;

        let event = Event {
            id: failed.event_id.clone(),
            event_type: failed.event_type,
            payload: failed.payload.clone(),
            timestamp: Utc::now(),
            version: 1,
            retries: 0,
        };
        self.bus.publish(&event).await?;

        failed.status = FailedEventStatus::Retried;
        failed.processed_at = Some(Utc::now());
        self.store(&failed).await?;

        info!(event_id, "failed event republished for retry");
        Ok(())
    }

    /// Mark a failed event as ignored.
    pub async fn ignore_event(&self, event_id: &str) -> Result<(), VigilError> {
        let mut failed = self.load(event_id).await?;
        failed.status = FailedEventStatus::Ignored;
        failed.processed_at = Some(Utc::now());
        self.store(&failed).await?;

        info!(event_id, "failed event ignored");
        Ok(())
    }

    async fn load(&self, event_id: &str) -> Result<FailedEvent, VigilError> {
        let value = self
            .kv
            .get(&record_key(event_id))
            .await?
            .ok_or(VigilError::NotFound)?;
        Ok(serde_json::from_value(value)?)
    }

    async fn store(&self, failed: &FailedEvent) -> Result<(), VigilError> {
        self.kv
            .set(
                &record_key(&failed.event_id),
                serde_json::to_value(failed)?,
                Some(FAILED_EVENT_TTL),
            )
            .await
    }

    async fn read_index(&self) -> Result<Vec<String>, VigilError> {
        match self.kv.get(FAILED_EVENTS_INDEX_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value).unwrap_or_default()),
            None => Ok(Vec::new()),
        }
    }

    /// Append to the bounded index, keeping the most recent entries.
    async fn add_to_index(&self, event_id: &str) -> Result<(), VigilError> {
        let mut index = self.read_index().await?;
        index.push(event_id.to_string());
        if index.len() > INDEX_LIMIT {
            index.drain(..index.len() - INDEX_LIMIT);
        }
        self.kv
            .set(
                FAILED_EVENTS_INDEX_KEY,
                serde_json::to_value(index)?,
                Some(FAILED_EVENT_TTL),
            )
            .await
    }
}

#[async_trait]
impl EventHandler for DeadLetterProcessor {
    /// Record a dead-lettered event. The processor never republishes on its
    /// own; returning `Ok` lets the bus acknowledge the entry.
    async fn handle(&self, event: &Event) -> Result<(), VigilError> {
        warn!(
            event_id = event.id.as_str(),
            event_type = %event.event_type,
            retries = event.retries,
            "processing dead letter event"
        );

        let failed = FailedEvent {
            id: event.id.clone(),
            event_id: event.id.clone(),
            event_type: event.event_type,
            payload: event.payload.clone(),
            retries: event.retries,
            failed_at: Utc::now(),
            processed_at: None,
            status: FailedEventStatus::Pending,
        };
        self.store(&failed).await.map_err(|err| {
            error!(event_id = event.id.as_str(), error = %err, "failed to store dead letter event");
            err
        })?;

        if let Err(err) = self.add_to_index(&event.id).await {
            error!(event_id = event.id.as_str(), error = %err, "failed to add event to index");
        }

        error!(
            event_id = event.id.as_str(),
            event_type = %event.event_type,
            retries = event.retries,
            payload = event.payload.as_str(),
            "event moved to dead letter queue, manual intervention may be required"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use vigil_core::{EventPublisher, EventSubscriber};

    /// Bus stub: records publishes, accepts subscriptions.
    #[derive(Default)]
    struct StubBus {
        published: Mutex<Vec<Event>>,
    }

    #[async_trait]
    impl EventPublisher for StubBus {
        async fn publish(&self, event: &Event) -> Result<(), VigilError> {
            self.published.lock().unwrap().push(event.clone());
            Ok(())
        }
        async fn publish_to_stream(&self, _stream: &str, event: &Event) -> Result<(), VigilError> {
            self.publish(event).await
        }
    }

    #[async_trait]
    impl EventSubscriber for StubBus {
        async fn subscribe(
            &self,
            _stream: &str,
            _group: &str,
            _handler: Arc<dyn EventHandler>,
        ) -> Result<(), VigilError> {
            Ok(())
        }
        async fn unsubscribe(&self) -> Result<(), VigilError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct StubKv {
        entries: Mutex<HashMap<String, serde_json::Value>>,
    }

    #[async_trait]
    impl KvStore for StubKv {
        async fn set(
            &self,
            key: &str,
            value: serde_json::Value,
            _ttl: Option<Duration>,
        ) -> Result<(), VigilError> {
            self.entries.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
        async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, VigilError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }
        async fn delete(&self, key: &str) -> Result<(), VigilError> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
        async fn exists(&self, key: &str) -> Result<bool, VigilError> {
            Ok(self.entries.lock().unwrap().contains_key(key))
        }
        async fn set_nx(
            &self,
            key: &str,
            value: serde_json::Value,
            _ttl: Option<Duration>,
        ) -> Result<bool, VigilError> {
            let mut entries = self.entries.lock().unwrap();
            if entries.contains_key(key) {
                return Ok(false);
            }
            entries.insert(key.to_string(), value);
            Ok(true)
        }
        async fn incr(&self, _key: &str) -> Result<i64, VigilError> {
            Ok(0)
        }
        async fn decr(&self, _key: &str) -> Result<i64, VigilError> {
            Ok(0)
        }
        async fn expire(&self, _key: &str, _ttl: Duration) -> Result<(), VigilError> {
            Ok(())
        }
        async fn keys(&self, _pattern: &str) -> Result<Vec<String>, VigilError> {
            Ok(Vec::new())
        }
    }

    fn dead_event(id: &str) -> Event {
        Event {
            id: id.to_string(),
            event_type: EventType::AlertCreated,
            payload: r#"{"id":"a1","title":"t","message":"m","severity":"high","status":"active","created_at":"2026-03-01T00:00:00Z"}"#.into(),
            timestamp: Utc::now(),
            version: 1,
            retries: 3,
        }
    }

    fn processor() -> (Arc<DeadLetterProcessor>, Arc<StubBus>, Arc<StubKv>) {
        let bus = Arc::new(StubBus::default());
        let kv = Arc::new(StubKv::default());
        let dlq = Arc::new(DeadLetterProcessor::new(bus.clone(), kv.clone()));
        (dlq, bus, kv)
    }

    #[tokio::test]
    async fn dead_letter_events_are_recorded_and_indexed() {
        let (dlq, _bus, kv) = processor();

        dlq.handle(&dead_event("e1")).await.unwrap();

        let stored = kv.entries.lock().unwrap();
        let record: FailedEvent =
            serde_json::from_value(stored["failed_event:e1"].clone()).unwrap();
        assert_eq!(record.status, FailedEventStatus::Pending);
        assert_eq!(record.retries, 3);
        let index: Vec<String> =
            serde_json::from_value(stored[FAILED_EVENTS_INDEX_KEY].clone()).unwrap();
        assert_eq!(index, vec!["e1"]);
    }

    #[tokio::test]
    async fn index_is_bounded_to_the_most_recent_entries() {
        let (dlq, _bus, _kv) = processor();

        for i in 0..(INDEX_LIMIT + 5) {
            dlq.handle(&dead_event(&format!("e{i}"))).await.unwrap();
        }

        let events = dlq.get_failed_events().await.unwrap();
        assert_eq!(events.len(), INDEX_LIMIT);
        assert_eq!(events[0].event_id, "e5");
        assert_eq!(events.last().unwrap().event_id, format!("e{}", INDEX_LIMIT + 4));
    }

    #[tokio::test]
    async fn expired_records_are_skipped_silently() {
        let (dlq, _bus, kv) = processor();
        dlq.handle(&dead_event("e1")).await.unwrap();
        dlq.handle(&dead_event("e2")).await.unwrap();

        // Simulate TTL expiry of one record.
        kv.delete("failed_event:e1").await.unwrap();

        let events = dlq.get_failed_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_id, "e2");
    }

    #[tokio::test]
    async fn retry_republishes_a_fresh_copy_and_marks_the_record() {
        let (dlq, bus, _kv) = processor();
        dlq.handle(&dead_event("e1")).await.unwrap();

        dlq.retry_event("e1").await.unwrap();

        let published = bus.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id, "e1");
        assert_eq!(published[0].retries, 0);
        assert_eq!(published[0].event_type, EventType::AlertCreated);
        drop(published);

        let events = dlq.get_failed_events().await.unwrap();
        assert_eq!(events[0].status, FailedEventStatus::Retried);
        assert!(events[0].processed_at.is_some());

        // Second retry observes the retried record and republishes again;
        // consumers deduplicate by event id.
        dlq.retry_event("e1").await.unwrap();
        assert_eq!(bus.published.lock().unwrap().len(), 2);
        let events = dlq.get_failed_events().await.unwrap();
        assert_eq!(events[0].status, FailedEventStatus::Retried);
    }

    #[tokio::test]
    async fn ignore_marks_the_record_without_republishing() {
        let (dlq, bus, _kv) = processor();
        dlq.handle(&dead_event("e1")).await.unwrap();

        dlq.ignore_event("e1").await.unwrap();

        assert!(bus.published.lock().unwrap().is_empty());
        let events = dlq.get_failed_events().await.unwrap();
        assert_eq!(events[0].status, FailedEventStatus::Ignored);
        assert!(events[0].processed_at.is_some());
    }

    #[tokio::test]
    async fn retrying_an_unknown_event_is_not_found() {
        let (dlq, _bus, _kv) = processor();
        assert!(matches!(
            dlq.retry_event("ghost").await.unwrap_err(),
            VigilError::NotFound
        ));
    }
}
