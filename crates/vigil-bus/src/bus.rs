// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The stream-backed event bus.
//!
//! Delivery contract: each consumer group sees every event at least once.
//! A consumer loop reads batches with a blocking window, invokes the
//! handler, and always acknowledges afterwards; a handler failure
//! republishes the event with an incremented retry counter until the budget
//! is exhausted, at which point the copy goes to the dead-letter stream.
//! Because retries are republished copies, consumers must be idempotent
//! keyed by `(event.id, event.type)`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use vigil_core::event::{Event, MAX_EVENT_RETRIES, STREAM_DEAD_LETTER};
use vigil_core::{EventHandler, EventPublisher, EventSubscriber, VigilError};
use vigil_metrics::recording;

use crate::store::{StreamEntry, StreamStore};

/// Bus tuning knobs.
#[derive(Debug, Clone)]
pub struct StreamBusConfig {
    /// Per-instance consumer identity within groups.
    pub consumer_id: String,
    /// Maximum entries fetched per blocking read.
    pub read_count: u32,
    /// Blocking read window.
    pub block: Duration,
}

impl Default for StreamBusConfig {
    fn default() -> Self {
        Self {
            consumer_id: "vigil-1".to_string(),
            read_count: 10,
            block: Duration::from_secs(5),
        }
    }
}

/// Event bus over [`StreamStore`] streams.
pub struct StreamBus {
    store: Arc<StreamStore>,
    config: StreamBusConfig,
    stop: CancellationToken,
    consumers: Mutex<Vec<JoinHandle<()>>>,
}

impl StreamBus {
    pub fn new(store: Arc<StreamStore>, config: StreamBusConfig) -> Self {
        Self {
            store,
            config,
            stop: CancellationToken::new(),
            consumers: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &Arc<StreamStore> {
        &self.store
    }

    async fn append_event(
        store: &StreamStore,
        stream: &str,
        event: &Event,
    ) -> Result<(), VigilError> {
        let fields = serde_json::to_string(&event.to_fields())?;
        store.append(stream, fields).await?;
        recording::record_event_published(&event.event_type.to_string(), stream);
        debug!(
            stream,
            event_id = event.id.as_str(),
            event_type = %event.event_type,
            "event published"
        );
        Ok(())
    }

    /// One consumer loop: read a batch, process each entry, repeat until
    /// stopped. The loop exits after its current blocking read window.
    async fn consume(
        store: Arc<StreamStore>,
        stream: String,
        group: String,
        handler: Arc<dyn EventHandler>,
        config: StreamBusConfig,
        stop: CancellationToken,
    ) {
        loop {
            if stop.is_cancelled() {
                return;
            }

            let batch = match store
                .read_group_blocking(
                    &stream,
                    &group,
                    &config.consumer_id,
                    config.read_count,
                    config.block,
                    &stop,
                )
                .await
            {
                Ok(batch) => batch,
                Err(err) => {
                    error!(stream = stream.as_str(), error = %err, "error reading from stream");
                    continue;
                }
            };

            for entry in batch {
                Self::process_entry(&store, &stream, &group, &entry, handler.as_ref()).await;
            }
        }
    }

    /// Handle one claimed entry.
    ///
    /// The entry is always acknowledged afterwards, success or terminal
    /// failure, to prevent infinite redelivery; retries are expressed as
    /// republished copies carrying the updated counter. An unparseable
    /// envelope is acknowledged and dropped: a malformed frame has no
    /// meaningful retry.
    async fn process_entry(
        store: &StreamStore,
        stream: &str,
        group: &str,
        entry: &StreamEntry,
        handler: &dyn EventHandler,
    ) {
        let parsed = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(
            &entry.fields,
        )
        .map_err(VigilError::from)
        .and_then(|fields| Event::from_fields(&fields));

        match parsed {
            Ok(event) => {
                if let Err(err) = handler.handle(&event).await {
                    error!(
                        event_id = event.id.as_str(),
                        event_type = %event.event_type,
                        error = %err,
                        "failed to handle event"
                    );
                    recording::record_event_consumed(&event.event_type.to_string(), "error");
                    Self::handle_failed(store, event).await;
                } else {
                    recording::record_event_consumed(&event.event_type.to_string(), "success");
                }
            }
            Err(err) => {
                error!(seq = entry.seq, error = %err, "failed to parse event envelope");
            }
        }

        if let Err(err) = store.ack(stream, group, entry.seq).await {
            error!(seq = entry.seq, error = %err, "failed to acknowledge stream entry");
        }
    }

    /// Republish a failed event for retry, or move it to the dead-letter
    /// stream once the budget is spent.
    async fn handle_failed(store: &StreamStore, mut event: Event) {
        event.retries += 1;

        if event.retries >= MAX_EVENT_RETRIES {
            if let Err(err) = Self::append_event(store, STREAM_DEAD_LETTER, &event).await {
                error!(
                    event_id = event.id.as_str(),
                    error = %err,
                    "failed to move event to dead letter queue"
                );
                return;
            }
            recording::record_event_dead_lettered(&event.event_type.to_string());
            warn!(
                event_id = event.id.as_str(),
                retries = event.retries,
                "event moved to dead letter queue"
            );
            return;
        }

        let stream = event.event_type.stream();
        if let Err(err) = Self::append_event(store, stream, &event).await {
            error!(
                event_id = event.id.as_str(),
                error = %err,
                "failed to re-publish event for retry"
            );
            return;
        }
        debug!(
            event_id = event.id.as_str(),
            retries = event.retries,
            "event re-published for retry"
        );
    }
}

#[async_trait]
impl EventPublisher for StreamBus {
    async fn publish(&self, event: &Event) -> Result<(), VigilError> {
        self.publish_to_stream(event.event_type.stream(), event).await
    }

    async fn publish_to_stream(&self, stream: &str, event: &Event) -> Result<(), VigilError> {
        Self::append_event(&self.store, stream, event).await
    }
}

#[async_trait]
impl EventSubscriber for StreamBus {
    async fn subscribe(
        &self,
        stream: &str,
        group: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), VigilError> {
        self.store.create_group(stream, group).await?;

        let task = tokio::spawn(Self::consume(
            Arc::clone(&self.store),
            stream.to_string(),
            group.to_string(),
            handler,
            self.config.clone(),
            self.stop.clone(),
        ));
        self.consumers.lock().await.push(task);

        info!(
            stream,
            group,
            consumer = self.config.consumer_id.as_str(),
            "subscribed to stream"
        );
        Ok(())
    }

    async fn unsubscribe(&self) -> Result<(), VigilError> {
        self.stop.cancel();
        let mut consumers = self.consumers.lock().await;
        for task in consumers.drain(..) {
            if let Err(err) = task.await {
                error!(error = %err, "consumer loop panicked during shutdown");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;
    use tokio::sync::Mutex as AsyncMutex;
    use vigil_core::event::{
        AlertDeletedPayload, EventType, GROUP_ALERT_PROCESSORS, STREAM_ALERTS,
    };

    async fn setup() -> (Arc<StreamBus>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bus.db");
        let store = Arc::new(StreamStore::open(path.to_str().unwrap()).await.unwrap());
        let bus = StreamBus::new(
            store,
            StreamBusConfig {
                consumer_id: "test-1".into(),
                read_count: 10,
                block: Duration::from_millis(100),
            },
        );
        (Arc::new(bus), dir)
    }

    fn sample_event() -> Event {
        Event::new(
            EventType::AlertDeleted,
            &AlertDeletedPayload {
                id: "a1".into(),
                deleted_at: chrono::Utc::now(),
                deleted_by: "admin".into(),
            },
        )
        .unwrap()
    }

    struct Recorder {
        seen: AsyncMutex<Vec<Event>>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, event: &Event) -> Result<(), VigilError> {
            self.seen.lock().await.push(event.clone());
            Ok(())
        }
    }

    struct AlwaysFails {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EventHandler for AlwaysFails {
        async fn handle(&self, _event: &Event) -> Result<(), VigilError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(VigilError::Internal("handler rejects everything".into()))
        }
    }

    async fn wait_until(mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn publish_routes_alert_events_to_the_alerts_stream() {
        let (bus, _dir) = setup().await;
        bus.publish(&sample_event()).await.unwrap();
        assert_eq!(bus.store().stream_len(STREAM_ALERTS).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let (bus, _dir) = setup().await;
        let recorder = Arc::new(Recorder {
            seen: AsyncMutex::new(Vec::new()),
        });
        bus.subscribe(STREAM_ALERTS, GROUP_ALERT_PROCESSORS, recorder.clone())
            .await
            .unwrap();

        let event = sample_event();
        bus.publish(&event).await.unwrap();

        let r = recorder.clone();
        wait_until(move || r.seen.try_lock().map(|s| s.len() == 1).unwrap_or(false)).await;

        let seen = recorder.seen.lock().await;
        assert_eq!(seen[0].id, event.id);
        assert_eq!(seen[0].event_type, EventType::AlertDeleted);

        drop(seen);
        bus.unsubscribe().await.unwrap();
    }

    #[tokio::test]
    async fn failing_handler_sends_event_to_dead_letter_after_three_retries() {
        let (bus, _dir) = setup().await;
        let handler = Arc::new(AlwaysFails {
            calls: AtomicUsize::new(0),
        });
        bus.subscribe(STREAM_ALERTS, GROUP_ALERT_PROCESSORS, handler.clone())
            .await
            .unwrap();

        bus.publish(&sample_event()).await.unwrap();

        let mut dead = 0;
        for _ in 0..200 {
            dead = bus.store().stream_len(STREAM_DEAD_LETTER).await.unwrap();
            if dead >= 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        assert_eq!(dead, 1, "event should reach the dead-letter stream");

        // The handler ran for the original delivery and two republished
        // retries before dead-lettering.
        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);

        // The dead-lettered copy carries the exhausted retry counter.
        bus.store()
            .create_group(STREAM_DEAD_LETTER, "inspect")
            .await
            .unwrap();
        let batch = bus
            .store()
            .read_group(STREAM_DEAD_LETTER, "inspect", "t", 10)
            .await
            .unwrap();
        assert_eq!(batch.len(), 1);
        let fields: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&batch[0].fields).unwrap();
        let event = Event::from_fields(&fields).unwrap();
        assert_eq!(event.retries, MAX_EVENT_RETRIES);

        bus.unsubscribe().await.unwrap();
    }

    #[tokio::test]
    async fn malformed_frames_are_acked_and_dropped() {
        let (bus, _dir) = setup().await;
        let recorder = Arc::new(Recorder {
            seen: AsyncMutex::new(Vec::new()),
        });
        bus.subscribe(STREAM_ALERTS, GROUP_ALERT_PROCESSORS, recorder.clone())
            .await
            .unwrap();

        // Malformed envelope straight onto the stream, then a valid event.
        bus.store()
            .append(STREAM_ALERTS, "not json".into())
            .await
            .unwrap();
        let event = sample_event();
        bus.publish(&event).await.unwrap();

        let r = recorder.clone();
        wait_until(move || r.seen.try_lock().map(|s| s.len() == 1).unwrap_or(false)).await;
        // Give the loop a moment to acknowledge the processed entries.
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Only the valid event reached the handler; the malformed frame was
        // acked, not dead-lettered.
        assert_eq!(bus.store().stream_len(STREAM_DEAD_LETTER).await.unwrap(), 0);
        assert_eq!(
            bus.store()
                .pending_count(STREAM_ALERTS, GROUP_ALERT_PROCESSORS)
                .await
                .unwrap(),
            0
        );

        bus.unsubscribe().await.unwrap();
    }

    #[tokio::test]
    async fn unsubscribe_drains_consumer_loops() {
        let (bus, _dir) = setup().await;
        let recorder = Arc::new(Recorder {
            seen: AsyncMutex::new(Vec::new()),
        });
        bus.subscribe(STREAM_ALERTS, GROUP_ALERT_PROCESSORS, recorder)
            .await
            .unwrap();

        // Must return promptly (consumer loops exit after their read window).
        tokio::time::timeout(Duration::from_secs(5), bus.unsubscribe())
            .await
            .expect("unsubscribe timed out")
            .unwrap();
    }
}
