// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background workers: the event worker wiring consumers to the bus, and
//! the expiration sweeper.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use vigil_core::event::{GROUP_ALERT_PROCESSORS, STREAM_ALERTS};
use vigil_core::{EventBus, EventSubscriber, VigilError};

use crate::consumer::AlertConsumer;
use crate::handlers::{EventMetricsHandler, LoggingHandler, NotificationHandler};
use crate::notification::NotificationService;
use crate::service::AlertService;

/// Subscribes the alert consumer group and its handlers to the bus.
pub struct EventWorker {
    bus: Arc<dyn EventBus>,
    notifications: Option<Arc<NotificationService>>,
    metrics: Arc<EventMetricsHandler>,
    started: AtomicBool,
}

impl EventWorker {
    pub fn new(bus: Arc<dyn EventBus>, notifications: Option<Arc<NotificationService>>) -> Self {
        Self {
            bus,
            notifications,
            metrics: Arc::new(EventMetricsHandler::new()),
            started: AtomicBool::new(false),
        }
    }

    pub async fn start(&self) -> Result<(), VigilError> {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("event worker already started");
            return Ok(());
        }
        info!("starting event worker");

        let mut consumer = AlertConsumer::new();
        consumer.register_handler(Arc::new(LoggingHandler::new()));
        consumer.register_handler(self.metrics.clone());
        if let Some(notifications) = &self.notifications {
            consumer.register_handler(Arc::new(NotificationHandler::new(notifications.clone())));
        }

        self.bus
            .subscribe(STREAM_ALERTS, GROUP_ALERT_PROCESSORS, Arc::new(consumer))
            .await?;

        info!("event worker started");
        Ok(())
    }

    /// Idempotent; the underlying unsubscribe drains all consumer loops.
    pub async fn stop(&self) -> Result<(), VigilError> {
        if !self.started.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        info!("stopping event worker");
        self.bus.unsubscribe().await?;
        info!("event worker stopped");
        Ok(())
    }

    /// Snapshot of the event counters for the admin surface.
    pub fn metrics(&self) -> std::collections::BTreeMap<String, i64> {
        self.metrics.snapshot()
    }
}

/// Periodically expires active alerts whose `expires_at` has lapsed.
pub struct ExpirationSweeper {
    service: Arc<AlertService>,
    interval: Duration,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ExpirationSweeper {
    pub fn new(service: Arc<AlertService>, interval: Duration) -> Self {
        Self {
            service,
            interval,
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    pub async fn start(&self) -> Result<(), VigilError> {
        let mut task = self.task.lock().await;
        if task.is_some() {
            warn!("expiration sweeper already started");
            return Ok(());
        }

        let service = self.service.clone();
        let interval = self.interval;
        let cancel = self.cancel.clone();

        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // skip the immediate first tick
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match service.expire_lapsed().await {
                            Ok(0) => {}
                            Ok(count) => info!(count, "expired lapsed alerts"),
                            Err(err) => error!(error = %err, "expiration sweep failed"),
                        }
                    }
                    _ = cancel.cancelled() => break,
                }
            }
        }));

        info!(interval_secs = self.interval.as_secs(), "expiration sweeper started");
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), VigilError> {
        self.cancel.cancel();
        if let Some(task) = self.task.lock().await.take() {
            if let Err(err) = task.await {
                error!(error = %err, "expiration sweeper task panicked");
            }
            info!("expiration sweeper stopped");
        }
        Ok(())
    }
}
