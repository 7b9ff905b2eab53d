// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vigil serve` command implementation.
//!
//! Wires the full pipeline: SQLite store, stream bus, in-process KV, hub,
//! alert service, workers, and the gateway. Resources are acquired in
//! dependency order and released in reverse on shutdown; the drain budget
//! comes from `server.shutdown_timeout_secs`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use vigil_bus::{RetryingBus, StreamBus, StreamBusConfig, StreamStore};
use vigil_cache::MemoryKv;
use vigil_config::VigilConfig;
use vigil_core::{AlertSeverity, Notifier, VigilError};
use vigil_gateway::AppState;
use vigil_hub::{Hub, HubBroadcaster};
use vigil_metrics::PrometheusMetrics;
use vigil_resilience::{BreakerDefaults, BreakerRegistry, RetryPolicy};
use vigil_service::{
    AlertEventProducer, AlertService, DeadLetterProcessor, EventWorker, ExpirationSweeper,
    NotificationService, ResilientNotifier, WebhookNotifier,
};
use vigil_storage::{Database, SqliteAlertStore};

use crate::shutdown;

/// Runs the `vigil serve` command.
pub async fn run_serve(config: VigilConfig) -> Result<(), VigilError> {
    init_tracing(&config.log.level);
    info!("starting vigil serve");

    // Prometheus recorder; the service runs fine without it.
    let prometheus = match PrometheusMetrics::install() {
        Ok(prometheus) => Some(Arc::new(prometheus)),
        Err(err) => {
            warn!(error = err.as_str(), "prometheus initialization failed, continuing without metrics");
            None
        }
    };

    // Storage.
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    let store = Arc::new(SqliteAlertStore::new(db.clone()));
    info!(path = config.storage.database_path.as_str(), "alert store ready");

    // Event bus over its own connection to the same database file.
    let stream_store = Arc::new(StreamStore::open(&config.storage.database_path).await?);
    let bus = Arc::new(StreamBus::new(
        stream_store,
        StreamBusConfig {
            consumer_id: config.bus.consumer_id.clone(),
            read_count: config.bus.read_count,
            block: Duration::from_secs(config.bus.block_secs),
        },
    ));

    // In-process KV with its sweeper.
    let kv = Arc::new(MemoryKv::new());
    let cancel = shutdown::install_signal_handler();
    {
        let kv = kv.clone();
        let sweep_cancel = cancel.clone();
        let interval = Duration::from_secs(config.cache.sweep_interval_secs);
        tokio::spawn(async move { kv.run_sweeper(interval, sweep_cancel).await });
    }

    // Circuit breakers for notification sinks.
    let breakers = Arc::new(BreakerRegistry::new(BreakerDefaults {
        max_failures: config.breaker.max_failures,
        timeout: Duration::from_secs(config.breaker.timeout_secs),
        half_open_requests: config.breaker.half_open_requests,
    }));

    // Notification plane: each sink goes through its breaker.
    let min_severity = AlertSeverity::from_str(&config.notifications.min_severity)
        .map_err(|_| {
            VigilError::Config(format!(
                "invalid notifications.min_severity: {}",
                config.notifications.min_severity
            ))
        })?;
    let webhook: Arc<dyn Notifier> =
        Arc::new(WebhookNotifier::new(config.notifications.webhook_url.clone()));
    let resilient: Arc<dyn Notifier> = Arc::new(ResilientNotifier::new(
        webhook,
        breakers.get("webhook"),
    ));
    let notifications = Arc::new(NotificationService::new(
        vec![resilient],
        min_severity,
        config.notifications.rate_limit_per_minute,
    ));

    // Hub coordinator.
    let hub = Arc::new(Hub::new());
    {
        let hub = hub.clone();
        let hub_cancel = cancel.clone();
        tokio::spawn(async move { hub.run(hub_cancel).await });
    }

    // Alert service with the retrying publish path.
    let retrying_bus = Arc::new(RetryingBus::new(
        bus.clone(),
        RetryPolicy {
            max_retries: config.retry.max_retries,
            initial_backoff: Duration::from_millis(config.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.retry.max_backoff_ms),
            multiplier: config.retry.multiplier,
            jitter: config.retry.jitter,
        },
        cancel.clone(),
    ));
    let service = Arc::new(AlertService::new(
        store,
        kv.clone(),
        Arc::new(HubBroadcaster::new(hub.clone())),
        AlertEventProducer::new(retrying_bus),
        Duration::from_secs(config.cache.stats_ttl_secs),
    ));

    // Downstream consumers and workers.
    let event_worker = Arc::new(EventWorker::new(bus.clone(), Some(notifications)));
    event_worker.start().await?;

    let dlq = Arc::new(DeadLetterProcessor::new(bus.clone(), kv.clone()));
    dlq.start().await?;

    let sweeper = Arc::new(ExpirationSweeper::new(
        service.clone(),
        Duration::from_secs(config.expiration.sweep_interval_secs),
    ));
    sweeper.start().await?;

    // Gateway.
    let metrics_render = prometheus.as_ref().map(|prometheus| {
        let handle = prometheus.handle().clone();
        Arc::new(move || handle.render()) as Arc<dyn Fn() -> String + Send + Sync>
    });
    let state = AppState {
        service,
        hub,
        dlq: dlq.clone(),
        breakers,
        event_worker: event_worker.clone(),
        metrics_render,
        start_time: std::time::Instant::now(),
    };

    let server = vigil_gateway::start_server(
        &config.server.host,
        config.server.port,
        state,
        cancel.clone(),
    );

    let result = server.await;
    if let Err(err) = &result {
        error!(error = %err, "gateway exited with error");
    }

    // Shutdown in reverse acquisition order, bounded by the drain budget.
    let drain = Duration::from_secs(config.server.shutdown_timeout_secs);
    if tokio::time::timeout(drain, shutdown_pipeline(&sweeper, &dlq, &event_worker, &db))
        .await
        .is_err()
    {
        warn!(budget_secs = drain.as_secs(), "shutdown budget exceeded, exiting anyway");
    }

    info!("vigil serve shutdown complete");
    result
}

async fn shutdown_pipeline(
    sweeper: &ExpirationSweeper,
    dlq: &DeadLetterProcessor,
    event_worker: &EventWorker,
    db: &Database,
) {
    if let Err(err) = sweeper.stop().await {
        error!(error = %err, "error stopping expiration sweeper");
    }
    if let Err(err) = dlq.stop().await {
        error!(error = %err, "error stopping dead letter processor");
    }
    // Unsubscribes every consumer loop on the bus, the DLQ's included.
    if let Err(err) = event_worker.stop().await {
        error!(error = %err, "error stopping event worker");
    }
    if let Err(err) = db.close().await {
        error!(error = %err, "error closing alert store");
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vigil={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
