// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router assembly and the HTTP server lifecycle.

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use vigil_core::VigilError;
use vigil_hub::Hub;
use vigil_resilience::BreakerRegistry;
use vigil_service::{AlertService, DeadLetterProcessor, EventWorker};

use crate::handlers;
use crate::ws;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AlertService>,
    pub hub: Arc<Hub>,
    pub dlq: Arc<DeadLetterProcessor>,
    pub breakers: Arc<BreakerRegistry>,
    pub event_worker: Arc<EventWorker>,
    /// Renders Prometheus text for `/metrics`; absent when no recorder is
    /// installed.
    pub metrics_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
    pub start_time: Instant,
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/alerts", post(handlers::alerts::create).get(handlers::alerts::list))
        .route("/alerts/statistics", get(handlers::alerts::statistics))
        .route(
            "/alerts/{id}",
            get(handlers::alerts::get_by_id).delete(handlers::alerts::delete),
        )
        .route("/alerts/{id}/acknowledge", post(handlers::alerts::acknowledge))
        .route("/alerts/{id}/resolve", post(handlers::alerts::resolve))
        .route("/admin/failed-events", get(handlers::admin::failed_events))
        .route(
            "/admin/failed-events/{id}/retry",
            post(handlers::admin::retry_failed_event),
        )
        .route(
            "/admin/failed-events/{id}/ignore",
            post(handlers::admin::ignore_failed_event),
        )
        .route("/admin/metrics/events", get(handlers::admin::event_metrics))
        .route("/admin/circuit-breakers", get(handlers::admin::circuit_breakers))
        .route("/webhooks/alertmanager", post(handlers::webhook::alertmanager));

    Router::new()
        .nest("/api/v1", api)
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(handlers::health::health))
        .route("/metrics", get(handlers::health::metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until `cancel` fires, then drain in-flight requests.
pub async fn start_server(
    host: &str,
    port: u16,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), VigilError> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| VigilError::Connection(format!("failed to bind {addr}: {e}")))?;

    info!(addr = addr.as_str(), "gateway listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| VigilError::Internal(format!("server error: {e}")))
}
