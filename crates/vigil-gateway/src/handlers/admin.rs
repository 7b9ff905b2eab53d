// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin endpoints over the dead-letter queue, event metrics, and circuit
//! breakers. Role enforcement lives in the front proxy.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::ApiError;
use crate::server::AppState;

/// `GET /api/v1/admin/failed-events`
pub async fn failed_events(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let events = state.dlq.get_failed_events().await?;
    Ok(Json(events))
}

/// `POST /api/v1/admin/failed-events/{id}/retry`
pub async fn retry_failed_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.dlq.retry_event(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/v1/admin/failed-events/{id}/ignore`
pub async fn ignore_failed_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.dlq.ignore_event(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/admin/metrics/events`
pub async fn event_metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.event_worker.metrics())
}

/// `GET /api/v1/admin/circuit-breakers`
pub async fn circuit_breakers(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.breakers.stats())
}
