// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unauthenticated health and metrics endpoints.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::server::AppState;

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "connected_clients": state.hub.client_count(),
    }))
}

/// `GET /metrics` (Prometheus text format)
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics_render {
        Some(render) => render(),
        None => String::new(),
    }
}
