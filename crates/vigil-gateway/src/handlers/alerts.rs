// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alert lifecycle endpoints.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use vigil_core::VigilError;
use vigil_service::{CreateAlertInput, ListInput};

use crate::dto::{CreateAlertRequest, ListAlertsQuery};
use crate::error::ApiError;
use crate::server::AppState;

/// Actor attribution comes from the `X-User-Id` header; authentication is
/// the front proxy's concern.
fn actor_id(headers: &HeaderMap) -> Result<Uuid, VigilError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| VigilError::Validation("X-User-Id header is required".into()))?;
    Uuid::parse_str(raw).map_err(|_| VigilError::Validation("invalid X-User-Id header".into()))
}

fn optional_actor_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

/// `POST /api/v1/alerts`
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateAlertRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let severity = request.severity()?;
    let alert = state
        .service
        .create(CreateAlertInput {
            title: request.title,
            message: request.message,
            severity: Some(severity),
            source: request.source,
            metadata: request.metadata,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(alert)))
}

/// `GET /api/v1/alerts`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListAlertsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .service
        .list(ListInput {
            filter: query.filter()?,
            pagination: Some(query.pagination()),
        })
        .await?;

    Ok(Json(result))
}

/// `GET /api/v1/alerts/{id}`
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let alert = state.service.get_by_id(id).await?;
    Ok(Json(alert))
}

/// `POST /api/v1/alerts/{id}/acknowledge`
pub async fn acknowledge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = actor_id(&headers)?;
    let alert = state.service.acknowledge(id, user_id).await?;
    Ok(Json(alert))
}

/// `POST /api/v1/alerts/{id}/resolve`
pub async fn resolve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = actor_id(&headers)?;
    let alert = state.service.resolve(id, user_id).await?;
    Ok(Json(alert))
}

/// `DELETE /api/v1/alerts/{id}`
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state
        .service
        .delete(id, optional_actor_id(&headers))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/alerts/statistics`
pub async fn statistics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.service.get_statistics().await?;
    Ok(Json(stats))
}
