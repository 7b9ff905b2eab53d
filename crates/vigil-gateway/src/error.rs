// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps domain errors onto HTTP responses.
//!
//! Validation maps to 422, lifecycle conflicts to 409, missing resources to
//! 404; everything else becomes a 500 carrying a request id and no internal
//! detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use vigil_core::VigilError;

/// JSON error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Wrapper giving [`VigilError`] an HTTP rendering.
pub struct ApiError(pub VigilError);

impl From<VigilError> for ApiError {
    fn from(err: VigilError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, request_id) = match &self.0 {
            VigilError::InvalidAlert(_)
            | VigilError::InvalidRule(_)
            | VigilError::InvalidEmail(_)
            | VigilError::InvalidPassword(_)
            | VigilError::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                self.0.to_string(),
                None,
            ),
            VigilError::Lifecycle(_) => (
                StatusCode::CONFLICT,
                "lifecycle_conflict",
                self.0.to_string(),
                None,
            ),
            VigilError::AlertNotFound | VigilError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                self.0.to_string(),
                None,
            ),
            VigilError::DuplicateKey => (
                StatusCode::CONFLICT,
                "duplicate",
                self.0.to_string(),
                None,
            ),
            other => {
                let request_id = Uuid::new_v4().to_string();
                error!(request_id = request_id.as_str(), error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_string(),
                    Some(request_id),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail {
                    code,
                    message,
                    request_id,
                },
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::LifecycleError;

    fn status_of(err: VigilError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn validation_maps_to_422() {
        assert_eq!(
            status_of(VigilError::Validation("bad".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn lifecycle_conflicts_map_to_409() {
        assert_eq!(
            status_of(VigilError::Lifecycle(LifecycleError::AlreadyAcknowledged)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(VigilError::Lifecycle(LifecycleError::AlreadyResolved)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn missing_resources_map_to_404() {
        assert_eq!(status_of(VigilError::AlertNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(VigilError::NotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn everything_else_is_an_opaque_500() {
        let response = ApiError(VigilError::Connection("secret dsn".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
