// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable alert storage.

use async_trait::async_trait;
use uuid::Uuid;

use crate::alert::{Alert, AlertStatistics, AlertStatus};
use crate::error::VigilError;
use crate::valueobject::{AlertFilter, PaginatedResult, Pagination};

/// Authoritative storage for alert records.
///
/// `update` is a full-row replacement keyed by id and fails with
/// [`VigilError::NotFound`] when no row was affected; callers rely on that
/// to detect concurrent deletion.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn create(&self, alert: &Alert) -> Result<(), VigilError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Alert, VigilError>;

    async fn update(&self, alert: &Alert) -> Result<(), VigilError>;

    async fn delete(&self, id: Uuid) -> Result<(), VigilError>;

    /// Paginated listing ordered by `created_at` descending. The total count
    /// is computed over the same filter.
    async fn list(
        &self,
        filter: &AlertFilter,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Alert>, VigilError>;

    /// All active alerts, ordered by severity then recency.
    async fn list_active(&self) -> Result<Vec<Alert>, VigilError>;

    /// Active alerts whose `expires_at` has already passed.
    async fn list_expired(&self) -> Result<Vec<Alert>, VigilError>;

    async fn count(&self) -> Result<i64, VigilError>;

    async fn count_by_status(&self, status: AlertStatus) -> Result<i64, VigilError>;

    async fn get_statistics(&self) -> Result<AlertStatistics, VigilError>;
}
