// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured audit logging of alert lifecycle events.

use async_trait::async_trait;
use tracing::info;

use vigil_core::event::{AlertDeletedPayload, AlertEventPayload};
use vigil_core::VigilError;

use crate::consumer::AlertLifecycleHandler;

/// Logs every alert lifecycle event at info level.
#[derive(Debug, Default)]
pub struct LoggingHandler;

impl LoggingHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AlertLifecycleHandler for LoggingHandler {
    async fn on_created(&self, payload: &AlertEventPayload) -> Result<(), VigilError> {
        info!(
            alert_id = payload.id.as_str(),
            title = payload.title.as_str(),
            severity = %payload.severity,
            source = payload.source.as_str(),
            "alert created"
        );
        Ok(())
    }

    async fn on_acknowledged(&self, payload: &AlertEventPayload) -> Result<(), VigilError> {
        info!(
            alert_id = payload.id.as_str(),
            acknowledged_by = payload.acknowledged_by.as_deref().unwrap_or("unknown"),
            "alert acknowledged"
        );
        Ok(())
    }

    async fn on_resolved(&self, payload: &AlertEventPayload) -> Result<(), VigilError> {
        info!(
            alert_id = payload.id.as_str(),
            resolved_by = payload.resolved_by.as_deref().unwrap_or("unknown"),
            "alert resolved"
        );
        Ok(())
    }

    async fn on_deleted(&self, payload: &AlertDeletedPayload) -> Result<(), VigilError> {
        info!(
            alert_id = payload.id.as_str(),
            deleted_by = payload.deleted_by.as_str(),
            "alert deleted"
        );
        Ok(())
    }

    async fn on_expired(&self, payload: &AlertEventPayload) -> Result<(), VigilError> {
        info!(alert_id = payload.id.as_str(), "alert expired");
        Ok(())
    }
}
