// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes alert lifecycle events to the notification plane.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use vigil_core::event::{AlertDeletedPayload, AlertEventPayload};
use vigil_core::{NotificationMessage, VigilError};

use crate::consumer::AlertLifecycleHandler;
use crate::notification::NotificationService;

/// Sends notifications for alert lifecycle events.
pub struct NotificationHandler {
    service: Arc<NotificationService>,
}

impl NotificationHandler {
    pub fn new(service: Arc<NotificationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AlertLifecycleHandler for NotificationHandler {
    async fn on_created(&self, payload: &AlertEventPayload) -> Result<(), VigilError> {
        self.service
            .notify(&NotificationMessage {
                title: format!("New alert: {}", payload.title),
                text: payload.message.clone(),
                severity: payload.severity,
                alert_id: payload.id.clone(),
                source: payload.source.clone(),
                fields: BTreeMap::new(),
            })
            .await
    }

    async fn on_acknowledged(&self, payload: &AlertEventPayload) -> Result<(), VigilError> {
        let acknowledged_by = payload
            .acknowledged_by
            .clone()
            .unwrap_or_else(|| "unknown".into());

        self.service
            .notify(&NotificationMessage {
                title: format!("Alert acknowledged: {}", payload.title),
                text: "Alert has been acknowledged".into(),
                severity: payload.severity,
                alert_id: payload.id.clone(),
                source: payload.source.clone(),
                fields: BTreeMap::from([("acknowledged_by".into(), acknowledged_by)]),
            })
            .await
    }

    async fn on_resolved(&self, payload: &AlertEventPayload) -> Result<(), VigilError> {
        let resolved_by = payload
            .resolved_by
            .clone()
            .unwrap_or_else(|| "unknown".into());

        self.service
            .notify(&NotificationMessage {
                title: format!("Alert resolved: {}", payload.title),
                text: "Alert has been resolved".into(),
                severity: payload.severity,
                alert_id: payload.id.clone(),
                source: payload.source.clone(),
                fields: BTreeMap::from([("resolved_by".into(), resolved_by)]),
            })
            .await
    }

    async fn on_deleted(&self, _payload: &AlertDeletedPayload) -> Result<(), VigilError> {
        // Deletions are administrative; no notification.
        Ok(())
    }

    async fn on_expired(&self, payload: &AlertEventPayload) -> Result<(), VigilError> {
        self.service
            .notify(&NotificationMessage {
                title: format!("Alert expired: {}", payload.title),
                text: "Alert has expired without resolution".into(),
                severity: payload.severity,
                alert_id: payload.id.clone(),
                source: payload.source.clone(),
                fields: BTreeMap::new(),
            })
            .await
    }
}
