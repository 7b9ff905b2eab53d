// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification sink seam.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::alert::AlertSeverity;
use crate::error::VigilError;

/// A notification to be delivered to an external sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub title: String,
    pub text: String,
    pub severity: AlertSeverity,
    pub alert_id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

/// An external notification sink (webhook, chat, SMS).
///
/// Sinks are wrapped in a circuit breaker before use; `send` failures count
/// against the breaker.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    fn is_enabled(&self) -> bool;

    async fn send(&self, msg: &NotificationMessage) -> Result<(), VigilError>;
}
