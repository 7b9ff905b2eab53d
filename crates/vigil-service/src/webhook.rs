// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON webhook notification sink.

use async_trait::async_trait;
use tracing::debug;

use vigil_core::{NotificationMessage, Notifier, VigilError};

/// Posts notifications as JSON to a configured webhook URL.
///
/// Disabled (and skipped by the notification service) when no URL is
/// configured.
pub struct WebhookNotifier {
    url: Option<String>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: Option<String>) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    async fn send(&self, msg: &NotificationMessage) -> Result<(), VigilError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| VigilError::Notification("webhook URL not configured".into()))?;

        let response = self
            .client
            .post(url)
            .json(msg)
            .send()
            .await
            .map_err(|e| VigilError::Notification(format!("webhook request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(VigilError::Notification(format!(
                "webhook returned status {}",
                response.status()
            )));
        }

        debug!(alert_id = msg.alert_id.as_str(), "webhook notification sent");
        Ok(())
    }
}
