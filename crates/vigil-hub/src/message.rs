// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket message envelope.
//!
//! All frames carry `{type, channel?, payload?, timestamp}`. Clients send
//! `ping`, `subscribe`, and `unsubscribe`; the server emits lifecycle
//! events, control echoes, and errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vigil_core::alert::{Alert, AlertStatistics};

/// Message types exchanged over a hub connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    // Client -> server
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "subscribe")]
    Subscribe,
    #[serde(rename = "unsubscribe")]
    Unsubscribe,

    // Server -> client
    #[serde(rename = "pong")]
    Pong,
    #[serde(rename = "subscribed")]
    Subscribed,
    #[serde(rename = "unsubscribed")]
    Unsubscribed,
    #[serde(rename = "error")]
    Error,

    // Alert lifecycle events
    #[serde(rename = "alert.created")]
    AlertCreated,
    #[serde(rename = "alert.updated")]
    AlertUpdated,
    #[serde(rename = "alert.acknowledged")]
    AlertAcknowledged,
    #[serde(rename = "alert.resolved")]
    AlertResolved,
    #[serde(rename = "alert.deleted")]
    AlertDeleted,

    // Statistics
    #[serde(rename = "stats.update")]
    StatsUpdate,

    /// Anything this server version does not understand.
    #[serde(other)]
    Unknown,
}

/// A WebSocket frame body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl WsMessage {
    fn now(message_type: MessageType) -> Self {
        WsMessage {
            message_type,
            channel: None,
            payload: None,
            timestamp: Utc::now(),
        }
    }

    pub fn pong() -> Self {
        Self::now(MessageType::Pong)
    }

    pub fn subscribed(channel: Option<String>) -> Self {
        WsMessage {
            channel,
            ..Self::now(MessageType::Subscribed)
        }
    }

    pub fn unsubscribed(channel: Option<String>) -> Self {
        WsMessage {
            channel,
            ..Self::now(MessageType::Unsubscribed)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        WsMessage {
            payload: Some(serde_json::json!({ "error": message.into() })),
            ..Self::now(MessageType::Error)
        }
    }

    pub fn alert_created(alert: &Alert) -> Self {
        Self::with_alert(MessageType::AlertCreated, alert)
    }

    pub fn alert_updated(alert: &Alert) -> Self {
        Self::with_alert(MessageType::AlertUpdated, alert)
    }

    pub fn alert_acknowledged(alert: &Alert) -> Self {
        Self::with_alert(MessageType::AlertAcknowledged, alert)
    }

    pub fn alert_resolved(alert: &Alert) -> Self {
        Self::with_alert(MessageType::AlertResolved, alert)
    }

    pub fn alert_deleted(alert_id: Uuid) -> Self {
        WsMessage {
            payload: Some(serde_json::json!({ "id": alert_id.to_string() })),
            ..Self::now(MessageType::AlertDeleted)
        }
    }

    pub fn stats_update(stats: &AlertStatistics) -> Self {
        WsMessage {
            payload: serde_json::to_value(stats).ok(),
            ..Self::now(MessageType::StatsUpdate)
        }
    }

    fn with_alert(message_type: MessageType, alert: &Alert) -> Self {
        WsMessage {
            payload: serde_json::to_value(alert).ok(),
            ..Self::now(message_type)
        }
    }
}
