// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain events and their wire framing.
//!
//! Each event travels on a stream as a flat map of string-keyed fields
//! `{id, type, payload, timestamp, version, retries}`. The payload is an
//! opaque JSON document; the bus never inspects it. Numeric fields are
//! parsed tolerantly from either JSON numbers or decimal strings.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::alert::{Alert, AlertSeverity, AlertStatus};
use crate::error::VigilError;

/// Stream names.
pub const STREAM_ALERTS: &str = "alerts";
pub const STREAM_NOTIFICATIONS: &str = "notifications";
pub const STREAM_DEAD_LETTER: &str = "dead-letter";

/// Consumer group names.
pub const GROUP_ALERT_PROCESSORS: &str = "alert-processors";
pub const GROUP_NOTIFICATION_SENDERS: &str = "notification-senders";
pub const GROUP_DEAD_LETTER_PROCESSORS: &str = "dead-letter-processors";

/// Maximum redeliveries of an event before it is dead-lettered.
pub const MAX_EVENT_RETRIES: i64 = 3;

/// The closed set of domain event types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum EventType {
    #[strum(serialize = "alert.created")]
    #[serde(rename = "alert.created")]
    AlertCreated,
    #[strum(serialize = "alert.acknowledged")]
    #[serde(rename = "alert.acknowledged")]
    AlertAcknowledged,
    #[strum(serialize = "alert.resolved")]
    #[serde(rename = "alert.resolved")]
    AlertResolved,
    #[strum(serialize = "alert.deleted")]
    #[serde(rename = "alert.deleted")]
    AlertDeleted,
    #[strum(serialize = "alert.expired")]
    #[serde(rename = "alert.expired")]
    AlertExpired,
    #[strum(serialize = "user.created")]
    #[serde(rename = "user.created")]
    UserCreated,
    #[strum(serialize = "user.updated")]
    #[serde(rename = "user.updated")]
    UserUpdated,
}

impl EventType {
    /// The default stream an event of this type routes to.
    pub fn stream(self) -> &'static str {
        match self {
            EventType::AlertCreated
            | EventType::AlertAcknowledged
            | EventType::AlertResolved
            | EventType::AlertDeleted
            | EventType::AlertExpired => STREAM_ALERTS,
            EventType::UserCreated | EventType::UserUpdated => STREAM_NOTIFICATIONS,
        }
    }
}

/// A domain event as carried on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Serialized JSON payload; opaque to the bus.
    pub payload: String,
    pub timestamp: DateTime<Utc>,
    pub version: i64,
    pub retries: i64,
}

impl Event {
    /// Create a new event with a fresh id, version 1, and zero retries.
    pub fn new<P: Serialize>(event_type: EventType, payload: &P) -> Result<Self, VigilError> {
        Ok(Event {
            id: Uuid::new_v4().to_string(),
            event_type,
            payload: serde_json::to_string(payload)?,
            timestamp: Utc::now(),
            version: 1,
            retries: 0,
        })
    }

    /// Deserialize the payload into a concrete type.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, VigilError> {
        Ok(serde_json::from_str(&self.payload)?)
    }

    /// Serialize the event into its flat wire framing.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("id".into(), Value::String(self.id.clone()));
        fields.insert("type".into(), Value::String(self.event_type.to_string()));
        fields.insert("payload".into(), Value::String(self.payload.clone()));
        fields.insert(
            "timestamp".into(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        );
        fields.insert("version".into(), Value::from(self.version));
        fields.insert("retries".into(), Value::from(self.retries));
        fields
    }

    /// Parse an event from its flat wire framing.
    ///
    /// `version` and `retries` may arrive as JSON numbers or decimal strings
    /// and default to 1 and 0 respectively when absent or malformed. A
    /// missing or malformed `id`, `type`, `payload`, or `timestamp` is a
    /// fatal framing error.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, VigilError> {
        let id = required_str(fields, "id")?;
        let type_str = required_str(fields, "type")?;
        let event_type: EventType = type_str
            .parse()
            .map_err(|_| VigilError::InvalidData(format!("unknown event type: {type_str}")))?;
        let payload = required_str(fields, "payload")?;
        let ts_str = required_str(fields, "timestamp")?;
        let timestamp = DateTime::parse_from_rfc3339(&ts_str)
            .map_err(|e| VigilError::InvalidData(format!("bad event timestamp: {e}")))?
            .with_timezone(&Utc);

        Ok(Event {
            id,
            event_type,
            payload,
            timestamp,
            version: lenient_int(fields.get("version")).unwrap_or(1),
            retries: lenient_int(fields.get("retries")).unwrap_or(0),
        })
    }
}

fn required_str(fields: &Map<String, Value>, key: &str) -> Result<String, VigilError> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| VigilError::InvalidData(format!("event field '{key}' missing")))
}

fn lenient_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Payload carried by `alert.*` lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEventPayload {
    pub id: String,
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "std::collections::HashMap::is_empty")]
    pub metadata: std::collections::HashMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Alert> for AlertEventPayload {
    fn from(alert: &Alert) -> Self {
        AlertEventPayload {
            id: alert.id.to_string(),
            title: alert.title.clone(),
            message: alert.message.clone(),
            severity: alert.severity,
            status: alert.status,
            source: alert.source.clone(),
            metadata: alert.metadata.clone(),
            acknowledged_by: alert.acknowledged_by.map(|u| u.to_string()),
            acknowledged_at: alert.acknowledged_at,
            resolved_by: alert.resolved_by.map(|u| u.to_string()),
            resolved_at: alert.resolved_at,
            created_at: alert.created_at,
        }
    }
}

/// Payload carried by `alert.deleted` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertDeletedPayload {
    pub id: String,
    pub deleted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deleted_by: String,
}

/// Payload carried by `user.*` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEventPayload {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_event_has_version_one_and_no_retries() {
        let payload = AlertDeletedPayload {
            id: "a1".into(),
            deleted_at: Utc::now(),
            deleted_by: String::new(),
        };
        let event = Event::new(EventType::AlertDeleted, &payload).unwrap();
        assert_eq!(event.version, 1);
        assert_eq!(event.retries, 0);
        assert!(!event.id.is_empty());
    }

    #[test]
    fn fields_round_trip() {
        let alert = Alert::new("t", "m", AlertSeverity::Critical, "db").unwrap();
        let event = Event::new(EventType::AlertCreated, &AlertEventPayload::from(&alert)).unwrap();

        let parsed = Event::from_fields(&event.to_fields()).unwrap();
        assert_eq!(parsed, event);

        let payload: AlertEventPayload = parsed.payload_as().unwrap();
        assert_eq!(payload.title, "t");
        assert_eq!(payload.severity, AlertSeverity::Critical);
    }

    #[test]
    fn numeric_fields_parse_from_strings() {
        let mut fields = Map::new();
        fields.insert("id".into(), Value::String("e1".into()));
        fields.insert("type".into(), Value::String("alert.created".into()));
        fields.insert("payload".into(), Value::String("{}".into()));
        fields.insert(
            "timestamp".into(),
            Value::String("2026-03-01T12:00:00.000000000Z".into()),
        );
        fields.insert("version".into(), Value::String("2".into()));
        fields.insert("retries".into(), Value::String("1".into()));

        let event = Event::from_fields(&fields).unwrap();
        assert_eq!(event.version, 2);
        assert_eq!(event.retries, 1);
    }

    #[test]
    fn numeric_fields_default_when_absent() {
        let mut fields = Map::new();
        fields.insert("id".into(), Value::String("e1".into()));
        fields.insert("type".into(), Value::String("alert.resolved".into()));
        fields.insert("payload".into(), Value::String("{}".into()));
        fields.insert(
            "timestamp".into(),
            Value::String("2026-03-01T12:00:00Z".into()),
        );

        let event = Event::from_fields(&fields).unwrap();
        assert_eq!(event.version, 1);
        assert_eq!(event.retries, 0);
    }

    #[test]
    fn missing_type_is_a_framing_error() {
        let mut fields = Map::new();
        fields.insert("id".into(), Value::String("e1".into()));
        assert!(Event::from_fields(&fields).is_err());
    }

    #[test]
    fn unknown_type_is_a_framing_error() {
        let mut fields = Map::new();
        fields.insert("id".into(), Value::String("e1".into()));
        fields.insert("type".into(), Value::String("alert.vanished".into()));
        fields.insert("payload".into(), Value::String("{}".into()));
        fields.insert(
            "timestamp".into(),
            Value::String("2026-03-01T12:00:00Z".into()),
        );
        assert!(Event::from_fields(&fields).is_err());
    }

    #[test]
    fn alert_events_route_to_alerts_stream() {
        assert_eq!(EventType::AlertCreated.stream(), STREAM_ALERTS);
        assert_eq!(EventType::AlertExpired.stream(), STREAM_ALERTS);
        assert_eq!(EventType::UserCreated.stream(), STREAM_NOTIFICATIONS);
    }
}
