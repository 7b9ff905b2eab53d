// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AlertManager-style webhook intake.
//!
//! Only entries with `status = "firing"` create alerts; resolved
//! notifications are logged and dropped.

use std::collections::HashMap;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info};

use vigil_core::alert::AlertSeverity;
use vigil_service::CreateAlertInput;

use crate::server::AppState;

/// Webhook payload from AlertManager.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlertManagerWebhook {
    pub version: String,
    #[serde(rename = "groupKey")]
    pub group_key: String,
    #[serde(rename = "truncatedAlerts")]
    pub truncated_alerts: i64,
    pub status: String,
    pub receiver: String,
    #[serde(rename = "groupLabels")]
    pub group_labels: HashMap<String, String>,
    #[serde(rename = "commonLabels")]
    pub common_labels: HashMap<String, String>,
    #[serde(rename = "commonAnnotations")]
    pub common_annotations: HashMap<String, String>,
    #[serde(rename = "externalURL")]
    pub external_url: String,
    pub alerts: Vec<AlertManagerAlert>,
}

/// A single alert within the webhook payload.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlertManagerAlert {
    pub status: String,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    #[serde(rename = "startsAt")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(rename = "endsAt")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(rename = "generatorURL")]
    pub generator_url: String,
    pub fingerprint: String,
}

/// Severity label mapping: `critical` stays critical, `warning`/`high` map
/// to high, `info`/`medium` map to medium, anything else is low.
pub fn map_severity(label: &str) -> AlertSeverity {
    match label {
        "critical" => AlertSeverity::Critical,
        "warning" | "high" => AlertSeverity::High,
        "info" | "medium" => AlertSeverity::Medium,
        _ => AlertSeverity::Low,
    }
}

/// `POST /api/v1/webhooks/alertmanager`
pub async fn alertmanager(
    State(state): State<AppState>,
    Json(payload): Json<AlertManagerWebhook>,
) -> impl IntoResponse {
    info!(
        status = payload.status.as_str(),
        receiver = payload.receiver.as_str(),
        alert_count = payload.alerts.len(),
        "received AlertManager webhook"
    );

    for entry in &payload.alerts {
        if let Err(err) = process_entry(&state, entry).await {
            error!(
                fingerprint = entry.fingerprint.as_str(),
                error = %err,
                "failed to process webhook alert"
            );
        }
    }

    Json(serde_json::json!({ "status": "received" }))
}

async fn process_entry(
    state: &AppState,
    entry: &AlertManagerAlert,
) -> Result<(), vigil_core::VigilError> {
    let severity = map_severity(entry.labels.get("severity").map(String::as_str).unwrap_or(""));

    let title = entry
        .labels
        .get("alertname")
        .filter(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| "AlertManager Alert".to_string());

    let message = entry
        .annotations
        .get("description")
        .or_else(|| entry.annotations.get("summary"))
        .filter(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| "Alert triggered from Prometheus".to_string());

    let source = match entry.labels.get("instance") {
        Some(instance) => format!("alertmanager:{instance}"),
        None => "alertmanager".to_string(),
    };

    if entry.status != "firing" {
        info!(
            alertname = title.as_str(),
            status = entry.status.as_str(),
            fingerprint = entry.fingerprint.as_str(),
            "alert resolved in AlertManager"
        );
        return Ok(());
    }

    let mut metadata: HashMap<String, serde_json::Value> = HashMap::from([
        ("fingerprint".into(), serde_json::json!(entry.fingerprint)),
        ("generator_url".into(), serde_json::json!(entry.generator_url)),
        ("labels".into(), serde_json::json!(entry.labels)),
        ("annotations".into(), serde_json::json!(entry.annotations)),
    ]);
    if let Some(starts_at) = entry.starts_at {
        metadata.insert("starts_at".into(), serde_json::json!(starts_at));
    }

    state
        .service
        .create(CreateAlertInput {
            title: title.clone(),
            message,
            severity: Some(severity),
            source,
            metadata,
        })
        .await?;

    info!(
        alertname = title.as_str(),
        severity = %severity,
        fingerprint = entry.fingerprint.as_str(),
        "created alert from AlertManager"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_label_mapping() {
        assert_eq!(map_severity("critical"), AlertSeverity::Critical);
        assert_eq!(map_severity("warning"), AlertSeverity::High);
        assert_eq!(map_severity("high"), AlertSeverity::High);
        assert_eq!(map_severity("info"), AlertSeverity::Medium);
        assert_eq!(map_severity("medium"), AlertSeverity::Medium);
        assert_eq!(map_severity("page"), AlertSeverity::Low);
        assert_eq!(map_severity(""), AlertSeverity::Low);
    }

    #[test]
    fn webhook_payload_parses_with_missing_fields() {
        let payload: AlertManagerWebhook = serde_json::from_str(
            r#"{
                "status": "firing",
                "alerts": [
                    {
                        "status": "firing",
                        "labels": {"alertname": "HighCPU", "severity": "warning"},
                        "annotations": {"summary": "cpu at 95%"},
                        "fingerprint": "abc123"
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(payload.alerts.len(), 1);
        assert_eq!(payload.alerts[0].labels["alertname"], "HighCPU");
        assert!(payload.alerts[0].starts_at.is_none());
    }
}
