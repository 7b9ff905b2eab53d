// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The alert entity and its lifecycle state machine.
//!
//! An [`Alert`] is created `Active` and moves through the machine only via
//! its methods:
//!
//! ```text
//!         acknowledge(u)          resolve(u)
//! active ---------------> acknowledged --------> resolved (terminal)
//!    |                                              ^
//!    |  resolve(u)                                  |
//!    +----------------------------------------------+
//!    |
//!    |  expire()  [only once expires_at has passed]
//!    +----------------------> expired (terminal)
//! ```
//!
//! `resolved` and `expired` are absorbing; a repeat `resolve` is rejected
//! with [`LifecycleError::AlreadyResolved`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

/// Severity levels, ordered from most to least critical.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl AlertSeverity {
    /// Numeric value for sorting: lower means higher priority.
    pub fn priority(self) -> u8 {
        match self {
            AlertSeverity::Critical => 1,
            AlertSeverity::High => 2,
            AlertSeverity::Medium => 3,
            AlertSeverity::Low => 4,
            AlertSeverity::Info => 5,
        }
    }
}

/// Lifecycle states of an alert.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
    Expired,
}

/// Validation errors raised when constructing or mutating an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AlertValidationError {
    #[error("alert title is required")]
    TitleRequired,
    #[error("alert title must be less than 256 characters")]
    TitleTooLong,
    #[error("alert message is required")]
    MessageRequired,
}

/// Rejections emitted by the lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("alert is already acknowledged")]
    AlreadyAcknowledged,
    #[error("alert is already resolved")]
    AlreadyResolved,
    #[error("alert is not active")]
    NotActive,
}

/// An alert in the real-time alerting system.
///
/// The `acknowledged_by`/`acknowledged_at` and `resolved_by`/`resolved_at`
/// pairs are set together or not at all; the state-machine methods are the
/// only writers, which preserves that invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    /// Rule that triggered this alert; `None` if manually created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// Create a new active alert, validating the inputs.
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        severity: AlertSeverity,
        source: impl Into<String>,
    ) -> Result<Self, AlertValidationError> {
        let now = Utc::now();
        let alert = Alert {
            id: Uuid::new_v4(),
            rule_id: None,
            title: title.into(),
            message: message.into(),
            severity,
            status: AlertStatus::Active,
            source: source.into(),
            metadata: HashMap::new(),
            acknowledged_by: None,
            acknowledged_at: None,
            resolved_by: None,
            resolved_at: None,
            expires_at: None,
            created_at: now,
            updated_at: now,
        };
        alert.validate()?;
        Ok(alert)
    }

    /// Check that title and message satisfy the field constraints.
    pub fn validate(&self) -> Result<(), AlertValidationError> {
        if self.title.is_empty() {
            return Err(AlertValidationError::TitleRequired);
        }
        if self.title.len() > 255 {
            return Err(AlertValidationError::TitleTooLong);
        }
        if self.message.is_empty() {
            return Err(AlertValidationError::MessageRequired);
        }
        Ok(())
    }

    /// Mark the alert as acknowledged by a user.
    pub fn acknowledge(&mut self, user_id: Uuid) -> Result<(), LifecycleError> {
        if self.status == AlertStatus::Resolved {
            return Err(LifecycleError::AlreadyResolved);
        }
        if self.status == AlertStatus::Acknowledged {
            return Err(LifecycleError::AlreadyAcknowledged);
        }
        if self.status != AlertStatus::Active {
            return Err(LifecycleError::NotActive);
        }

        self.status = AlertStatus::Acknowledged;
        self.acknowledged_by = Some(user_id);
        self.acknowledged_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    /// Mark the alert as resolved by a user.
    ///
    /// Permitted from any state except `resolved`; acknowledgment is not a
    /// prerequisite.
    pub fn resolve(&mut self, user_id: Uuid) -> Result<(), LifecycleError> {
        if self.status == AlertStatus::Resolved {
            return Err(LifecycleError::AlreadyResolved);
        }

        self.status = AlertStatus::Resolved;
        self.resolved_by = Some(user_id);
        self.resolved_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    /// Mark the alert as expired. Called by the background sweeper once
    /// `expires_at` has passed.
    pub fn expire(&mut self) {
        self.status = AlertStatus::Expired;
        self.touch();
    }

    /// Set the expiration time for the alert.
    pub fn set_expiration(&mut self, expires_at: DateTime<Utc>) {
        self.expires_at = Some(expires_at);
        self.touch();
    }

    /// Whether the alert has passed its expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Utc::now() > at,
            None => false,
        }
    }

    /// Attach a key-value pair to the alert's metadata.
    pub fn add_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
        self.touch();
    }

    pub fn is_critical(&self) -> bool {
        self.severity == AlertSeverity::Critical
    }

    /// Active alerts of critical or high severity.
    pub fn needs_immediate_attention(&self) -> bool {
        self.status == AlertStatus::Active
            && matches!(
                self.severity,
                AlertSeverity::Critical | AlertSeverity::High
            )
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Aggregated alert statistics for dashboards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertStatistics {
    pub total: i64,
    pub active: i64,
    pub acknowledged: i64,
    pub resolved: i64,
    /// Counts keyed by severity label.
    pub by_severity: std::collections::BTreeMap<String, i64>,
    /// Counts for the top-10 sources, excluding empty.
    pub by_source: std::collections::BTreeMap<String, i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Alert {
        Alert::new("High CPU", "95%", AlertSeverity::High, "web-01").unwrap()
    }

    #[test]
    fn new_alert_is_active_with_timestamps() {
        let alert = sample();
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.severity, AlertSeverity::High);
        assert!(alert.acknowledged_by.is_none());
        assert!(alert.resolved_by.is_none());
        assert_eq!(alert.created_at, alert.updated_at);
    }

    #[test]
    fn new_alert_rejects_empty_title() {
        let err = Alert::new("", "msg", AlertSeverity::Low, "").unwrap_err();
        assert_eq!(err, AlertValidationError::TitleRequired);
    }

    #[test]
    fn new_alert_rejects_overlong_title() {
        let title = "x".repeat(256);
        let err = Alert::new(title, "msg", AlertSeverity::Low, "").unwrap_err();
        assert_eq!(err, AlertValidationError::TitleTooLong);

        let title = "x".repeat(255);
        assert!(Alert::new(title, "msg", AlertSeverity::Low, "").is_ok());
    }

    #[test]
    fn new_alert_rejects_empty_message() {
        let err = Alert::new("title", "", AlertSeverity::Low, "").unwrap_err();
        assert_eq!(err, AlertValidationError::MessageRequired);
    }

    #[test]
    fn acknowledge_sets_both_attribution_fields() {
        let mut alert = sample();
        let user = Uuid::new_v4();
        alert.acknowledge(user).unwrap();

        assert_eq!(alert.status, AlertStatus::Acknowledged);
        assert_eq!(alert.acknowledged_by, Some(user));
        assert!(alert.acknowledged_at.is_some());
        assert!(alert.updated_at >= alert.created_at);
    }

    #[test]
    fn double_acknowledge_is_rejected_and_state_unchanged() {
        let mut alert = sample();
        let first = Uuid::new_v4();
        alert.acknowledge(first).unwrap();

        let err = alert.acknowledge(Uuid::new_v4()).unwrap_err();
        assert_eq!(err, LifecycleError::AlreadyAcknowledged);
        assert_eq!(alert.acknowledged_by, Some(first));
    }

    #[test]
    fn acknowledge_after_resolve_reports_already_resolved() {
        let mut alert = sample();
        alert.resolve(Uuid::new_v4()).unwrap();
        let err = alert.acknowledge(Uuid::new_v4()).unwrap_err();
        assert_eq!(err, LifecycleError::AlreadyResolved);
    }

    #[test]
    fn acknowledge_expired_alert_is_not_active() {
        let mut alert = sample();
        alert.expire();
        let err = alert.acknowledge(Uuid::new_v4()).unwrap_err();
        assert_eq!(err, LifecycleError::NotActive);
    }

    #[test]
    fn resolve_from_active_is_permitted() {
        let mut alert = sample();
        let user = Uuid::new_v4();
        alert.resolve(user).unwrap();

        assert_eq!(alert.status, AlertStatus::Resolved);
        assert_eq!(alert.resolved_by, Some(user));
        assert!(alert.resolved_at.is_some());
    }

    #[test]
    fn resolve_from_acknowledged_is_permitted() {
        let mut alert = sample();
        alert.acknowledge(Uuid::new_v4()).unwrap();
        alert.resolve(Uuid::new_v4()).unwrap();
        assert_eq!(alert.status, AlertStatus::Resolved);
    }

    #[test]
    fn double_resolve_is_rejected_and_resolver_unchanged() {
        let mut alert = sample();
        let first = Uuid::new_v4();
        alert.resolve(first).unwrap();

        let err = alert.resolve(Uuid::new_v4()).unwrap_err();
        assert_eq!(err, LifecycleError::AlreadyResolved);
        assert_eq!(alert.resolved_by, Some(first));
    }

    #[test]
    fn expiration_checks() {
        let mut alert = sample();
        assert!(!alert.is_expired());

        alert.set_expiration(Utc::now() - Duration::seconds(1));
        assert!(alert.is_expired());

        alert.set_expiration(Utc::now() + Duration::hours(1));
        assert!(!alert.is_expired());
    }

    #[test]
    fn add_metadata_touches_updated_at() {
        let mut alert = sample();
        alert.add_metadata("fingerprint", serde_json::json!("abc123"));
        assert_eq!(
            alert.metadata.get("fingerprint"),
            Some(&serde_json::json!("abc123"))
        );
    }

    #[test]
    fn needs_immediate_attention_only_for_active_critical_or_high() {
        let critical = Alert::new("t", "m", AlertSeverity::Critical, "").unwrap();
        assert!(critical.needs_immediate_attention());

        let low = Alert::new("t", "m", AlertSeverity::Low, "").unwrap();
        assert!(!low.needs_immediate_attention());

        let mut acked = Alert::new("t", "m", AlertSeverity::Critical, "").unwrap();
        acked.acknowledge(Uuid::new_v4()).unwrap();
        assert!(!acked.needs_immediate_attention());
    }

    #[test]
    fn severity_priority_ordering() {
        assert!(AlertSeverity::Critical.priority() < AlertSeverity::High.priority());
        assert!(AlertSeverity::High.priority() < AlertSeverity::Medium.priority());
        assert!(AlertSeverity::Medium.priority() < AlertSeverity::Low.priority());
        assert!(AlertSeverity::Low.priority() < AlertSeverity::Info.priority());
    }

    #[test]
    fn severity_and_status_round_trip_as_strings() {
        use std::str::FromStr;
        for s in ["critical", "high", "medium", "low", "info"] {
            assert_eq!(AlertSeverity::from_str(s).unwrap().to_string(), s);
        }
        for s in ["active", "acknowledged", "resolved", "expired"] {
            assert_eq!(AlertStatus::from_str(s).unwrap().to_string(), s);
        }
        assert!(AlertSeverity::from_str("urgent").is_err());
        assert!(AlertStatus::from_str("open").is_err());
    }
}
