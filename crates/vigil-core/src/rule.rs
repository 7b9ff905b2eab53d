// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alert rule entity.
//!
//! Rules are stored and managed through the API but never evaluated by this
//! service; evaluation is an explicit non-goal of the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

/// Maximum cooldown between rule firings, in minutes (24 hours).
pub const MAX_COOLDOWN_MINUTES: u32 = 1440;

/// Comparison operators allowed in a rule condition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum ConditionOperator {
    #[strum(serialize = ">")]
    #[serde(rename = ">")]
    GreaterThan,
    #[strum(serialize = "<")]
    #[serde(rename = "<")]
    LessThan,
    #[strum(serialize = "==")]
    #[serde(rename = "==")]
    Equal,
    #[strum(serialize = ">=")]
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[strum(serialize = "<=")]
    #[serde(rename = "<=")]
    LessOrEqual,
    #[strum(serialize = "!=")]
    #[serde(rename = "!=")]
    NotEqual,
}

/// The condition a rule evaluates against a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    /// Metric name the condition applies to.
    pub metric: String,
    pub operator: ConditionOperator,
    pub threshold: f64,
    /// Number of consecutive breaches before firing.
    pub consecutive: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleValidationError {
    #[error("rule name is required")]
    NameRequired,
    #[error("rule name must be less than 256 characters")]
    NameTooLong,
    #[error("rule condition metric is required")]
    MetricRequired,
    #[error("rule cooldown must be at most 1440 minutes")]
    CooldownOutOfRange,
}

/// A stored alert rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: Uuid,
    pub name: String,
    pub condition: RuleCondition,
    pub severity: crate::alert::AlertSeverity,
    pub enabled: bool,
    /// Minutes to wait between consecutive firings of this rule.
    pub cooldown_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AlertRule {
    pub fn new(
        name: impl Into<String>,
        condition: RuleCondition,
        severity: crate::alert::AlertSeverity,
        cooldown_minutes: u32,
    ) -> Result<Self, RuleValidationError> {
        let now = Utc::now();
        let rule = AlertRule {
            id: Uuid::new_v4(),
            name: name.into(),
            condition,
            severity,
            enabled: true,
            cooldown_minutes,
            created_at: now,
            updated_at: now,
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.name.is_empty() {
            return Err(RuleValidationError::NameRequired);
        }
        if self.name.len() > 255 {
            return Err(RuleValidationError::NameTooLong);
        }
        if self.condition.metric.is_empty() {
            return Err(RuleValidationError::MetricRequired);
        }
        if self.cooldown_minutes > MAX_COOLDOWN_MINUTES {
            return Err(RuleValidationError::CooldownOutOfRange);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertSeverity;

    fn condition() -> RuleCondition {
        RuleCondition {
            metric: "cpu_usage".into(),
            operator: ConditionOperator::GreaterThan,
            threshold: 90.0,
            consecutive: 3,
        }
    }

    #[test]
    fn new_rule_is_enabled() {
        let rule = AlertRule::new("high cpu", condition(), AlertSeverity::High, 10).unwrap();
        assert!(rule.enabled);
        assert_eq!(rule.cooldown_minutes, 10);
    }

    #[test]
    fn rejects_empty_name_and_metric() {
        assert_eq!(
            AlertRule::new("", condition(), AlertSeverity::Low, 0).unwrap_err(),
            RuleValidationError::NameRequired
        );

        let mut cond = condition();
        cond.metric = String::new();
        assert_eq!(
            AlertRule::new("r", cond, AlertSeverity::Low, 0).unwrap_err(),
            RuleValidationError::MetricRequired
        );
    }

    #[test]
    fn rejects_cooldown_over_a_day() {
        assert_eq!(
            AlertRule::new("r", condition(), AlertSeverity::Low, 1441).unwrap_err(),
            RuleValidationError::CooldownOutOfRange
        );
        assert!(AlertRule::new("r", condition(), AlertSeverity::Low, 1440).is_ok());
    }

    #[test]
    fn operator_round_trips_through_its_symbol() {
        use std::str::FromStr;
        for s in [">", "<", "==", ">=", "<=", "!="] {
            assert_eq!(ConditionOperator::from_str(s).unwrap().to_string(), s);
        }
        assert!(ConditionOperator::from_str("~=").is_err());
    }
}
