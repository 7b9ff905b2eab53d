// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filtering criteria for alert queries.
//!
//! Criteria combine as a conjunction across fields; the status and severity
//! lists are disjunctions within their field. Unset criteria are absent from
//! the generated query.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::alert::{AlertSeverity, AlertStatus};

/// Builder-style filter for alert queries.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub statuses: Vec<AlertStatus>,
    pub severities: Vec<AlertSeverity>,
    pub source: Option<String>,
    pub rule_id: Option<Uuid>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    /// Text search against title and message.
    pub search: Option<String>,
}

impl AlertFilter {
    pub fn new() -> Self {
        AlertFilter::default()
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = AlertStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_severities(mut self, severities: impl IntoIterator<Item = AlertSeverity>) -> Self {
        self.severities = severities.into_iter().collect();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_rule_id(mut self, rule_id: Uuid) -> Self {
        self.rule_id = Some(rule_id);
        self
    }

    pub fn with_date_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from_date = Some(from);
        self.to_date = Some(to);
        self
    }

    /// Empty search terms are ignored.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        if !search.is_empty() {
            self.search = Some(search);
        }
        self
    }

    /// Only active alerts.
    pub fn active_only(self) -> Self {
        self.with_statuses([AlertStatus::Active])
    }

    /// Active alerts of critical or high severity.
    pub fn needs_attention(self) -> Self {
        self.with_statuses([AlertStatus::Active])
            .with_severities([AlertSeverity::Critical, AlertSeverity::High])
    }

    pub fn has_status_filter(&self) -> bool {
        !self.statuses.is_empty()
    }

    pub fn has_severity_filter(&self) -> bool {
        !self.severities.is_empty()
    }

    pub fn has_search(&self) -> bool {
        self.search.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_status_filter()
            && !self.has_severity_filter()
            && self.source.is_none()
            && self.rule_id.is_none()
            && self.from_date.is_none()
            && self.to_date.is_none()
            && !self.has_search()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_reports_empty() {
        assert!(AlertFilter::new().is_empty());
    }

    #[test]
    fn builder_accumulates_criteria() {
        let filter = AlertFilter::new()
            .with_statuses([AlertStatus::Active, AlertStatus::Acknowledged])
            .with_severities([AlertSeverity::Critical])
            .with_source("web-01")
            .with_search("cpu");

        assert!(filter.has_status_filter());
        assert!(filter.has_severity_filter());
        assert_eq!(filter.source.as_deref(), Some("web-01"));
        assert!(filter.has_search());
        assert!(!filter.is_empty());
    }

    #[test]
    fn empty_search_is_ignored() {
        let filter = AlertFilter::new().with_search("");
        assert!(!filter.has_search());
        assert!(filter.is_empty());
    }

    #[test]
    fn needs_attention_selects_active_critical_and_high() {
        let filter = AlertFilter::new().needs_attention();
        assert_eq!(filter.statuses, vec![AlertStatus::Active]);
        assert_eq!(
            filter.severities,
            vec![AlertSeverity::Critical, AlertSeverity::High]
        );
    }
}
