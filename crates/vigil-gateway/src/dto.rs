// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and query DTOs for the REST surface.
//!
//! Alert and pagination responses serialize the domain types directly;
//! only inbound shapes need dedicated structs.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use vigil_core::alert::{AlertSeverity, AlertStatus};
use vigil_core::valueobject::{AlertFilter, Pagination};
use vigil_core::VigilError;

/// Body of `POST /api/v1/alerts`.
#[derive(Debug, Deserialize)]
pub struct CreateAlertRequest {
    pub title: String,
    pub message: String,
    pub severity: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl CreateAlertRequest {
    pub fn severity(&self) -> Result<AlertSeverity, VigilError> {
        AlertSeverity::from_str(&self.severity)
            .map_err(|_| VigilError::Validation(format!("invalid severity: {}", self.severity)))
    }
}

/// Query of `GET /api/v1/alerts`.
///
/// `status` and `severity` accept comma-separated lists.
#[derive(Debug, Default, Deserialize)]
pub struct ListAlertsQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub from_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to_date: Option<DateTime<Utc>>,
}

impl ListAlertsQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page.unwrap_or(1), self.page_size.unwrap_or(20))
    }

    pub fn filter(&self) -> Result<AlertFilter, VigilError> {
        let mut filter = AlertFilter::new();

        if let Some(statuses) = &self.status {
            let parsed = parse_csv::<AlertStatus>(statuses, "status")?;
            if !parsed.is_empty() {
                filter = filter.with_statuses(parsed);
            }
        }
        if let Some(severities) = &self.severity {
            let parsed = parse_csv::<AlertSeverity>(severities, "severity")?;
            if !parsed.is_empty() {
                filter = filter.with_severities(parsed);
            }
        }
        if let Some(source) = self.source.as_deref().filter(|s| !s.is_empty()) {
            filter = filter.with_source(source);
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            filter = filter.with_search(search);
        }
        if let (Some(from), Some(to)) = (self.from_date, self.to_date) {
            filter = filter.with_date_range(from, to);
        } else {
            filter.from_date = self.from_date;
            filter.to_date = self.to_date;
        }

        Ok(filter)
    }
}

fn parse_csv<T: FromStr>(input: &str, field: &str) -> Result<Vec<T>, VigilError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            T::from_str(s).map_err(|_| VigilError::Validation(format!("invalid {field}: {s}")))
        })
        .collect()
}
