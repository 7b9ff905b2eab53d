// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite rows and domain entities.
//!
//! Timestamps are stored as RFC3339 text with microsecond precision in UTC,
//! which keeps lexicographic and chronological order aligned for range
//! scans and `ORDER BY`.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

use vigil_core::alert::{Alert, AlertSeverity, AlertStatus};
use vigil_core::rule::{AlertRule, ConditionOperator, RuleCondition};

/// Format a timestamp for storage.
pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
pub fn parse_ts(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

fn conversion_err(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn get_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s).map_err(|e| conversion_err(idx, e))
}

fn get_opt_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| Uuid::parse_str(&s).map_err(|e| conversion_err(idx, e)))
        .transpose()
}

fn get_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    parse_ts(&s).map_err(|e| conversion_err(idx, e))
}

fn get_opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| parse_ts(&s).map_err(|e| conversion_err(idx, e)))
        .transpose()
}

/// Column list shared by every alert SELECT.
pub const ALERT_COLUMNS: &str = "id, rule_id, title, message, severity, status, source, metadata, \
     acknowledged_by, acknowledged_at, resolved_by, resolved_at, expires_at, \
     created_at, updated_at";

/// Map a row selected with [`ALERT_COLUMNS`] into an [`Alert`].
pub fn alert_from_row(row: &Row<'_>) -> rusqlite::Result<Alert> {
    let severity_str: String = row.get(4)?;
    let status_str: String = row.get(5)?;
    let metadata_str: String = row.get(7)?;

    let metadata: HashMap<String, serde_json::Value> =
        serde_json::from_str(&metadata_str).map_err(|e| conversion_err(7, e))?;

    Ok(Alert {
        id: get_uuid(row, 0)?,
        rule_id: get_opt_uuid(row, 1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        severity: AlertSeverity::from_str(&severity_str).map_err(|e| conversion_err(4, e))?,
        status: AlertStatus::from_str(&status_str).map_err(|e| conversion_err(5, e))?,
        source: row.get(6)?,
        metadata,
        acknowledged_by: get_opt_uuid(row, 8)?,
        acknowledged_at: get_opt_ts(row, 9)?,
        resolved_by: get_opt_uuid(row, 10)?,
        resolved_at: get_opt_ts(row, 11)?,
        expires_at: get_opt_ts(row, 12)?,
        created_at: get_ts(row, 13)?,
        updated_at: get_ts(row, 14)?,
    })
}

/// Column list shared by every rule SELECT.
pub const RULE_COLUMNS: &str = "id, name, condition_metric, condition_operator, \
     condition_threshold, condition_consecutive, severity, enabled, cooldown_minutes, \
     created_at, updated_at";

/// Map a row selected with [`RULE_COLUMNS`] into an [`AlertRule`].
pub fn rule_from_row(row: &Row<'_>) -> rusqlite::Result<AlertRule> {
    let operator_str: String = row.get(3)?;
    let severity_str: String = row.get(6)?;

    Ok(AlertRule {
        id: get_uuid(row, 0)?,
        name: row.get(1)?,
        condition: RuleCondition {
            metric: row.get(2)?,
            operator: ConditionOperator::from_str(&operator_str)
                .map_err(|e| conversion_err(3, e))?,
            threshold: row.get(4)?,
            consecutive: row.get::<_, i64>(5)? as u32,
        },
        severity: AlertSeverity::from_str(&severity_str).map_err(|e| conversion_err(6, e))?,
        enabled: row.get::<_, i64>(7)? != 0,
        cooldown_minutes: row.get::<_, i64>(8)? as u32,
        created_at: get_ts(row, 9)?,
        updated_at: get_ts(row, 10)?,
    })
}
