// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alert CRUD and aggregation queries.
//!
//! The WHERE clause for listing is the conjunction of the set criteria:
//! `status IN (…)`, `severity IN (…)`, equality on source and rule id,
//! `created_at` range bounds, and a LIKE search over title and message.
//! Unset criteria are absent from the query.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter};
use uuid::Uuid;

use vigil_core::alert::{Alert, AlertStatistics, AlertStatus};
use vigil_core::valueobject::{AlertFilter, PaginatedResult, Pagination};
use vigil_core::VigilError;

use crate::database::{map_tr_err, Database};
use crate::models::{alert_from_row, fmt_ts, ALERT_COLUMNS};

/// Insert a new alert row.
pub async fn create(db: &Database, alert: &Alert) -> Result<(), VigilError> {
    let alert = alert.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO alerts (
                    id, rule_id, title, message, severity, status, source, metadata,
                    acknowledged_by, acknowledged_at, resolved_by, resolved_at, expires_at,
                    created_at, updated_at
                 )
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    alert.id.to_string(),
                    alert.rule_id.map(|id| id.to_string()),
                    alert.title,
                    alert.message,
                    alert.severity.to_string(),
                    alert.status.to_string(),
                    alert.source,
                    serde_json::to_string(&alert.metadata)
                        .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?,
                    alert.acknowledged_by.map(|id| id.to_string()),
                    alert.acknowledged_at.map(fmt_ts),
                    alert.resolved_by.map(|id| id.to_string()),
                    alert.resolved_at.map(fmt_ts),
                    alert.expires_at.map(fmt_ts),
                    fmt_ts(alert.created_at),
                    fmt_ts(alert.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch an alert by id. Fails with [`VigilError::NotFound`] when absent.
pub async fn get_by_id(db: &Database, id: Uuid) -> Result<Alert, VigilError> {
    db.connection()
        .call(move |conn| {
            let alert = conn.query_row(
                &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1"),
                params![id.to_string()],
                alert_from_row,
            )?;
            Ok(alert)
        })
        .await
        .map_err(map_tr_err)
}

/// Full-row replacement keyed by id. Fails with [`VigilError::NotFound`]
/// when no row was affected.
pub async fn update(db: &Database, alert: &Alert) -> Result<(), VigilError> {
    let alert = alert.clone();
    let affected = db
        .connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE alerts
                 SET rule_id = ?2, title = ?3, message = ?4, severity = ?5, status = ?6,
                     source = ?7, metadata = ?8, acknowledged_by = ?9, acknowledged_at = ?10,
                     resolved_by = ?11, resolved_at = ?12, expires_at = ?13, updated_at = ?14
                 WHERE id = ?1",
                params![
                    alert.id.to_string(),
                    alert.rule_id.map(|id| id.to_string()),
                    alert.title,
                    alert.message,
                    alert.severity.to_string(),
                    alert.status.to_string(),
                    alert.source,
                    serde_json::to_string(&alert.metadata)
                        .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?,
                    alert.acknowledged_by.map(|id| id.to_string()),
                    alert.acknowledged_at.map(fmt_ts),
                    alert.resolved_by.map(|id| id.to_string()),
                    alert.resolved_at.map(fmt_ts),
                    alert.expires_at.map(fmt_ts),
                    fmt_ts(alert.updated_at),
                ],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)?;

    if affected == 0 {
        return Err(VigilError::NotFound);
    }
    Ok(())
}

/// Delete an alert by id. Fails with [`VigilError::NotFound`] when absent.
pub async fn delete(db: &Database, id: Uuid) -> Result<(), VigilError> {
    let affected = db
        .connection()
        .call(move |conn| {
            let n = conn.execute("DELETE FROM alerts WHERE id = ?1", params![id.to_string()])?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)?;

    if affected == 0 {
        return Err(VigilError::NotFound);
    }
    Ok(())
}

/// Build the WHERE clause and bound values for a filter.
fn build_where_clause(filter: &AlertFilter) -> (String, Vec<SqlValue>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<SqlValue> = Vec::new();

    if filter.has_status_filter() {
        let placeholders: Vec<String> = filter
            .statuses
            .iter()
            .map(|status| {
                values.push(SqlValue::Text(status.to_string()));
                format!("?{}", values.len())
            })
            .collect();
        conditions.push(format!("status IN ({})", placeholders.join(", ")));
    }

    if filter.has_severity_filter() {
        let placeholders: Vec<String> = filter
            .severities
            .iter()
            .map(|severity| {
                values.push(SqlValue::Text(severity.to_string()));
                format!("?{}", values.len())
            })
            .collect();
        conditions.push(format!("severity IN ({})", placeholders.join(", ")));
    }

    if let Some(source) = &filter.source {
        values.push(SqlValue::Text(source.clone()));
        conditions.push(format!("source = ?{}", values.len()));
    }

    if let Some(rule_id) = filter.rule_id {
        values.push(SqlValue::Text(rule_id.to_string()));
        conditions.push(format!("rule_id = ?{}", values.len()));
    }

    if let Some(from) = filter.from_date {
        values.push(SqlValue::Text(fmt_ts(from)));
        conditions.push(format!("created_at >= ?{}", values.len()));
    }

    if let Some(to) = filter.to_date {
        values.push(SqlValue::Text(fmt_ts(to)));
        conditions.push(format!("created_at <= ?{}", values.len()));
    }

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        values.push(SqlValue::Text(pattern.clone()));
        let first = values.len();
        values.push(SqlValue::Text(pattern));
        conditions.push(format!(
            "(title LIKE ?{first} OR message LIKE ?{})",
            values.len()
        ));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), values)
    }
}

/// Paginated listing ordered by `created_at` descending; the total count is
/// computed over the same filter in the same connection access.
pub async fn list(
    db: &Database,
    filter: &AlertFilter,
    pagination: Pagination,
) -> Result<PaginatedResult<Alert>, VigilError> {
    let (where_clause, values) = build_where_clause(filter);

    db.connection()
        .call(move |conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM alerts {where_clause}"),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )?;

            let mut page_values = values.clone();
            page_values.push(SqlValue::Integer(pagination.limit()));
            page_values.push(SqlValue::Integer(pagination.offset()));
            let query = format!(
                "SELECT {ALERT_COLUMNS} FROM alerts {where_clause}
                 ORDER BY created_at DESC
                 LIMIT ?{} OFFSET ?{}",
                page_values.len() - 1,
                page_values.len()
            );

            let mut stmt = conn.prepare(&query)?;
            let alerts = stmt
                .query_map(params_from_iter(page_values.iter()), alert_from_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(PaginatedResult::new(alerts, total, pagination))
        })
        .await
        .map_err(map_tr_err)
}

/// All active alerts ordered by severity then recency.
pub async fn list_active(db: &Database) -> Result<Vec<Alert>, VigilError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ALERT_COLUMNS} FROM alerts
                 WHERE status = ?1
                 ORDER BY severity ASC, created_at DESC"
            ))?;
            let alerts = stmt
                .query_map(params![AlertStatus::Active.to_string()], alert_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(alerts)
        })
        .await
        .map_err(map_tr_err)
}

/// Active alerts whose expiration time has already passed.
pub async fn list_expired(db: &Database) -> Result<Vec<Alert>, VigilError> {
    let now = fmt_ts(chrono::Utc::now());
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ALERT_COLUMNS} FROM alerts
                 WHERE status = ?1 AND expires_at IS NOT NULL AND expires_at < ?2"
            ))?;
            let alerts = stmt
                .query_map(
                    params![AlertStatus::Active.to_string(), now],
                    alert_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(alerts)
        })
        .await
        .map_err(map_tr_err)
}

/// Total number of alerts.
pub async fn count(db: &Database) -> Result<i64, VigilError> {
    db.connection()
        .call(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM alerts", [], |row| row.get(0))?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of alerts in a given status.
pub async fn count_by_status(db: &Database, status: AlertStatus) -> Result<i64, VigilError> {
    db.connection()
        .call(move |conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM alerts WHERE status = ?1",
                params![status.to_string()],
                |row| row.get(0),
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

/// Aggregated statistics: totals by status, counts by severity, and the
/// top-10 sources (excluding empty).
pub async fn get_statistics(db: &Database) -> Result<AlertStatistics, VigilError> {
    db.connection()
        .call(|conn| {
            let (total, active, acknowledged, resolved) = conn.query_row(
                "SELECT
                    COUNT(*),
                    COUNT(*) FILTER (WHERE status = 'active'),
                    COUNT(*) FILTER (WHERE status = 'acknowledged'),
                    COUNT(*) FILTER (WHERE status = 'resolved')
                 FROM alerts",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

            let mut stats = AlertStatistics {
                total,
                active,
                acknowledged,
                resolved,
                ..AlertStatistics::default()
            };

            let mut stmt =
                conn.prepare("SELECT severity, COUNT(*) FROM alerts GROUP BY severity")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (severity, n) = row?;
                stats.by_severity.insert(severity, n);
            }

            let mut stmt = conn.prepare(
                "SELECT source, COUNT(*) AS n
                 FROM alerts
                 WHERE source != ''
                 GROUP BY source
                 ORDER BY n DESC
                 LIMIT 10",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (source, n) = row?;
                stats.by_source.insert(source, n);
            }

            Ok(stats)
        })
        .await
        .map_err(map_tr_err)
}
