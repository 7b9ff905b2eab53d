// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alert rule storage.
//!
//! Rules are persisted and served through the API; the core never evaluates
//! them.

use rusqlite::params;
use uuid::Uuid;

use vigil_core::rule::AlertRule;
use vigil_core::VigilError;

use crate::database::{map_tr_err, Database};
use crate::models::{fmt_ts, rule_from_row, RULE_COLUMNS};

pub async fn create(db: &Database, rule: &AlertRule) -> Result<(), VigilError> {
    let rule = rule.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO alert_rules (
                    id, name, condition_metric, condition_operator, condition_threshold,
                    condition_consecutive, severity, enabled, cooldown_minutes,
                    created_at, updated_at
                 )
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    rule.id.to_string(),
                    rule.name,
                    rule.condition.metric,
                    rule.condition.operator.to_string(),
                    rule.condition.threshold,
                    rule.condition.consecutive as i64,
                    rule.severity.to_string(),
                    rule.enabled as i64,
                    rule.cooldown_minutes as i64,
                    fmt_ts(rule.created_at),
                    fmt_ts(rule.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_by_id(db: &Database, id: Uuid) -> Result<AlertRule, VigilError> {
    db.connection()
        .call(move |conn| {
            let rule = conn.query_row(
                &format!("SELECT {RULE_COLUMNS} FROM alert_rules WHERE id = ?1"),
                params![id.to_string()],
                rule_from_row,
            )?;
            Ok(rule)
        })
        .await
        .map_err(map_tr_err)
}

/// All rules, enabled first, newest first within each group.
pub async fn list(db: &Database) -> Result<Vec<AlertRule>, VigilError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RULE_COLUMNS} FROM alert_rules
                 ORDER BY enabled DESC, created_at DESC"
            ))?;
            let rules = stmt
                .query_map([], rule_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rules)
        })
        .await
        .map_err(map_tr_err)
}

/// Flip the enabled flag. Fails with [`VigilError::NotFound`] when absent.
pub async fn set_enabled(db: &Database, id: Uuid, enabled: bool) -> Result<(), VigilError> {
    let now = fmt_ts(chrono::Utc::now());
    let affected = db
        .connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE alert_rules SET enabled = ?2, updated_at = ?3 WHERE id = ?1",
                params![id.to_string(), enabled as i64, now],
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

pub async fn delete(db: &Database, id: Uuid) -> Result<(), VigilError> {
    let affected = db
        .connection()
        .call(move |conn| {
            let n = conn.execute(
                "DELETE FROM alert_rules WHERE id = ?1",
                params![id.to_string()],
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
