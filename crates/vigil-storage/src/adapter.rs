// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`AlertStore`] trait.

use async_trait::async_trait;
use uuid::Uuid;

use vigil_core::alert::{Alert, AlertStatistics, AlertStatus};
use vigil_core::rule::AlertRule;
use vigil_core::valueobject::{AlertFilter, PaginatedResult, Pagination};
use vigil_core::{AlertStore, VigilError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed alert store.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules.
pub struct SqliteAlertStore {
    db: Database,
}

impl SqliteAlertStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // --- Rule operations (stored, never evaluated) ---

    pub async fn create_rule(&self, rule: &AlertRule) -> Result<(), VigilError> {
        queries::rules::create(&self.db, rule).await
    }

    pub async fn get_rule(&self, id: Uuid) -> Result<AlertRule, VigilError> {
        queries::rules::get_by_id(&self.db, id).await
    }

    pub async fn list_rules(&self) -> Result<Vec<AlertRule>, VigilError> {
        queries::rules::list(&self.db).await
    }

    pub async fn set_rule_enabled(&self, id: Uuid, enabled: bool) -> Result<(), VigilError> {
        queries::rules::set_enabled(&self.db, id, enabled).await
    }

    pub async fn delete_rule(&self, id: Uuid) -> Result<(), VigilError> {
        queries::rules::delete(&self.db, id).await
    }
}

#[async_trait]
impl AlertStore for SqliteAlertStore {
    async fn create(&self, alert: &Alert) -> Result<(), VigilError> {
        queries::alerts::create(&self.db, alert).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Alert, VigilError> {
        queries::alerts::get_by_id(&self.db, id).await
    }

    async fn update(&self, alert: &Alert) -> Result<(), VigilError> {
        queries::alerts::update(&self.db, alert).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), VigilError> {
        queries::alerts::delete(&self.db, id).await
    }

    async fn list(
        &self,
        filter: &AlertFilter,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Alert>, VigilError> {
        queries::alerts::list(&self.db, filter, pagination).await
    }

    async fn list_active(&self) -> Result<Vec<Alert>, VigilError> {
        queries::alerts::list_active(&self.db).await
    }

    async fn list_expired(&self) -> Result<Vec<Alert>, VigilError> {
        queries::alerts::list_expired(&self.db).await
    }

    async fn count(&self) -> Result<i64, VigilError> {
        queries::alerts::count(&self.db).await
    }

    async fn count_by_status(&self, status: AlertStatus) -> Result<i64, VigilError> {
        queries::alerts::count_by_status(&self.db, status).await
    }

    async fn get_statistics(&self) -> Result<AlertStatistics, VigilError> {
        queries::alerts::get_statistics(&self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;
    use vigil_core::alert::AlertSeverity;

    async fn setup() -> (SqliteAlertStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        (SqliteAlertStore::new(db), dir)
    }

    fn alert(title: &str, severity: AlertSeverity, source: &str) -> Alert {
        Alert::new(title, "something happened", severity, source).unwrap()
    }

    #[tokio::test]
    async fn create_and_get_round_trip() {
        let (store, _dir) = setup().await;
        let mut a = alert("High CPU", AlertSeverity::High, "web-01");
        a.add_metadata("fingerprint", serde_json::json!("abc"));
        store.create(&a).await.unwrap();

        let got = store.get_by_id(a.id).await.unwrap();
        assert_eq!(got.id, a.id);
        assert_eq!(got.title, "High CPU");
        assert_eq!(got.severity, AlertSeverity::High);
        assert_eq!(got.status, AlertStatus::Active);
        assert_eq!(got.metadata["fingerprint"], serde_json::json!("abc"));
        assert!(got.acknowledged_by.is_none());
    }

    #[tokio::test]
    async fn get_missing_returns_not_found() {
        let (store, _dir) = setup().await;
        let err = store.get_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, VigilError::NotFound));
    }

    #[tokio::test]
    async fn duplicate_id_is_a_duplicate_key() {
        let (store, _dir) = setup().await;
        let a = alert("dup", AlertSeverity::Low, "");
        store.create(&a).await.unwrap();
        let err = store.create(&a).await.unwrap_err();
        assert!(matches!(err, VigilError::DuplicateKey));
    }

    #[tokio::test]
    async fn update_persists_lifecycle_transition() {
        let (store, _dir) = setup().await;
        let mut a = alert("ack me", AlertSeverity::Medium, "db-01");
        store.create(&a).await.unwrap();

        let user = Uuid::new_v4();
        a.acknowledge(user).unwrap();
        store.update(&a).await.unwrap();

        let got = store.get_by_id(a.id).await.unwrap();
        assert_eq!(got.status, AlertStatus::Acknowledged);
        assert_eq!(got.acknowledged_by, Some(user));
        assert!(got.acknowledged_at.is_some());
        assert!(got.updated_at >= got.created_at);
    }

    #[tokio::test]
    async fn update_missing_returns_not_found() {
        let (store, _dir) = setup().await;
        let a = alert("ghost", AlertSeverity::Low, "");
        let err = store.update(&a).await.unwrap_err();
        assert!(matches!(err, VigilError::NotFound));
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let (store, _dir) = setup().await;
        let a = alert("gone", AlertSeverity::Low, "");
        store.create(&a).await.unwrap();

        store.delete(a.id).await.unwrap();
        assert!(matches!(
            store.get_by_id(a.id).await.unwrap_err(),
            VigilError::NotFound
        ));
        assert!(matches!(
            store.delete(a.id).await.unwrap_err(),
            VigilError::NotFound
        ));
    }

    #[tokio::test]
    async fn list_filters_compose_as_conjunction() {
        let (store, _dir) = setup().await;

        let mut critical = alert("disk full", AlertSeverity::Critical, "db-01");
        store.create(&critical).await.unwrap();
        store
            .create(&alert("slow queries", AlertSeverity::Medium, "db-01"))
            .await
            .unwrap();
        store
            .create(&alert("cpu spike", AlertSeverity::Critical, "web-01"))
            .await
            .unwrap();

        critical.resolve(Uuid::new_v4()).unwrap();
        store.update(&critical).await.unwrap();

        // severity=critical AND source=db-01 matches only the resolved one.
        let filter = AlertFilter::new()
            .with_severities([AlertSeverity::Critical])
            .with_source("db-01");
        let page = store.list(&filter, Pagination::default()).await.unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].title, "disk full");

        // Adding status=active excludes it.
        let filter = filter.with_statuses([AlertStatus::Active]);
        let page = store.list(&filter, Pagination::default()).await.unwrap();
        assert_eq!(page.total_items, 0);
    }

    #[tokio::test]
    async fn list_status_disjunction_within_the_field() {
        let (store, _dir) = setup().await;

        let mut acked = alert("a", AlertSeverity::Low, "");
        store.create(&acked).await.unwrap();
        acked.acknowledge(Uuid::new_v4()).unwrap();
        store.update(&acked).await.unwrap();

        let mut resolved = alert("b", AlertSeverity::Low, "");
        store.create(&resolved).await.unwrap();
        resolved.resolve(Uuid::new_v4()).unwrap();
        store.update(&resolved).await.unwrap();

        store.create(&alert("c", AlertSeverity::Low, "")).await.unwrap();

        let filter = AlertFilter::new()
            .with_statuses([AlertStatus::Acknowledged, AlertStatus::Resolved]);
        let page = store.list(&filter, Pagination::default()).await.unwrap();
        assert_eq!(page.total_items, 2);
    }

    #[tokio::test]
    async fn list_search_matches_title_or_message() {
        let (store, _dir) = setup().await;
        store
            .create(&Alert::new("High CPU", "load average 12", AlertSeverity::High, "").unwrap())
            .await
            .unwrap();
        store
            .create(&Alert::new("Disk usage", "cpu steal noticed", AlertSeverity::Low, "").unwrap())
            .await
            .unwrap();
        store
            .create(&Alert::new("Network", "packet loss", AlertSeverity::Low, "").unwrap())
            .await
            .unwrap();

        let page = store
            .list(&AlertFilter::new().with_search("cpu"), Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.total_items, 2);
    }

    #[tokio::test]
    async fn list_orders_newest_first_and_paginates() {
        let (store, _dir) = setup().await;
        for i in 0..5i64 {
            let mut a = alert(&format!("alert-{i}"), AlertSeverity::Info, "");
            // Space creation times so ordering is deterministic.
            a.created_at = Utc::now() - Duration::minutes(5 - i);
            a.updated_at = a.created_at;
            store.create(&a).await.unwrap();
        }

        let page = store
            .list(&AlertFilter::new(), Pagination::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total_items, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].title, "alert-4");
        assert!(page.has_next);
        assert!(!page.has_previous);

        let last = store
            .list(&AlertFilter::new(), Pagination::new(3, 2))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].title, "alert-0");
        assert!(!last.has_next);
    }

    #[tokio::test]
    async fn list_expired_returns_only_lapsed_active_alerts() {
        let (store, _dir) = setup().await;

        let mut lapsed = alert("lapsed", AlertSeverity::Low, "");
        lapsed.set_expiration(Utc::now() - Duration::minutes(1));
        store.create(&lapsed).await.unwrap();

        let mut future = alert("future", AlertSeverity::Low, "");
        future.set_expiration(Utc::now() + Duration::hours(1));
        store.create(&future).await.unwrap();

        store.create(&alert("no expiry", AlertSeverity::Low, "")).await.unwrap();

        let mut resolved = alert("resolved", AlertSeverity::Low, "");
        resolved.set_expiration(Utc::now() - Duration::minutes(1));
        resolved.resolve(Uuid::new_v4()).unwrap();
        store.create(&resolved).await.unwrap();

        let expired = store.list_expired().await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].title, "lapsed");
    }

    #[tokio::test]
    async fn counts_and_statistics() {
        let (store, _dir) = setup().await;

        store.create(&alert("a", AlertSeverity::Critical, "web-01")).await.unwrap();
        store.create(&alert("b", AlertSeverity::Critical, "web-01")).await.unwrap();
        let mut c = alert("c", AlertSeverity::Low, "db-01");
        store.create(&c).await.unwrap();
        c.acknowledge(Uuid::new_v4()).unwrap();
        store.update(&c).await.unwrap();
        store.create(&alert("d", AlertSeverity::Info, "")).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 4);
        assert_eq!(
            store.count_by_status(AlertStatus::Active).await.unwrap(),
            3
        );

        let stats = store.get_statistics().await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.active, 3);
        assert_eq!(stats.acknowledged, 1);
        assert_eq!(stats.resolved, 0);
        assert_eq!(stats.by_severity["critical"], 2);
        assert_eq!(stats.by_severity["low"], 1);
        // Empty sources are excluded from the per-source map.
        assert_eq!(stats.by_source.len(), 2);
        assert_eq!(stats.by_source["web-01"], 2);
    }

    #[tokio::test]
    async fn rule_lifecycle_round_trip() {
        let (store, _dir) = setup().await;
        let rule = AlertRule::new(
            "high cpu",
            vigil_core::rule::RuleCondition {
                metric: "cpu_usage".into(),
                operator: vigil_core::rule::ConditionOperator::GreaterOrEqual,
                threshold: 95.0,
                consecutive: 2,
            },
            AlertSeverity::High,
            15,
        )
        .unwrap();

        store.create_rule(&rule).await.unwrap();
        let got = store.get_rule(rule.id).await.unwrap();
        assert_eq!(got.name, "high cpu");
        assert_eq!(got.condition.operator, vigil_core::rule::ConditionOperator::GreaterOrEqual);
        assert!(got.enabled);

        store.set_rule_enabled(rule.id, false).await.unwrap();
        assert!(!store.get_rule(rule.id).await.unwrap().enabled);

        assert_eq!(store.list_rules().await.unwrap().len(), 1);
        store.delete_rule(rule.id).await.unwrap();
        assert!(store.list_rules().await.unwrap().is_empty());
    }
}
