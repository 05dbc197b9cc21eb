use chrono::{DateTime, Duration, TimeZone, Utc};

use cleaner_application::RetentionStore;
use cleaner_core::AppError;
use cleaner_domain::{ClusterName, ClusterNameSet, MaxAge, RetentionPredicate, StorageSchema};

use super::InMemoryRetentionStore;

const STALE: &str = "5d5892d4-1f74-4ccf-91af-548dfc9767aa";
const STALE_OTHER: &str = "00000000-0000-0000-0000-000000000000";
const FRESH: &str = "11111111-1111-1111-1111-111111111111";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("test"))
}

fn predicate(clusters: &[&str]) -> RetentionPredicate {
    let max_age = MaxAge::parse("3 days").unwrap_or_else(|_| panic!("test"));
    let clusters: ClusterNameSet = clusters
        .iter()
        .map(|value| ClusterName::new(*value).unwrap_or_else(|_| panic!("test")))
        .collect();
    RetentionPredicate::build(now(), &max_age, clusters)
}

async fn seeded_store() -> InMemoryRetentionStore {
    let store = InMemoryRetentionStore::new(StorageSchema::OcpRecommendations);
    store
        .insert_report(STALE, now() - Duration::days(30), Some(now() - Duration::days(20)))
        .await;
    store
        .insert_report(STALE_OTHER, now() - Duration::days(4), None)
        .await;
    store
        .insert_report(FRESH, now() - Duration::hours(1), Some(now()))
        .await;

    for cluster in [STALE, STALE, STALE_OTHER, FRESH] {
        let inserted = store.insert_dependent_row("rule_hit", cluster).await;
        assert!(inserted.is_ok());
    }
    for cluster in [STALE, FRESH] {
        let inserted = store.insert_dependent_row("report_info", cluster).await;
        assert!(inserted.is_ok());
    }

    store
}

#[tokio::test]
async fn unknown_dependent_table_is_rejected() {
    let store = InMemoryRetentionStore::new(StorageSchema::DvoRecommendations);
    let inserted = store.insert_dependent_row("rule_hit", STALE).await;
    assert!(matches!(inserted, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn global_cleanup_removes_dependents_before_root() {
    let store = seeded_store().await;

    let report = store.delete_records(&predicate(&[])).await;
    assert!(report.is_ok());
    let report = report.unwrap_or_default();

    let order: Vec<&str> = report.tables.iter().map(|entry| entry.table.as_str()).collect();
    assert_eq!(order, StorageSchema::OcpRecommendations.deletion_order());
    assert_eq!(report.total_deleted(), 6);

    assert_eq!(store.row_count("report").await, 1);
    assert_eq!(store.row_count("rule_hit").await, 1);
    assert_eq!(store.row_count("report_info").await, 1);
}

#[tokio::test]
async fn scoped_cleanup_leaves_other_stale_clusters_alone() {
    let store = seeded_store().await;

    let report = store
        .delete_records(&predicate(&[STALE]))
        .await
        .unwrap_or_default();
    assert_eq!(report.total_deleted(), 4);

    assert_eq!(store.row_count("report").await, 2);
    assert_eq!(store.row_count("rule_hit").await, 2);
}

#[tokio::test]
async fn fresh_member_cluster_is_not_deleted() {
    let store = seeded_store().await;

    let report = store
        .delete_records(&predicate(&[FRESH]))
        .await
        .unwrap_or_default();
    assert_eq!(report.total_deleted(), 0);
    assert_eq!(store.row_count("report").await, 3);
}

#[tokio::test]
async fn summary_matches_subsequent_cleanup() {
    let store = seeded_store().await;
    let predicate = predicate(&[]);

    let summary = store.summarize(&predicate).await.unwrap_or_default();
    assert_eq!(summary.eligible_clusters, 2);

    let report = store.delete_records(&predicate).await.unwrap_or_default();
    assert_eq!(summary.tables, report.tables);
}

#[tokio::test]
async fn old_records_are_listed_oldest_first_and_limited() {
    let store = seeded_store().await;

    let records = store
        .list_old_records(&predicate(&[]), 10)
        .await
        .unwrap_or_default();
    let clusters: Vec<&str> = records.iter().map(|record| record.cluster.as_str()).collect();
    assert_eq!(clusters, vec![STALE, STALE_OTHER]);
    assert_eq!(records[0].age_in_days(now()), 30);

    let limited = store
        .list_old_records(&predicate(&[]), 1)
        .await
        .unwrap_or_default();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn vacuum_keeps_rows() {
    let store = seeded_store().await;
    assert!(store.vacuum().await.is_ok());
    assert_eq!(store.row_count("report").await, 3);
}
