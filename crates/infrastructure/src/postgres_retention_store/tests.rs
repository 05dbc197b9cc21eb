use chrono::{DateTime, Duration, Utc};
use cleaner_application::RetentionStore;
use cleaner_domain::{ClusterName, ClusterNameSet, MaxAge, RetentionPredicate, StorageSchema};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresRetentionStore;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres retention tests: {error}");
    }

    Some(pool)
}

fn random_cluster() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn scoped_predicate(clusters: &[&str]) -> RetentionPredicate {
    let max_age = MaxAge::parse("3 days").unwrap_or_else(|_| panic!("test"));
    let clusters: ClusterNameSet = clusters
        .iter()
        .map(|value| ClusterName::new(*value).unwrap_or_else(|_| panic!("test")))
        .collect();
    RetentionPredicate::build(Utc::now(), &max_age, clusters)
}

async fn insert_report(pool: &PgPool, cluster: &str, reported_at: DateTime<Utc>) {
    let insert = sqlx::query(
        r#"
            INSERT INTO report (org_id, cluster, report, reported_at, last_checked_at)
            VALUES ($1, $2, $3, $4, $4)
            "#,
    )
    .bind(1_i32)
    .bind(cluster)
    .bind("{}")
    .bind(reported_at)
    .execute(pool)
    .await;

    assert!(insert.is_ok());
}

async fn insert_rule_hit(pool: &PgPool, cluster: &str, rule: &str) {
    let insert = sqlx::query(
        r#"
            INSERT INTO rule_hit (org_id, cluster_id, rule_fqdn, error_key)
            VALUES ($1, $2, $3, $4)
            "#,
    )
    .bind(1_i32)
    .bind(cluster)
    .bind(rule)
    .bind("ERROR_KEY")
    .execute(pool)
    .await;

    assert!(insert.is_ok());
}

async fn count_rows(pool: &PgPool, table: &str, column: &str, cluster: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE {column} = $1");
    sqlx::query_scalar::<_, i64>(sql.as_str())
        .bind(cluster)
        .fetch_one(pool)
        .await
        .unwrap_or_else(|error| panic!("failed to count rows in {table}: {error}"))
}

#[tokio::test]
async fn cleanup_deletes_expired_cluster_across_dependents() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let store = PostgresRetentionStore::new(pool.clone(), StorageSchema::OcpRecommendations);
    let stale = random_cluster();
    let fresh = random_cluster();

    insert_report(&pool, stale.as_str(), Utc::now() - Duration::days(30)).await;
    insert_report(&pool, fresh.as_str(), Utc::now() - Duration::hours(1)).await;
    insert_rule_hit(&pool, stale.as_str(), "ccx_rules.first").await;
    insert_rule_hit(&pool, stale.as_str(), "ccx_rules.second").await;
    insert_rule_hit(&pool, fresh.as_str(), "ccx_rules.first").await;

    let predicate = scoped_predicate(&[stale.as_str(), fresh.as_str()]);

    let summary = store
        .summarize(&predicate)
        .await
        .unwrap_or_else(|error| panic!("summary failed: {error}"));
    assert_eq!(summary.eligible_clusters, 1);

    let report = store
        .delete_records(&predicate)
        .await
        .unwrap_or_else(|error| panic!("cleanup failed: {error}"));
    assert_eq!(report.tables, summary.tables);
    assert_eq!(report.total_deleted(), 3);

    assert_eq!(count_rows(&pool, "report", "cluster", stale.as_str()).await, 0);
    assert_eq!(count_rows(&pool, "rule_hit", "cluster_id", stale.as_str()).await, 0);
    assert_eq!(count_rows(&pool, "report", "cluster", fresh.as_str()).await, 1);
    assert_eq!(count_rows(&pool, "rule_hit", "cluster_id", fresh.as_str()).await, 1);
}

#[tokio::test]
async fn old_records_respect_cluster_scope_and_order() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let store = PostgresRetentionStore::new(pool.clone(), StorageSchema::OcpRecommendations);
    let oldest = random_cluster();
    let older = random_cluster();
    let outside = random_cluster();

    insert_report(&pool, oldest.as_str(), Utc::now() - Duration::days(60)).await;
    insert_report(&pool, older.as_str(), Utc::now() - Duration::days(10)).await;
    insert_report(&pool, outside.as_str(), Utc::now() - Duration::days(90)).await;

    let records = store
        .list_old_records(&scoped_predicate(&[oldest.as_str(), older.as_str()]), 10)
        .await
        .unwrap_or_else(|error| panic!("listing failed: {error}"));

    let clusters: Vec<&str> = records.iter().map(|record| record.cluster.as_str()).collect();
    assert_eq!(clusters, vec![oldest.as_str(), older.as_str()]);
    assert!(records.iter().all(|record| record.last_checked_at.is_some()));

    let cleanup = store
        .delete_records(&scoped_predicate(&[oldest.as_str(), older.as_str(), outside.as_str()]))
        .await;
    assert!(cleanup.is_ok());
}

#[tokio::test]
async fn vacuum_runs_outside_a_transaction() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let store = PostgresRetentionStore::new(pool, StorageSchema::OcpRecommendations);
    let vacuum = store.vacuum().await;
    assert!(vacuum.is_ok(), "vacuum failed: {vacuum:?}");
}
