//! PostgreSQL-backed retention store.
//!
//! Eligibility is decided on the schema's root table; dependent tables lose
//! every row of a cluster whose root records aged out. Table and column names
//! come from the static schema graph, never from user input.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cleaner_application::{CleanupReport, OldRecord, RetentionStore, RetentionSummary};
use cleaner_core::{AppError, AppResult};
use cleaner_domain::{ClusterNameSet, RetentionPredicate, RootTable, StorageSchema};

mod cleanup;
mod old_records;
mod summary;

#[cfg(test)]
mod tests;

/// PostgreSQL implementation of the retention store port.
#[derive(Clone)]
pub struct PostgresRetentionStore {
    pool: PgPool,
    schema: StorageSchema,
}

impl PostgresRetentionStore {
    /// Creates a store with the provided connection pool and schema.
    #[must_use]
    pub fn new(pool: PgPool, schema: StorageSchema) -> Self {
        Self { pool, schema }
    }

    /// Returns the schema this store operates on.
    #[must_use]
    pub fn schema(&self) -> StorageSchema {
        self.schema
    }
}

/// Query parameters shared by every statement that filters the root table.
///
/// `$1` is the cutoff, `$2` the optional cluster allow-list.
struct RootFilter {
    cutoff: DateTime<Utc>,
    clusters: Option<Vec<String>>,
    clause: String,
}

impl RootFilter {
    fn new(root: &RootTable, predicate: &RetentionPredicate) -> Self {
        Self {
            cutoff: predicate.cutoff(),
            clusters: predicate.clusters().map(ClusterNameSet::to_strings),
            clause: format!(
                "{reported_at} < $1 AND ($2::TEXT[] IS NULL OR {cluster} = ANY($2))",
                reported_at = root.reported_at_column,
                cluster = root.cluster_column,
            ),
        }
    }
}

fn row_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

fn query_error(action: &str, table: &str, error: sqlx::Error) -> AppError {
    AppError::Internal(format!("failed to {action} '{table}': {error}"))
}

#[async_trait]
impl RetentionStore for PostgresRetentionStore {
    async fn summarize(&self, predicate: &RetentionPredicate) -> AppResult<RetentionSummary> {
        self.summarize_impl(predicate).await
    }

    async fn list_old_records(
        &self,
        predicate: &RetentionPredicate,
        limit: usize,
    ) -> AppResult<Vec<OldRecord>> {
        self.list_old_records_impl(predicate, limit).await
    }

    async fn delete_records(&self, predicate: &RetentionPredicate) -> AppResult<CleanupReport> {
        self.delete_records_impl(predicate).await
    }

    async fn vacuum(&self) -> AppResult<()> {
        let statement = format!("VACUUM ANALYZE {}", self.schema.deletion_order().join(", "));
        sqlx::raw_sql(statement.as_str())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to vacuum tables: {error}")))?;

        Ok(())
    }
}
