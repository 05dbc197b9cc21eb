use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use cleaner_core::AppResult;
use cleaner_domain::RetentionPredicate;

/// Storage port that applies a retention predicate.
///
/// Implementations own the table dependency order and transaction boundaries.
#[async_trait]
pub trait RetentionStore: Send + Sync {
    /// Counts the rows each participating table would lose.
    async fn summarize(&self, predicate: &RetentionPredicate) -> AppResult<RetentionSummary>;

    /// Lists root-table records older than the cutoff, oldest first.
    async fn list_old_records(
        &self,
        predicate: &RetentionPredicate,
        limit: usize,
    ) -> AppResult<Vec<OldRecord>>;

    /// Deletes every eligible row across the dependency graph atomically.
    async fn delete_records(&self, predicate: &RetentionPredicate) -> AppResult<CleanupReport>;

    /// Reclaims storage after large deletions.
    async fn vacuum(&self) -> AppResult<()>;
}

/// Row count attributed to one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRowCount {
    /// Qualified table name.
    pub table: String,
    /// Number of rows.
    pub rows: u64,
}

impl TableRowCount {
    /// Creates a row count entry.
    #[must_use]
    pub fn new(table: impl Into<String>, rows: u64) -> Self {
        Self {
            table: table.into(),
            rows,
        }
    }
}

/// Rows that a predicate selects, per table, without deleting anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetentionSummary {
    /// Distinct clusters whose root records are eligible.
    pub eligible_clusters: u64,
    /// Eligible rows per table in deletion order.
    pub tables: Vec<TableRowCount>,
}

impl RetentionSummary {
    /// Returns the number of eligible rows across all tables.
    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|entry| entry.rows).sum()
    }
}

/// Result of one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Rows removed per table in deletion order.
    pub tables: Vec<TableRowCount>,
    /// Whether the pass only reported what it would have deleted.
    pub dry_run: bool,
}

impl CleanupReport {
    /// Returns the number of rows deleted across all tables.
    #[must_use]
    pub fn total_deleted(&self) -> u64 {
        self.tables.iter().map(|entry| entry.rows).sum()
    }
}

/// Root-table record older than the retention cutoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OldRecord {
    /// Owning cluster identifier.
    pub cluster: String,
    /// When the report was produced.
    pub reported_at: DateTime<Utc>,
    /// When the report was last confirmed, if ever.
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl OldRecord {
    /// Returns the whole days elapsed between the report time and `now`.
    #[must_use]
    pub fn age_in_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.reported_at).num_days()
    }
}
