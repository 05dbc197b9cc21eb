use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use cleaner_application::{
    CleanupReport, OldRecord, RetentionStore, RetentionSummary, TableRowCount,
};
use cleaner_core::{AppError, AppResult};
use cleaner_domain::{RetentionPredicate, StorageSchema};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone)]
struct StoredReport {
    cluster: String,
    reported_at: DateTime<Utc>,
    last_checked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct InMemoryTables {
    reports: Vec<StoredReport>,
    dependents: HashMap<&'static str, Vec<String>>,
}

impl InMemoryTables {
    fn expired_clusters(&self, predicate: &RetentionPredicate) -> BTreeSet<String> {
        self.reports
            .iter()
            .filter(|report| predicate.is_eligible(report.cluster.as_str(), report.reported_at))
            .map(|report| report.cluster.clone())
            .collect()
    }
}

/// In-memory retention store following the same table graph as Postgres.
#[derive(Debug)]
pub struct InMemoryRetentionStore {
    schema: StorageSchema,
    tables: RwLock<InMemoryTables>,
}

impl InMemoryRetentionStore {
    /// Creates an empty store for the given schema.
    #[must_use]
    pub fn new(schema: StorageSchema) -> Self {
        let dependents = schema
            .dependent_tables()
            .iter()
            .map(|table| (table.name, Vec::new()))
            .collect();

        Self {
            schema,
            tables: RwLock::new(InMemoryTables {
                reports: Vec::new(),
                dependents,
            }),
        }
    }

    /// Adds one root-table report.
    pub async fn insert_report(
        &self,
        cluster: impl Into<String>,
        reported_at: DateTime<Utc>,
        last_checked_at: Option<DateTime<Utc>>,
    ) {
        self.tables.write().await.reports.push(StoredReport {
            cluster: cluster.into(),
            reported_at,
            last_checked_at,
        });
    }

    /// Adds one row to a dependent table of the schema.
    pub async fn insert_dependent_row(
        &self,
        table: &str,
        cluster: impl Into<String>,
    ) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let rows = tables.dependents.get_mut(table).ok_or_else(|| {
            AppError::NotFound(format!(
                "table '{table}' is not part of schema '{}'",
                self.schema
            ))
        })?;

        rows.push(cluster.into());
        Ok(())
    }

    /// Returns the current row count of any participating table.
    pub async fn row_count(&self, table: &str) -> usize {
        let tables = self.tables.read().await;
        if table == self.schema.root_table().name {
            return tables.reports.len();
        }

        tables.dependents.get(table).map_or(0, Vec::len)
    }
}

#[async_trait]
impl RetentionStore for InMemoryRetentionStore {
    async fn summarize(&self, predicate: &RetentionPredicate) -> AppResult<RetentionSummary> {
        let tables = self.tables.read().await;
        let clusters = tables.expired_clusters(predicate);

        let mut counts: Vec<TableRowCount> = self
            .schema
            .dependent_tables()
            .iter()
            .map(|table| {
                let rows = tables.dependents.get(table.name).map_or(0, |rows| {
                    rows.iter().filter(|cluster| clusters.contains(*cluster)).count()
                });
                TableRowCount::new(table.name, rows as u64)
            })
            .collect();

        let root_rows = tables
            .reports
            .iter()
            .filter(|report| predicate.is_eligible(report.cluster.as_str(), report.reported_at))
            .count();
        counts.push(TableRowCount::new(self.schema.root_table().name, root_rows as u64));

        Ok(RetentionSummary {
            eligible_clusters: clusters.len() as u64,
            tables: counts,
        })
    }

    async fn list_old_records(
        &self,
        predicate: &RetentionPredicate,
        limit: usize,
    ) -> AppResult<Vec<OldRecord>> {
        let tables = self.tables.read().await;
        let mut records: Vec<OldRecord> = tables
            .reports
            .iter()
            .filter(|report| predicate.is_eligible(report.cluster.as_str(), report.reported_at))
            .map(|report| OldRecord {
                cluster: report.cluster.clone(),
                reported_at: report.reported_at,
                last_checked_at: report.last_checked_at,
            })
            .collect();

        records.sort_by(|left, right| {
            left.reported_at
                .cmp(&right.reported_at)
                .then_with(|| left.cluster.cmp(&right.cluster))
        });
        records.truncate(limit);

        Ok(records)
    }

    async fn delete_records(&self, predicate: &RetentionPredicate) -> AppResult<CleanupReport> {
        let mut tables = self.tables.write().await;
        let clusters = tables.expired_clusters(predicate);
        let mut report = CleanupReport::default();

        for table in self.schema.dependent_tables() {
            let removed = match tables.dependents.get_mut(table.name) {
                Some(rows) => {
                    let before = rows.len();
                    rows.retain(|cluster| !clusters.contains(cluster));
                    before - rows.len()
                }
                None => 0,
            };
            report.tables.push(TableRowCount::new(table.name, removed as u64));
        }

        let before = tables.reports.len();
        tables.reports.retain(|stored| {
            !predicate.is_eligible(stored.cluster.as_str(), stored.reported_at)
        });
        let removed = before - tables.reports.len();
        report.tables.push(TableRowCount::new(
            self.schema.root_table().name,
            removed as u64,
        ));

        Ok(report)
    }

    async fn vacuum(&self) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        tables.reports.shrink_to_fit();
        for rows in tables.dependents.values_mut() {
            rows.shrink_to_fit();
        }

        Ok(())
    }
}
