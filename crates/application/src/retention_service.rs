//! Retention application service.
//!
//! Turns a maximum age and a resolved cluster set into a
//! [`RetentionPredicate`] and hands it to a [`RetentionStore`] for
//! reporting or deletion.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use cleaner_core::{AppError, AppResult};
use cleaner_domain::{ClusterNameSet, MaxAge, RetentionPredicate};

use crate::retention_ports::{CleanupReport, OldRecord, RetentionStore, RetentionSummary};


/// Upper bound for one old-record listing.
pub const MAX_OLD_RECORDS_LIMIT: usize = 100_000;

/// Whether a cleanup pass deletes rows or only reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
    /// Delete eligible rows.
    Execute,
    /// Count eligible rows and leave the store untouched.
    DryRun,
}

/// Application service for retention reporting and cleanup.
#[derive(Clone)]
pub struct RetentionService {
    store: Arc<dyn RetentionStore>,
}

impl RetentionService {
    /// Creates a service from a store implementation.
    #[must_use]
    pub fn new(store: Arc<dyn RetentionStore>) -> Self {
        Self { store }
    }

    /// Builds the deletion scope for one run. `now` is supplied by the caller.
    #[must_use]
    pub fn plan(
        now: DateTime<Utc>,
        max_age: &MaxAge,
        clusters: ClusterNameSet,
    ) -> RetentionPredicate {
        let predicate = RetentionPredicate::build(now, max_age, clusters);

        info!(
            max_age = %max_age,
            cutoff = %predicate.cutoff().to_rfc3339(),
            clusters = predicate.clusters().map_or(0, ClusterNameSet::len),
            global = predicate.is_global(),
            "retention scope resolved"
        );

        predicate
    }

    /// Counts rows the predicate selects in every participating table.
    pub async fn summarize(&self, predicate: &RetentionPredicate) -> AppResult<RetentionSummary> {
        let summary = self.store.summarize(predicate).await?;

        info!(
            eligible_clusters = summary.eligible_clusters,
            eligible_rows = summary.total_rows(),
            "retention summary computed"
        );

        Ok(summary)
    }

    /// Lists root records older than the cutoff.
    pub async fn list_old_records(
        &self,
        predicate: &RetentionPredicate,
        limit: usize,
    ) -> AppResult<Vec<OldRecord>> {
        if limit == 0 || limit > MAX_OLD_RECORDS_LIMIT {
            return Err(AppError::Configuration(format!(
                "old record limit must be between 1 and {MAX_OLD_RECORDS_LIMIT}, got {limit}"
            )));
        }

        let records = self.store.list_old_records(predicate, limit).await?;
        if records.len() == limit {
            warn!(limit, "old record listing reached its limit");
        }

        Ok(records)
    }

    /// Runs one cleanup pass.
    pub async fn cleanup(
        &self,
        predicate: &RetentionPredicate,
        mode: CleanupMode,
    ) -> AppResult<CleanupReport> {
        let report = match mode {
            CleanupMode::DryRun => {
                let summary = self.store.summarize(predicate).await?;
                CleanupReport {
                    tables: summary.tables,
                    dry_run: true,
                }
            }
            CleanupMode::Execute => self.store.delete_records(predicate).await?,
        };

        for entry in &report.tables {
            info!(
                table = %entry.table,
                rows = entry.rows,
                dry_run = report.dry_run,
                "table cleaned"
            );
        }

        info!(
            total_deleted = report.total_deleted(),
            dry_run = report.dry_run,
            "cleanup finished"
        );

        Ok(report)
    }

    /// Reclaims storage space.
    pub async fn vacuum(&self) -> AppResult<()> {
        self.store.vacuum().await?;
        info!("vacuum finished");
        Ok(())
    }
}
