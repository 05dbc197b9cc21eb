use cleaner_application::TableRowCount;
use tracing::debug;

use super::*;

impl PostgresRetentionStore {
    pub(super) async fn delete_records_impl(
        &self,
        predicate: &RetentionPredicate,
    ) -> AppResult<CleanupReport> {
        let root = self.schema.root_table();
        let filter = RootFilter::new(&root, predicate);

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start cleanup transaction: {error}"))
        })?;

        let lock_sql = format!(
            "SELECT {cluster} FROM {table} WHERE {clause} FOR UPDATE",
            cluster = root.cluster_column,
            table = root.name,
            clause = filter.clause,
        );
        let mut expired = sqlx::query_scalar::<_, String>(lock_sql.as_str())
            .bind(filter.cutoff)
            .bind(filter.clusters)
            .fetch_all(&mut *transaction)
            .await
            .map_err(|error| query_error("lock eligible rows in", root.name, error))?;
        expired.sort_unstable();
        expired.dedup();

        let mut report = CleanupReport::default();
        for dependent in self.schema.dependent_tables() {
            let sql = format!(
                "DELETE FROM {table} WHERE {column} = ANY($1)",
                table = dependent.name,
                column = dependent.cluster_column,
            );
            let result = sqlx::query(sql.as_str())
                .bind(expired.as_slice())
                .execute(&mut *transaction)
                .await
                .map_err(|error| query_error("delete rows from", dependent.name, error))?;

            debug!(
                table = dependent.name,
                rows = result.rows_affected(),
                "deleted dependent rows"
            );
            report
                .tables
                .push(TableRowCount::new(dependent.name, result.rows_affected()));
        }

        let root_sql = format!(
            "DELETE FROM {table} WHERE {cluster} = ANY($1) AND {reported_at} < $2",
            table = root.name,
            cluster = root.cluster_column,
            reported_at = root.reported_at_column,
        );
        let result = sqlx::query(root_sql.as_str())
            .bind(expired.as_slice())
            .bind(filter.cutoff)
            .execute(&mut *transaction)
            .await
            .map_err(|error| query_error("delete rows from", root.name, error))?;
        report
            .tables
            .push(TableRowCount::new(root.name, result.rows_affected()));

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit cleanup transaction: {error}"))
        })?;

        Ok(report)
    }
}
