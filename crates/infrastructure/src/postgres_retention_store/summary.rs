use cleaner_application::{RetentionSummary, TableRowCount};

use super::*;

impl PostgresRetentionStore {
    pub(super) async fn summarize_impl(
        &self,
        predicate: &RetentionPredicate,
    ) -> AppResult<RetentionSummary> {
        let root = self.schema.root_table();
        let filter = RootFilter::new(&root, predicate);

        let eligible_sql = format!(
            "SELECT COUNT(DISTINCT {cluster}) FROM {table} WHERE {clause}",
            cluster = root.cluster_column,
            table = root.name,
            clause = filter.clause,
        );
        let eligible_clusters = sqlx::query_scalar::<_, i64>(eligible_sql.as_str())
            .bind(filter.cutoff)
            .bind(filter.clusters.clone())
            .fetch_one(&self.pool)
            .await
            .map_err(|error| query_error("count eligible clusters in", root.name, error))?;

        let mut tables = Vec::with_capacity(self.schema.dependent_tables().len() + 1);
        for dependent in self.schema.dependent_tables() {
            let sql = format!(
                r#"
                SELECT COUNT(*)
                FROM {table}
                WHERE {column} IN (
                    SELECT {root_cluster} FROM {root_table} WHERE {clause}
                )
                "#,
                table = dependent.name,
                column = dependent.cluster_column,
                root_cluster = root.cluster_column,
                root_table = root.name,
                clause = filter.clause,
            );
            let rows = sqlx::query_scalar::<_, i64>(sql.as_str())
                .bind(filter.cutoff)
                .bind(filter.clusters.clone())
                .fetch_one(&self.pool)
                .await
                .map_err(|error| query_error("count rows in", dependent.name, error))?;

            tables.push(TableRowCount::new(dependent.name, row_count(rows)));
        }

        let root_sql = format!(
            "SELECT COUNT(*) FROM {table} WHERE {clause}",
            table = root.name,
            clause = filter.clause,
        );
        let root_rows = sqlx::query_scalar::<_, i64>(root_sql.as_str())
            .bind(filter.cutoff)
            .bind(filter.clusters)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| query_error("count rows in", root.name, error))?;
        tables.push(TableRowCount::new(root.name, row_count(root_rows)));

        Ok(RetentionSummary {
            eligible_clusters: row_count(eligible_clusters),
            tables,
        })
    }
}
