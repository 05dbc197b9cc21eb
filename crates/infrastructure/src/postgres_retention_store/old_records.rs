use cleaner_application::OldRecord;

use super::*;

#[derive(Debug, sqlx::FromRow)]
struct OldRecordRow {
    cluster: String,
    reported_at: DateTime<Utc>,
    last_checked_at: Option<DateTime<Utc>>,
}

impl PostgresRetentionStore {
    pub(super) async fn list_old_records_impl(
        &self,
        predicate: &RetentionPredicate,
        limit: usize,
    ) -> AppResult<Vec<OldRecord>> {
        let root = self.schema.root_table();
        let filter = RootFilter::new(&root, predicate);
        let limit = i64::try_from(limit)
            .map_err(|_| AppError::Configuration(format!("limit {limit} is out of range")))?;

        let sql = format!(
            r#"
            SELECT
                {cluster} AS cluster,
                {reported_at} AS reported_at,
                {last_checked_at} AS last_checked_at
            FROM {table}
            WHERE {clause}
            ORDER BY {reported_at} ASC, {cluster} ASC
            LIMIT $3
            "#,
            cluster = root.cluster_column,
            reported_at = root.reported_at_column,
            last_checked_at = root.last_checked_at_column,
            table = root.name,
            clause = filter.clause,
        );

        let rows = sqlx::query_as::<_, OldRecordRow>(sql.as_str())
            .bind(filter.cutoff)
            .bind(filter.clusters)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| query_error("list old records in", root.name, error))?;

        Ok(rows
            .into_iter()
            .map(|row| OldRecord {
                cluster: row.cluster,
                reported_at: row.reported_at,
                last_checked_at: row.last_checked_at,
            })
            .collect())
    }
}
