use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use cleaner_application::{
    CleanupMode, ClusterListSource, OldRecord, RetentionService, require_well_formed,
};
use cleaner_core::{AppError, AppResult};
use cleaner_domain::{ClusterNameSet, MaxAge, RetentionPredicate};
use cleaner_infrastructure::PostgresRetentionStore;

use crate::cleaner_config::CleanerConfig;
use crate::cli_flags::{CliFlags, Operation};


pub const VERSION_BANNER: &str = "Retention Cleaner version 1.0";
pub const AUTHORS_BANNER: &str = "Retention Cleaner maintainers";

/// Process exit status reported for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Ok = 0,
    Configuration = 1,
    Storage = 2,
    ClusterList = 3,
}

impl ExitStatus {
    pub fn for_error(error: &AppError) -> Self {
        match error {
            AppError::Configuration(_) => Self::Configuration,
            AppError::SourceAccess(_) | AppError::Validation(_) => Self::ClusterList,
            AppError::NotFound(_) | AppError::Internal(_) => Self::Storage,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

/// Returns the fixed text printed by the banner operations.
pub fn banner(operation: Operation) -> Option<&'static str> {
    match operation {
        Operation::ShowVersion => Some(VERSION_BANNER),
        Operation::ShowAuthors => Some(AUTHORS_BANNER),
        _ => None,
    }
}

/// Runs the operation selected by the flags.
pub async fn run(flags: &CliFlags, config: &CleanerConfig, now: DateTime<Utc>) -> AppResult<()> {
    let operation = flags.operation();
    match operation {
        Operation::ShowVersion | Operation::ShowAuthors => {
            if let Some(text) = banner(operation) {
                println!("{text}");
            }
            return Ok(());
        }
        Operation::ShowConfiguration => {
            show_configuration(config);
            return Ok(());
        }
        Operation::Vacuum => return connect_service(config).await?.vacuum().await,
        Operation::Summary | Operation::DisplayOld | Operation::Cleanup => {}
    }

    let max_age = match flags.max_age.as_deref() {
        Some(expression) => MaxAge::parse(expression)?,
        None => config.max_age()?,
    };
    let source = flags.cluster_source(config.cluster_list_file.as_ref());
    let clusters = resolve_clusters(&source, operation == Operation::Cleanup)?;
    let predicate = RetentionService::plan(now, &max_age, clusters);
    let service = connect_service(config).await?;

    match operation {
        Operation::Summary => {
            let summary = service.summarize(&predicate).await?;
            for entry in &summary.tables {
                info!(table = %entry.table, rows = entry.rows, "eligible rows");
            }
            Ok(())
        }
        Operation::Cleanup => {
            let mode = if flags.dry_run {
                CleanupMode::DryRun
            } else {
                CleanupMode::Execute
            };
            service.cleanup(&predicate, mode).await.map(|_| ())
        }
        _ => display_old_records(&service, &predicate, flags, now).await,
    }
}

/// Logs every configuration section without exposing the database password.
pub fn show_configuration(config: &CleanerConfig) {
    info!(
        driver = "postgres",
        schema = %config.schema,
        database_url = config.masked_database_url().as_deref().unwrap_or("<not set>"),
        max_connections = config.db_max_connections,
        "storage configuration"
    );
    info!(level = %config.log_level, "logging configuration");
    info!(
        records_max_age = %config.max_age_expression,
        cluster_list_file = config
            .cluster_list_file
            .as_deref()
            .map_or_else(|| "<not set>".to_owned(), |path| path.display().to_string()),
        "cleaner configuration"
    );
}

/// Resolves the cluster list; cleanup refuses to run on malformed input.
fn resolve_clusters(source: &ClusterListSource, strict: bool) -> AppResult<ClusterNameSet> {
    let resolution = source.resolve()?;
    if resolution.has_malformed() {
        warn!(
            source = %source,
            malformed = resolution.malformed_count(),
            valid = resolution.clusters().len(),
            "cluster list contains malformed entries"
        );
    }

    if strict {
        return require_well_formed(resolution);
    }

    let (clusters, _) = resolution.into_parts();
    Ok(clusters)
}

async fn display_old_records(
    service: &RetentionService,
    predicate: &RetentionPredicate,
    flags: &CliFlags,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let records = service.list_old_records(predicate, flags.limit()).await?;
    for record in &records {
        info!(
            cluster = %record.cluster,
            reported_at = %record.reported_at.to_rfc3339(),
            age_days = record.age_in_days(now),
            "old record"
        );
    }
    info!(count = records.len(), "old records listed");

    if let Some(path) = flags.output.as_deref() {
        write_records(path, &records)?;
        info!(path = %path.display(), "old records exported");
    }

    Ok(())
}

/// Writes records as a pretty-printed JSON array.
pub fn write_records(path: &Path, records: &[OldRecord]) -> AppResult<()> {
    let file = File::create(path).map_err(|error| {
        AppError::Internal(format!("failed to create '{}': {error}", path.display()))
    })?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records).map_err(|error| {
        AppError::Internal(format!(
            "failed to write old records to '{}': {error}",
            path.display()
        ))
    })?;

    writer.flush().map_err(|error| {
        AppError::Internal(format!("failed to flush '{}': {error}", path.display()))
    })
}

async fn connect_service(config: &CleanerConfig) -> AppResult<RetentionService> {
    let pool = connect_pool(config).await?;
    Ok(RetentionService::new(Arc::new(PostgresRetentionStore::new(
        pool,
        config.schema,
    ))))
}

async fn connect_pool(config: &CleanerConfig) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(config.required_database_url()?)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}
