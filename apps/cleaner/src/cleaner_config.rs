use std::env;
use std::path::PathBuf;

use cleaner_core::{AppError, AppResult, NonEmptyString};
use cleaner_domain::{MaxAge, StorageSchema};
use tracing_subscriber::EnvFilter;
use url::Url;


const DEFAULT_MAX_AGE: &str = "90 days";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 2;
const MASKED_PASSWORD: &str = "*****";

/// Runtime configuration read from the process environment.
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    pub database_url: Option<NonEmptyString>,
    pub schema: StorageSchema,
    pub max_age_expression: String,
    pub cluster_list_file: Option<PathBuf>,
    pub log_level: String,
    pub db_max_connections: u32,
}

impl CleanerConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let database_url = optional_value(&lookup, "DATABASE_URL")
            .map(NonEmptyString::new)
            .transpose()?;

        let schema = optional_value(&lookup, "CLEANER_SCHEMA")
            .map(|value| value.parse::<StorageSchema>())
            .transpose()?
            .unwrap_or_default();

        let max_age_expression = optional_value(&lookup, "CLEANER_MAX_AGE")
            .unwrap_or_else(|| DEFAULT_MAX_AGE.to_owned());

        let cluster_list_file = optional_value(&lookup, "CLEANER_CLUSTER_LIST_FILE").map(PathBuf::from);

        let log_level = optional_value(&lookup, "CLEANER_LOG_LEVEL")
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned());
        EnvFilter::try_new(log_level.as_str()).map_err(|error| {
            AppError::Configuration(format!(
                "invalid CLEANER_LOG_LEVEL value '{log_level}': {error}"
            ))
        })?;

        let db_max_connections = match optional_value(&lookup, "CLEANER_DB_MAX_CONNECTIONS") {
            Some(value) => value.parse::<u32>().map_err(|error| {
                AppError::Configuration(format!(
                    "invalid CLEANER_DB_MAX_CONNECTIONS value '{value}': {error}"
                ))
            })?,
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };
        if db_max_connections == 0 {
            return Err(AppError::Configuration(
                "CLEANER_DB_MAX_CONNECTIONS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            schema,
            max_age_expression,
            cluster_list_file,
            log_level,
            db_max_connections,
        })
    }

    /// Parses `CLEANER_MAX_AGE`; unused when `--max-age` is given.
    pub fn max_age(&self) -> AppResult<MaxAge> {
        MaxAge::parse(self.max_age_expression.as_str())
    }

    /// Returns the database URL or a configuration error when it is unset.
    pub fn required_database_url(&self) -> AppResult<&str> {
        self.database_url
            .as_ref()
            .map(NonEmptyString::as_str)
            .ok_or_else(|| AppError::Configuration("DATABASE_URL is required".to_owned()))
    }

    /// Database URL with any password replaced, safe to log.
    pub fn masked_database_url(&self) -> Option<String> {
        self.database_url
            .as_ref()
            .map(|url| mask_password(url.as_str()))
    }
}

pub fn init_tracing(default_directive: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional_value(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn mask_password(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() && url.set_password(Some(MASKED_PASSWORD)).is_err() {
                return "<unprintable database url>".to_owned();
            }
            url.to_string()
        }
        Err(_) => "<unparseable database url>".to_owned(),
    }
}
