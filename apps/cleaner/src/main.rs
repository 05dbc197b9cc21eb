//! Retention cleaner for aggregator report storage.

#![forbid(unsafe_code)]

mod cleaner_config;
mod cli_flags;
mod operations;

use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing::{error, info};

use crate::cleaner_config::{CleanerConfig, init_tracing};
use crate::cli_flags::CliFlags;
use crate::operations::ExitStatus;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let flags = CliFlags::parse();
    let operation = flags.operation();
    if let Some(text) = operations::banner(operation) {
        println!("{text}");
        return ExitStatus::Ok.into();
    }

    let config = CleanerConfig::load();
    init_tracing(
        config
            .as_ref()
            .map_or("info", |config| config.log_level.as_str()),
    );

    let config = match config {
        Ok(config) => config,
        Err(error) => {
            error!(error = %error, "failed to load configuration");
            return ExitStatus::Configuration.into();
        }
    };

    match operations::run(&flags, &config, Utc::now()).await {
        Ok(()) => {
            info!(operation = ?operation, "retention cleaner finished");
            ExitStatus::Ok.into()
        }
        Err(error) => {
            let status = ExitStatus::for_error(&error);
            error!(
                operation = ?operation,
                exit_status = status as u8,
                error = %error,
                "retention cleaner failed"
            );
            status.into()
        }
    }
}
