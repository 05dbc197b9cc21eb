use std::path::PathBuf;

use clap::Parser;

use cleaner_application::{ClusterListSource, MAX_OLD_RECORDS_LIMIT};

#[cfg(test)]
mod tests;

/// Command line flags for the retention cleaner
#[derive(Parser, Debug)]
#[command(about = "Removes outdated cluster reports from the aggregator storage", long_about = None)]
pub struct CliFlags {
    /// Print the version and exit
    #[arg(long)]
    pub show_version: bool,

    /// Print the authors and exit
    #[arg(long)]
    pub show_authors: bool,

    /// Log the active configuration and exit
    #[arg(long)]
    pub show_configuration: bool,

    /// Count the rows a cleanup would delete
    #[arg(long)]
    pub summary: bool,

    /// List records older than the max age (default operation)
    #[arg(long)]
    pub display_old: bool,

    /// Delete records older than the max age
    #[arg(long)]
    pub cleanup: bool,

    /// Vacuum the affected tables
    #[arg(long)]
    pub vacuum: bool,

    /// Report what cleanup would delete without deleting anything
    #[arg(long, requires = "cleanup")]
    pub dry_run: bool,

    /// Override the configured max age, e.g. "3 days" or "72h"
    #[arg(long, value_name = "DURATION")]
    pub max_age: Option<String>,

    /// Comma-separated cluster identifiers; takes precedence over the cluster list file
    #[arg(long, value_name = "ID,ID,...")]
    pub clusters: Option<String>,

    /// Write old records as JSON into this file
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Maximum number of old records to list
    #[arg(
        long,
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..=MAX_OLD_RECORDS_LIMIT as u64)
    )]
    pub limit: u64,
}

/// The single operation selected for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ShowVersion,
    ShowAuthors,
    ShowConfiguration,
    Summary,
    DisplayOld,
    Cleanup,
    Vacuum,
}

impl CliFlags {
    /// Picks the first requested operation in declaration order.
    pub fn operation(&self) -> Operation {
        [
            (self.show_version, Operation::ShowVersion),
            (self.show_authors, Operation::ShowAuthors),
            (self.show_configuration, Operation::ShowConfiguration),
            (self.summary, Operation::Summary),
            (self.display_old, Operation::DisplayOld),
            (self.cleanup, Operation::Cleanup),
            (self.vacuum, Operation::Vacuum),
        ]
        .into_iter()
        .find_map(|(requested, operation)| requested.then_some(operation))
        .unwrap_or(Operation::DisplayOld)
    }

    /// Chooses where cluster identifiers come from for this run.
    pub fn cluster_source(&self, configured_file: Option<&PathBuf>) -> ClusterListSource {
        match (&self.clusters, configured_file) {
            (Some(raw), _) => ClusterListSource::Arguments(split_cluster_tokens(raw)),
            (None, Some(path)) => ClusterListSource::File(path.clone()),
            (None, None) => ClusterListSource::Unrestricted,
        }
    }

    pub fn limit(&self) -> usize {
        usize::try_from(self.limit).unwrap_or(MAX_OLD_RECORDS_LIMIT)
    }
}

/// Splits a comma-separated flag value into candidates.
///
/// Empty tokens are kept so they are counted as malformed.
pub fn split_cluster_tokens(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_owned).collect()
}
