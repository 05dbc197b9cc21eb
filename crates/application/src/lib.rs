//! Application services and ports.

#![forbid(unsafe_code)]

pub mod cluster_list;
mod retention_ports;
mod retention_service;

pub use cluster_list::{
    ClusterListSource, classify_candidates, require_well_formed, resolve_from_argument,
    resolve_from_arguments, resolve_from_file,
};
pub use retention_ports::{
    CleanupReport, OldRecord, RetentionStore, RetentionSummary, TableRowCount,
};
pub use retention_service::{CleanupMode, MAX_OLD_RECORDS_LIMIT, RetentionService};
