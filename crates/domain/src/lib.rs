//! Domain values and invariants of the retention cleaner.

#![forbid(unsafe_code)]

mod cluster;
mod retention;
mod schema;

pub use cluster::{ClusterListResolution, ClusterName, ClusterNameSet, is_valid_cluster_name};
pub use retention::{MaxAge, RetentionPredicate};
pub use schema::{DependentTable, RootTable, StorageSchema};
