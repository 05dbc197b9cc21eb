//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_retention_store;
mod postgres_retention_store;

pub use in_memory_retention_store::InMemoryRetentionStore;
pub use postgres_retention_store::PostgresRetentionStore;
