//! Postgres persistence for metric records.

pub mod metrics;
pub mod pool;
pub mod retry;
pub mod store;

pub use metrics::{find_existing_records, list_records, upsert_records};
pub use pool::{connect_pool, ping, run_migrations, PoolConfig};
pub use retry::RetryPolicy;
pub use store::PgMetricStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Rejected before reaching the database.
    #[error("invalid batch: {0}")]
    InvalidBatch(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
