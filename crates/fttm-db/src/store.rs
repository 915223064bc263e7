//! Postgres-backed [`MetricStore`].

use fttm_core::{
    ListQuery, MetricKind, MetricRecord, MetricStore, NaturalKey, StoreError, UpsertCounts,
};
use sqlx::PgPool;

use crate::retry::{is_retriable, retry_with_backoff, RetryPolicy};
use crate::{metrics, DbError};

/// [`MetricStore`] over a shared connection pool. Every call is retried on
/// transient failures according to its [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct PgMetricStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgMetricStore {
    #[must_use]
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        let transient = is_retriable(&err);
        let mut store_err = match &err {
            DbError::Sqlx(sqlx::Error::Database(db)) => {
                let detail = match (db.code(), db.constraint()) {
                    (Some(code), Some(constraint)) => Some(format!("{code} {constraint}")),
                    (Some(code), None) => Some(code.into_owned()),
                    (None, Some(constraint)) => Some(constraint.to_string()),
                    (None, None) => None,
                };
                let base = StoreError::new(db.message());
                match detail {
                    Some(detail) => base.with_detail(detail),
                    None => base,
                }
            }
            other => StoreError::new(other.to_string()),
        };
        store_err.transient = transient;
        store_err
    }
}

impl MetricStore for PgMetricStore {
    async fn find_existing(
        &self,
        kind: MetricKind,
        keys: &[NaturalKey],
    ) -> Result<Vec<MetricRecord>, StoreError> {
        retry_with_backoff(self.retry, "find_existing", || {
            metrics::find_existing_records(&self.pool, kind, keys)
        })
        .await
        .map_err(StoreError::from)
    }

    async fn upsert(
        &self,
        kind: MetricKind,
        records: &[MetricRecord],
    ) -> Result<UpsertCounts, StoreError> {
        retry_with_backoff(self.retry, "upsert", || {
            metrics::upsert_records(&self.pool, kind, records)
        })
        .await
        .map_err(StoreError::from)
    }

    async fn list(
        &self,
        kind: MetricKind,
        query: &ListQuery,
    ) -> Result<Vec<MetricRecord>, StoreError> {
        retry_with_backoff(self.retry, "list", || {
            metrics::list_records(&self.pool, kind, query)
        })
        .await
        .map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_batch_maps_to_permanent_store_error() {
        let err = StoreError::from(DbError::InvalidBatch("key repeats".to_string()));
        assert_eq!(err.message, "invalid batch: key repeats");
        assert!(err.detail.is_none());
        assert!(!err.transient);
    }

    #[test]
    fn pool_timeout_maps_to_transient_store_error() {
        let err = StoreError::from(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        assert!(err.transient);
    }
}
