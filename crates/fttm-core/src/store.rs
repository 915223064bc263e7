//! The backing-store contract the import pipeline and reports depend on.

#[cfg(feature = "memory-store")]
pub mod memory;

use thiserror::Error;

use crate::{DateRange, MetricKind, MetricRecord, NaturalKey};

/// Structured failure reported by a backing store.
///
/// `detail` carries whatever diagnostic payload the store attaches (for
/// Postgres: SQLSTATE code and violated constraint).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
    pub detail: Option<String>,
    /// Whether retrying the same call may succeed.
    pub transient: bool,
}

impl StoreError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
            transient: false,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Message followed by the detail payload when present.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{} ({detail})", self.message),
            None => self.message.clone(),
        }
    }
}

/// Selection parameters for [`MetricStore::list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Equality filter on `brand`.
    pub brand: Option<String>,
    /// Inclusive filter on the kind's order column.
    pub range: Option<DateRange>,
    /// Newest first when `true`.
    pub descending: bool,
    pub limit: Option<i64>,
}

impl ListQuery {
    #[must_use]
    pub fn latest(brand: impl Into<String>, limit: i64) -> Self {
        Self {
            brand: Some(brand.into()),
            range: None,
            descending: true,
            limit: Some(limit),
        }
    }
}

/// Row counts reported by an upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCounts {
    pub inserted: u64,
    pub updated: u64,
}

impl UpsertCounts {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.inserted + self.updated
    }
}

/// Table-oriented store holding one table per [`MetricKind`].
///
/// Implementations must treat [`MetricStore::upsert`] as one logical batch:
/// either every record is written or the call fails as a whole.
#[allow(async_fn_in_trait)]
pub trait MetricStore {
    /// Returns the stored records whose natural key matches any of `keys`,
    /// at most one per key.
    async fn find_existing(
        &self,
        kind: MetricKind,
        keys: &[NaturalKey],
    ) -> Result<Vec<MetricRecord>, StoreError>;

    /// Inserts new keys and replaces every value attribute of existing ones.
    ///
    /// `records` must not repeat a key and must all be of `kind`.
    async fn upsert(
        &self,
        kind: MetricKind,
        records: &[MetricRecord],
    ) -> Result<UpsertCounts, StoreError>;

    async fn list(
        &self,
        kind: MetricKind,
        query: &ListQuery,
    ) -> Result<Vec<MetricRecord>, StoreError>;
}

/// Rejects records that do not belong to `kind`.
///
/// # Errors
///
/// Returns a non-transient [`StoreError`] naming the first mismatched key.
pub fn ensure_kind(kind: MetricKind, records: &[MetricRecord]) -> Result<(), StoreError> {
    match records.iter().find(|r| r.kind() != kind) {
        Some(bad) => Err(StoreError::new(format!(
            "record {} is a {} record, expected {kind}",
            bad.key(),
            bad.kind()
        ))),
        None => Ok(()),
    }
}
