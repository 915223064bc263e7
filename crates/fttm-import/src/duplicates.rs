//! Duplicate detection: which candidate keys already exist in the store.

use std::collections::BTreeMap;
use std::time::Duration;

use fttm_core::{MetricRecord, MetricStore, NaturalKey};

use crate::{DuplicateCheckError, ImportBatch};

/// Stored records that collide with the batch, keyed by natural key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateSet {
    existing: BTreeMap<NaturalKey, MetricRecord>,
}

impl DuplicateSet {
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = MetricRecord>) -> Self {
        Self {
            existing: records.into_iter().map(|r| (r.key(), r)).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, key: &NaturalKey) -> bool {
        self.existing.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &NaturalKey) -> Option<&MetricRecord> {
        self.existing.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.existing.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.existing.is_empty()
    }

    /// Stored records in key order.
    pub fn records(&self) -> impl Iterator<Item = &MetricRecord> {
        self.existing.values()
    }
}

/// Looks up every distinct key of `batch` in one store call.
///
/// # Errors
///
/// Returns [`DuplicateCheckError::Timeout`] if the lookup exceeds `timeout`
/// and [`DuplicateCheckError::Store`] if the store reports a failure.
pub async fn detect_duplicates<S: MetricStore>(
    store: &S,
    batch: &ImportBatch,
    timeout: Duration,
) -> Result<DuplicateSet, DuplicateCheckError> {
    let keys = batch.keys();
    if keys.is_empty() {
        return Ok(DuplicateSet::default());
    }

    let lookup = store.find_existing(batch.kind, &keys);
    let found = tokio::time::timeout(timeout, lookup)
        .await
        .map_err(|_| DuplicateCheckError::Timeout(timeout))?
        .map_err(DuplicateCheckError::Store)?;

    tracing::debug!(
        batch_id = %batch.id,
        candidates = keys.len(),
        duplicates = found.len(),
        "duplicate check complete"
    );

    Ok(DuplicateSet::from_records(found))
}
