//! Upsert writer: persists a resolved batch in one store call.

use std::collections::HashMap;

use fttm_core::{MetricRecord, MetricStore, UpsertCounts};

use crate::{Resolution, WriteError};

/// What the writer did with a resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub counts: UpsertCounts,
    /// Earlier candidates superseded by a later row with the same key.
    pub collapsed: usize,
}

/// Collapses repeated keys, keeping the last occurrence's values at the
/// position where the key first appeared.
#[must_use]
pub fn collapse_last_wins(records: &[MetricRecord]) -> Vec<MetricRecord> {
    let mut position = HashMap::with_capacity(records.len());
    let mut collapsed: Vec<MetricRecord> = Vec::with_capacity(records.len());

    for record in records {
        match position.get(&record.key()) {
            Some(&idx) => collapsed[idx] = record.clone(),
            None => {
                position.insert(record.key(), collapsed.len());
                collapsed.push(record.clone());
            }
        }
    }

    collapsed
}

/// Writes every record of `resolution` as one upsert batch.
///
/// An empty resolution returns without touching the store.
///
/// # Errors
///
/// Returns [`WriteError`] carrying the store's diagnostic if the batch is
/// rejected; nothing is written in that case.
pub async fn write_resolution<S: MetricStore>(
    store: &S,
    resolution: &Resolution,
) -> Result<WriteOutcome, WriteError> {
    let records = collapse_last_wins(resolution.records());
    let collapsed = resolution.records().len() - records.len();

    if records.is_empty() {
        return Ok(WriteOutcome {
            counts: UpsertCounts::default(),
            collapsed,
        });
    }

    let counts = store
        .upsert(resolution.batch.kind, &records)
        .await
        .map_err(WriteError)?;

    tracing::info!(
        batch_id = %resolution.batch.id,
        kind = %resolution.batch.kind,
        inserted = counts.inserted,
        updated = counts.updated,
        collapsed,
        "import batch written"
    );

    Ok(WriteOutcome { counts, collapsed })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use fttm_core::{IndexRecord, MemoryStore, MetricKind, StoreError};

    use super::*;
    use crate::{DuplicateSet, ImportBatch, ReconcileState};

    fn index(day: u32, indexed: i64) -> MetricRecord {
        MetricRecord::Index(IndexRecord {
            brand: "FindHouse".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            indexed,
        })
    }

    fn resolution(records: Vec<MetricRecord>) -> Resolution {
        let batch = ImportBatch {
            id: uuid::Uuid::new_v4(),
            kind: MetricKind::Index,
            rows_read: records.len(),
            records,
            rejected: Vec::new(),
            warnings: Vec::new(),
        };
        ReconcileState::from_check(batch, Ok(DuplicateSet::default()))
            .resolve_with(crate::Strategy::Overwrite)
    }

    #[test]
    fn last_occurrence_wins_at_first_position() {
        let collapsed = collapse_last_wins(&[index(2, 1), index(1, 5), index(2, 3)]);
        assert_eq!(collapsed, vec![index(2, 3), index(1, 5)]);
    }

    #[tokio::test]
    async fn writes_collapsed_batch_in_one_call() {
        let store = MemoryStore::with_records([index(1, 400)]);
        let batch = vec![index(1, 450), index(2, 10), index(2, 20)];
        let outcome = write_resolution(&store, &resolution(batch)).await.unwrap();

        assert_eq!(outcome.counts, UpsertCounts { inserted: 1, updated: 1 });
        assert_eq!(outcome.collapsed, 1);
        assert_eq!(store.upsert_calls(), 1);
        assert_eq!(store.get(MetricKind::Index, &index(2, 0).key()), Some(index(2, 20)));
    }

    #[tokio::test]
    async fn empty_resolution_skips_the_store() {
        let store = MemoryStore::new();
        let outcome = write_resolution(&store, &resolution(Vec::new())).await.unwrap();
        assert_eq!(outcome, WriteOutcome::default());
        assert_eq!(store.upsert_calls(), 0);
    }

    #[tokio::test]
    async fn rejected_batch_carries_store_diagnostic() {
        let store = MemoryStore::new();
        store.fail_writes(StoreError::new("value too large").with_detail("22003"));

        let err = write_resolution(&store, &resolution(vec![index(1, 1)]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "write rejected: value too large (22003)");
        assert_eq!(store.count(MetricKind::Index), 0);
    }
}
