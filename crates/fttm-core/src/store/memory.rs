//! In-process [`MetricStore`] for tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{ensure_kind, ListQuery, MetricStore, StoreError, UpsertCounts};
use crate::{MetricKind, MetricRecord, NaturalKey};

type Table = BTreeMap<(MetricKind, NaturalKey), MetricRecord>;

/// Map-backed store with optional injected failures.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Table>,
    lookup_failure: Mutex<Option<StoreError>>,
    write_failure: Mutex<Option<StoreError>>,
    lookup_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = MetricRecord>) -> Self {
        let store = Self::new();
        {
            let mut rows = store.rows.lock().unwrap_or_else(PoisonError::into_inner);
            for record in records {
                rows.insert((record.kind(), record.key()), record);
            }
        }
        store
    }

    /// Makes every subsequent `find_existing` call fail with `err`.
    pub fn fail_lookups(&self, err: StoreError) {
        *self
            .lookup_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(err);
    }

    /// Makes every subsequent `upsert` call fail with `err`.
    pub fn fail_writes(&self, err: StoreError) {
        *self
            .write_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(err);
    }

    #[must_use]
    pub fn get(&self, kind: MetricKind, key: &NaturalKey) -> Option<MetricRecord> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(kind, key.clone()))
            .cloned()
    }

    /// Number of stored rows of `kind`.
    #[must_use]
    pub fn count(&self, kind: MetricKind) -> usize {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    #[must_use]
    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

impl MetricStore for MemoryStore {
    async fn find_existing(
        &self,
        kind: MetricKind,
        keys: &[NaturalKey],
    ) -> Result<Vec<MetricRecord>, StoreError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self
            .lookup_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(err);
        }

        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<MetricRecord> = keys
            .iter()
            .filter_map(|key| rows.get(&(kind, key.clone())).cloned())
            .collect();
        found.sort_by_key(MetricRecord::key);
        found.dedup_by_key(|r| r.key());
        Ok(found)
    }

    async fn upsert(
        &self,
        kind: MetricKind,
        records: &[MetricRecord],
    ) -> Result<UpsertCounts, StoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self
            .write_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(err);
        }
        ensure_kind(kind, records)?;

        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let mut counts = UpsertCounts::default();
        for record in records {
            match rows.insert((kind, record.key()), record.clone()) {
                Some(_) => counts.updated += 1,
                None => counts.inserted += 1,
            }
        }
        Ok(counts)
    }

    async fn list(
        &self,
        kind: MetricKind,
        query: &ListQuery,
    ) -> Result<Vec<MetricRecord>, StoreError> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let mut selected: Vec<MetricRecord> = rows
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, record)| record)
            .filter(|r| query.brand.as_deref().is_none_or(|b| r.brand() == b))
            .filter(|r| query.range.is_none_or(|range| range.contains(r.order_date())))
            .cloned()
            .collect();
        drop(rows);

        selected.sort_by(|a, b| {
            a.order_date()
                .cmp(&b.order_date())
                .then_with(|| a.brand().cmp(b.brand()))
        });
        if query.descending {
            selected.reverse();
        }
        if let Some(limit) = query.limit {
            selected.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{AdsRecord, DateRange};

    fn ads(brand: &str, day: u32, clicks: i64) -> MetricRecord {
        MetricRecord::Ads(AdsRecord {
            brand: brand.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            clicks,
            impressions: clicks * 20,
        })
    }

    #[tokio::test]
    async fn upsert_counts_inserts_and_updates() {
        let store = MemoryStore::with_records([ads("FindHouse", 1, 100)]);
        let counts = store
            .upsert(MetricKind::Ads, &[ads("FindHouse", 1, 150), ads("FindHouse", 2, 5)])
            .await
            .unwrap();
        assert_eq!(counts, UpsertCounts { inserted: 1, updated: 1 });
        assert_eq!(store.count(MetricKind::Ads), 2);
    }

    #[tokio::test]
    async fn list_filters_orders_and_limits() {
        let store = MemoryStore::with_records([
            ads("FindHouse", 1, 1),
            ads("FindHouse", 3, 3),
            ads("CheckValue", 2, 2),
            ads("FindHouse", 5, 5),
        ]);
        let query = ListQuery {
            brand: Some("FindHouse".to_string()),
            range: Some(DateRange {
                start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            }),
            descending: true,
            limit: Some(1),
        };
        let rows = store.list(MetricKind::Ads, &query).await.unwrap();
        assert_eq!(rows, vec![ads("FindHouse", 3, 3)]);
    }

    #[tokio::test]
    async fn injected_lookup_failure_is_returned() {
        let store = MemoryStore::new();
        store.fail_lookups(StoreError::new("connection reset").transient());
        let err = store
            .find_existing(MetricKind::Ads, &[ads("FindHouse", 1, 1).key()])
            .await
            .unwrap_err();
        assert!(err.transient);
        assert_eq!(store.lookup_calls(), 1);
    }
}
