//! Import batch assembly: validated, coerced rows turned into typed records.

use std::collections::HashSet;

use fttm_core::{CoreError, MetricKind, MetricRecord, NaturalKey};
use uuid::Uuid;

use crate::coerce::{coerce_rows, CoercedRow};
use crate::{validate_schema, ParseWarning, RawTable, SchemaError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// A key date was blank or unparseable.
    MissingDate { column: String },
    MissingBrand,
    /// Cell count does not fit the kind's schema.
    Malformed,
    /// A value below its field's minimum, such as a blank rank read as 0.
    OutOfRange { field: &'static str, value: i64 },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::MissingDate { column } => write!(f, "no usable {column}"),
            RejectReason::MissingBrand => f.write_str("no brand"),
            RejectReason::Malformed => f.write_str("malformed row"),
            RejectReason::OutOfRange { field, value } => {
                write!(f, "{field} out of range ({value})")
            }
        }
    }
}

/// A data row excluded from the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based data row.
    pub row_number: usize,
    pub reason: RejectReason,
}

/// Candidate records from one uploaded file.
///
/// Lives only for the duration of one import. `id` tags log lines.
#[derive(Debug, Clone)]
pub struct ImportBatch {
    pub id: Uuid,
    pub kind: MetricKind,
    /// Data rows in the file, including rejected ones.
    pub rows_read: usize,
    pub records: Vec<MetricRecord>,
    pub rejected: Vec<RejectedRow>,
    pub warnings: Vec<ParseWarning>,
}

impl ImportBatch {
    /// Validates, coerces and assembles a raw table.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if any required column is missing; nothing is
    /// coerced in that case.
    pub fn from_table(kind: MetricKind, table: &RawTable) -> Result<Self, SchemaError> {
        let validated = validate_schema(table, &kind.expected_columns())?;
        let (rows, warnings) = coerce_rows(kind, &validated);
        Ok(Self::assemble(kind, rows, warnings))
    }

    /// Builds records from coerced rows, rejecting rows with a null date, a
    /// blank brand or a value the store would refuse.
    #[must_use]
    pub fn assemble(
        kind: MetricKind,
        rows: Vec<CoercedRow>,
        warnings: Vec<ParseWarning>,
    ) -> Self {
        let rows_read = rows.len();
        let mut records = Vec::with_capacity(rows_read);
        let mut rejected = Vec::new();

        for row in rows {
            match build_record(kind, row.brand, &row.dates, &row.values) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    tracing::warn!(row = row.row_number, %reason, "import row rejected");
                    rejected.push(RejectedRow {
                        row_number: row.row_number,
                        reason,
                    });
                }
            }
        }

        Self {
            id: Uuid::new_v4(),
            kind,
            rows_read,
            records,
            rejected,
            warnings,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct natural keys in first-seen order.
    #[must_use]
    pub fn keys(&self) -> Vec<NaturalKey> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(MetricRecord::key)
            .filter(|key| seen.insert(key.clone()))
            .collect()
    }
}

fn build_record(
    kind: MetricKind,
    brand: String,
    dates: &[Option<chrono::NaiveDate>],
    values: &[i64],
) -> Result<MetricRecord, RejectReason> {
    if brand.is_empty() {
        return Err(RejectReason::MissingBrand);
    }

    let mut parsed = Vec::with_capacity(dates.len());
    for (date, column) in dates.iter().zip(kind.date_columns()) {
        match date {
            Some(date) => parsed.push(*date),
            None => {
                return Err(RejectReason::MissingDate {
                    column: (*column).to_string(),
                })
            }
        }
    }

    let record = MetricRecord::from_columns(kind, brand, &parsed, values)
        .ok_or(RejectReason::Malformed)?;
    match record.validate() {
        Err(CoreError::OutOfRange { field, value, .. }) => {
            Err(RejectReason::OutOfRange { field, value })
        }
        Err(_) => Err(RejectReason::Malformed),
        Ok(()) => Ok(record),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::read_csv;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn null_date_rows_are_rejected_with_row_number() {
        let table = read_csv(
            "brand,date,indexed\n\
             FindHouse,2024-01-01,450\n\
             FindHouse,not-a-date,460\n\
             ,2024-01-03,1\n"
                .as_bytes(),
        )
        .unwrap();

        let batch = ImportBatch::from_table(MetricKind::Index, &table).unwrap();

        assert_eq!(batch.rows_read, 3);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(
            batch.rejected,
            vec![
                RejectedRow {
                    row_number: 2,
                    reason: RejectReason::MissingDate {
                        column: "date".to_string()
                    },
                },
                RejectedRow {
                    row_number: 3,
                    reason: RejectReason::MissingBrand,
                },
            ]
        );
        assert_eq!(batch.warnings.len(), 1);
    }

    #[test]
    fn traffic_rejects_when_either_window_date_is_missing() {
        let table = read_csv(
            "brand,start_date,end_date,users\nCheckValue,2024-01-01,,1200\n".as_bytes(),
        )
        .unwrap();

        let batch = ImportBatch::from_table(MetricKind::Traffic, &table).unwrap();

        assert!(batch.is_empty());
        assert_eq!(
            batch.rejected[0].reason,
            RejectReason::MissingDate {
                column: "end_date".to_string()
            }
        );
    }

    #[test]
    fn schema_failure_stops_before_coercion() {
        let table = read_csv("brand,date\nFindHouse,2024-01-01\n".as_bytes()).unwrap();
        let err = ImportBatch::from_table(MetricKind::Ads, &table).unwrap_err();
        assert_eq!(err.missing, vec!["clicks", "impressions"]);
    }

    #[test]
    fn keys_are_distinct_in_first_seen_order() {
        let table = read_csv(
            "brand,date,rank\n\
             FindHouse,2024-01-02,3\n\
             FindHouse,2024-01-01,4\n\
             FindHouse,2024-01-02,5\n"
                .as_bytes(),
        )
        .unwrap();

        let batch = ImportBatch::from_table(MetricKind::Rank, &table).unwrap();

        assert_eq!(
            batch.keys(),
            vec![
                NaturalKey::dated("FindHouse", d("2024-01-02")),
                NaturalKey::dated("FindHouse", d("2024-01-01")),
            ]
        );
    }

    #[test]
    fn blank_or_zero_rank_is_rejected() {
        let table = read_csv(
            "brand,date,rank\n\
             FindHouse,2024-01-01,\n\
             FindHouse,2024-01-02,0\n\
             FindHouse,2024-01-03,4\n"
                .as_bytes(),
        )
        .unwrap();
        let batch = ImportBatch::from_table(MetricKind::Rank, &table).unwrap();

        assert_eq!(batch.rows_read, 3);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].values(), vec![("rank", 4)]);
        let rejected: Vec<usize> = batch.rejected.iter().map(|r| r.row_number).collect();
        assert_eq!(rejected, vec![1, 2]);
        assert_eq!(
            batch.rejected[0].reason,
            RejectReason::OutOfRange {
                field: "rank",
                value: 0
            }
        );
        assert_eq!(batch.rejected[1].reason.to_string(), "rank out of range (0)");
    }

    #[test]
    fn zero_counts_are_still_accepted() {
        let table = read_csv("brand,date,indexed\nFindHouse,2024-01-01,\n".as_bytes()).unwrap();
        let batch = ImportBatch::from_table(MetricKind::Index, &table).unwrap();
        assert!(batch.rejected.is_empty());
        assert_eq!(batch.records[0].values(), vec![("indexed", 0)]);
    }
}
