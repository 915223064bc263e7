//! Cell coercion into typed dates and non-negative integers.
//!
//! Malformed cells never abort an import. A bad date becomes `None` and the
//! row is later rejected; a bad number becomes `0`. Each coercion yields a
//! [`ParseWarning`] that is logged and counted in the import report.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use fttm_core::MetricKind;

use crate::ValidatedTable;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
/// Tried last; `%y` reads `24` as 2024.
const SHORT_YEAR_FORMATS: [&str; 1] = ["%m/%d/%y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningReason {
    /// Blank cell. Dates become null, numbers become 0.
    Empty,
    UnparseableDate,
    /// Not a number; stored as 0.
    NonNumeric,
    /// Fractional part dropped.
    Truncated,
    /// Below zero; stored as 0.
    Negative,
    /// Too large for a 64-bit integer; stored as 0.
    OutOfRange,
}

impl std::fmt::Display for WarningReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            WarningReason::Empty => "empty cell",
            WarningReason::UnparseableDate => "not a recognised date",
            WarningReason::NonNumeric => "not a number, stored as 0",
            WarningReason::Truncated => "decimal truncated",
            WarningReason::Negative => "negative, stored as 0",
            WarningReason::OutOfRange => "too large, stored as 0",
        };
        f.write_str(text)
    }
}

/// One coerced cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based data row (the header is not counted).
    pub row: usize,
    pub column: String,
    pub raw: String,
    pub reason: WarningReason,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row {}, column {}: '{}' {}",
            self.row, self.column, self.raw, self.reason
        )
    }
}

/// 2^63, the first float past `i64::MAX`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// `%Y` also matches one or two digits, which would turn `24` into year 24.
fn has_full_year(date: &NaiveDate) -> bool {
    date.year() >= 1000
}

/// Parses a calendar date, returning `None` rather than guessing.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY`, `MM/DD/YY` and ISO
/// date-times, which are truncated to their date. Other short-year forms
/// such as `24-01-05` are rejected.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| {
            NaiveDate::parse_from_str(raw, fmt)
                .ok()
                .filter(has_full_year)
        })
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
                .filter(has_full_year)
        })
        .or_else(|| {
            SHORT_YEAR_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Coerces a cell into a non-negative integer.
///
/// Returns the value and, when anything was changed, the reason.
#[must_use]
pub fn coerce_int(raw: &str) -> (i64, Option<WarningReason>) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return (0, Some(WarningReason::Empty));
    }

    if let Ok(value) = trimmed.parse::<i64>() {
        return if value < 0 {
            (0, Some(WarningReason::Negative))
        } else {
            (value, None)
        };
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            let whole = value.trunc();
            if whole < 0.0 {
                (0, Some(WarningReason::Negative))
            } else if whole >= I64_BOUND {
                (0, Some(WarningReason::OutOfRange))
            } else {
                #[allow(clippy::cast_possible_truncation)]
                let whole_int = whole as i64;
                let reason = ((value - whole).abs() > 0.0).then_some(WarningReason::Truncated);
                (whole_int, reason)
            }
        }
        _ => (0, Some(WarningReason::NonNumeric)),
    }
}

/// A row after coercion; `dates` still carries nulls for rejection downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercedRow {
    /// 1-based data row.
    pub row_number: usize,
    pub brand: String,
    pub dates: Vec<Option<NaiveDate>>,
    pub values: Vec<i64>,
}

/// Coerces every row of a validated table for `kind`.
///
/// Column positions follow [`MetricKind::expected_columns`]: brand, then the
/// date columns, then the integer columns.
#[must_use]
pub fn coerce_rows(
    kind: MetricKind,
    table: &ValidatedTable,
) -> (Vec<CoercedRow>, Vec<ParseWarning>) {
    let date_columns = kind.date_columns();
    let int_columns = kind.int_columns();
    let mut rows = Vec::with_capacity(table.len());
    let mut warnings = Vec::new();

    for (idx, cells) in table.rows.iter().enumerate() {
        let row_number = idx + 1;
        let cell = |pos: usize| cells.get(pos).map_or("", String::as_str);
        let mut note = |column: &str, raw: &str, reason: WarningReason| {
            let warning = ParseWarning {
                row: row_number,
                column: column.to_string(),
                raw: raw.to_string(),
                reason,
            };
            tracing::warn!(
                row = row_number,
                column,
                raw,
                reason = %reason,
                "coerced import cell"
            );
            warnings.push(warning);
        };

        let brand = cell(0).trim().to_string();

        let dates = date_columns
            .iter()
            .enumerate()
            .map(|(offset, column)| {
                let raw = cell(1 + offset);
                let parsed = parse_date(raw);
                if parsed.is_none() {
                    let reason = if raw.trim().is_empty() {
                        WarningReason::Empty
                    } else {
                        WarningReason::UnparseableDate
                    };
                    note(column, raw, reason);
                }
                parsed
            })
            .collect();

        let values = int_columns
            .iter()
            .enumerate()
            .map(|(offset, column)| {
                let raw = cell(1 + date_columns.len() + offset);
                let (value, reason) = coerce_int(raw);
                if let Some(reason) = reason {
                    note(column, raw, reason);
                }
                value
            })
            .collect();

        rows.push(CoercedRow {
            row_number,
            brand,
            dates,
            values,
        });
    }

    (rows, warnings)
}
