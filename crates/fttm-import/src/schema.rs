//! Column presence check and projection onto the required column set.

use crate::{RawTable, SchemaError};

/// Rows projected onto the required columns, in required order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ValidatedTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Checks that every `required` column is present and drops the rest.
///
/// # Errors
///
/// Returns [`SchemaError`] listing every missing column, in `required` order.
pub fn validate_schema(table: &RawTable, required: &[&str]) -> Result<ValidatedTable, SchemaError> {
    let mut indices = Vec::with_capacity(required.len());
    let mut missing = Vec::new();

    for &name in required {
        match table.column_index(name) {
            Some(idx) => indices.push(idx),
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(SchemaError { missing });
    }

    let rows = table
        .rows
        .iter()
        .map(|row| {
            indices
                .iter()
                .map(|&i| row.get(i).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(ValidatedTable {
        columns: required.iter().map(|c| (*c).to_string()).collect(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| (*h).to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| (*c).to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn reports_exactly_the_missing_columns_in_order() {
        let raw = table(&["date", "brand"], &[]);
        let err = validate_schema(&raw, &["brand", "date", "clicks", "impressions"]).unwrap_err();
        assert_eq!(err.missing, vec!["clicks", "impressions"]);
    }

    #[test]
    fn projects_and_reorders_columns() {
        let raw = table(
            &["notes", "indexed", "date", "brand"],
            &[&["x", "450", "2024-01-01", "FindHouse"]],
        );
        let validated = validate_schema(&raw, &["brand", "date", "indexed"]).unwrap();
        assert_eq!(validated.columns, vec!["brand", "date", "indexed"]);
        assert_eq!(validated.rows, vec![vec!["FindHouse", "2024-01-01", "450"]]);
    }

    #[test]
    fn short_rows_pad_with_empty_cells() {
        let raw = table(&["brand", "date", "rank"], &[&["FindHouse", "2024-01-01"]]);
        let validated = validate_schema(&raw, &["brand", "date", "rank"]).unwrap();
        assert_eq!(validated.rows[0][2], "");
    }
}
