//! Raw CSV reading: header row plus text cells, nothing typed yet.

use std::io::Read;
use std::path::Path;

use crate::ImportError;

/// An uploaded file as rows of text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the header row.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Reads a comma-separated file with a header row.
///
/// A leading UTF-8 byte-order mark is stripped and header names are trimmed.
/// Rows may be ragged; missing trailing cells read as empty.
///
/// # Errors
///
/// Returns [`ImportError::Io`] if the input cannot be read as UTF-8 or
/// [`ImportError::Csv`] for malformed CSV.
pub fn read_csv(mut input: impl Read) -> Result<RawTable, ImportError> {
    let mut content = String::new();
    input
        .read_to_string(&mut content)
        .map_err(|source| ImportError::Io {
            path: "<input>".to_string(),
            source,
        })?;
    parse_csv(&content)
}

/// Reads a CSV file from disk. See [`read_csv`].
///
/// # Errors
///
/// Returns [`ImportError::Io`] naming `path` if it cannot be read, or
/// [`ImportError::Csv`] for malformed CSV.
pub fn read_csv_path(path: &Path) -> Result<RawTable, ImportError> {
    let content = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_csv(&content)
}

fn parse_csv(content: &str) -> Result<RawTable, ImportError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}
