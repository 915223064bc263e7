use fttm_core::StoreError;
use thiserror::Error;

/// Required columns absent from an uploaded file, in required order.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("missing columns: {}", .missing.join(", "))]
pub struct SchemaError {
    pub missing: Vec<String>,
}

/// The duplicate lookup could not complete. Non-fatal: the import carries on
/// as if no duplicates were known.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DuplicateCheckError {
    #[error("duplicate check timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("duplicate check failed: {}", .0.diagnostic())]
    Store(StoreError),
}

/// The store rejected the batch as a whole.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("write rejected: {}", .0.diagnostic())]
pub struct WriteError(pub StoreError);

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_every_missing_column() {
        let err = SchemaError {
            missing: vec!["clicks".to_string(), "impressions".to_string()],
        };
        assert_eq!(err.to_string(), "missing columns: clicks, impressions");
    }

    #[test]
    fn write_error_shows_store_diagnostic() {
        let err = WriteError(
            StoreError::new("new row violates check constraint")
                .with_detail("23514 ads_metrics_clicks_check"),
        );
        assert_eq!(
            err.to_string(),
            "write rejected: new row violates check constraint (23514 ads_metrics_clicks_check)"
        );
    }
}
