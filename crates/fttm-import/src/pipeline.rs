//! Import pipeline orchestration.
//!
//! [`prepare`] runs everything up to the operator decision; [`commit`] writes
//! a [`Resolution`]. Between the two the caller either prompts or applies a
//! default [`Strategy`]. [`run_headless`] chains both with a fixed strategy.

use std::time::Duration;

use fttm_core::{AppConfig, MetricKind, MetricStore};
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    detect_duplicates, DuplicateCheckError, DuplicateSet, ImportBatch, ImportError, ParseWarning,
    RawTable, ReconcileState, RejectedRow, Resolution, Strategy, WriteOutcome, WritePlan,
};

const DEFAULT_DUPLICATE_CHECK_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub duplicate_check_timeout: Duration,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            duplicate_check_timeout: Duration::from_secs(DEFAULT_DUPLICATE_CHECK_TIMEOUT_SECS),
        }
    }
}

impl ImportOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            duplicate_check_timeout: Duration::from_secs(config.duplicate_check_timeout_secs),
        }
    }
}

/// What an import did, or would do on a dry run.
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub batch_id: Uuid,
    pub kind: MetricKind,
    pub rows_read: usize,
    pub rejected: Vec<RejectedRow>,
    pub warnings: Vec<ParseWarning>,
    pub plan: WritePlan,
    pub duplicates: usize,
    pub skipped: usize,
    /// Records handed to the writer after reconciliation.
    pub to_write: usize,
    pub check_warning: Option<DuplicateCheckError>,
    pub written: WriteOutcome,
    pub dry_run: bool,
}

impl ImportReport {
    /// Report for a resolution that was not written.
    #[must_use]
    pub fn planned(resolution: &Resolution) -> Self {
        let batch = &resolution.batch;
        Self {
            batch_id: batch.id,
            kind: batch.kind,
            rows_read: batch.rows_read,
            rejected: batch.rejected.clone(),
            warnings: batch.warnings.clone(),
            plan: resolution.plan,
            duplicates: resolution.duplicates,
            skipped: resolution.skipped,
            to_write: batch.records.len(),
            check_warning: resolution.check_warning.clone(),
            written: WriteOutcome::default(),
            dry_run: true,
        }
    }

    /// `true` when nothing usable was uploaded.
    #[must_use]
    pub fn is_empty_upload(&self) -> bool {
        self.rows_read == 0
    }
}

fn import_span(batch: &ImportBatch) -> tracing::Span {
    tracing::info_span!("import", batch_id = %batch.id, kind = %batch.kind)
}

/// Validates, coerces and checks a table for duplicates.
///
/// A table without usable rows resolves immediately with nothing to write.
///
/// # Errors
///
/// Returns [`ImportError::Schema`] if required columns are missing. A failed
/// duplicate check is not an error; it resolves to write-all with
/// [`Resolution::check_warning`] set.
pub async fn prepare<S: MetricStore>(
    store: &S,
    kind: MetricKind,
    table: &RawTable,
    options: ImportOptions,
) -> Result<ReconcileState, ImportError> {
    let batch = ImportBatch::from_table(kind, table)?;
    let span = import_span(&batch);

    async move {
        tracing::info!(
            rows = batch.rows_read,
            records = batch.records.len(),
            rejected = batch.rejected.len(),
            warnings = batch.warnings.len(),
            "import batch assembled"
        );

        if batch.is_empty() {
            return Ok(ReconcileState::from_check(batch, Ok(DuplicateSet::default())));
        }

        let check = detect_duplicates(store, &batch, options.duplicate_check_timeout).await;
        Ok(ReconcileState::from_check(batch, check))
    }
    .instrument(span)
    .await
}

/// Writes a resolution and reports the outcome.
///
/// # Errors
///
/// Returns [`ImportError::Write`] if the store rejects the batch.
pub async fn commit<S: MetricStore>(
    store: &S,
    resolution: Resolution,
) -> Result<ImportReport, ImportError> {
    let span = import_span(&resolution.batch);

    async move {
        let written = crate::write_resolution(store, &resolution).await?;
        let mut report = ImportReport::planned(&resolution);
        report.written = written;
        report.dry_run = false;
        Ok::<_, ImportError>(report)
    }
    .instrument(span)
    .await
}

/// Runs the whole pipeline, answering any duplicate prompt with `strategy`.
///
/// # Errors
///
/// See [`prepare`] and [`commit`].
pub async fn run_headless<S: MetricStore>(
    store: &S,
    kind: MetricKind,
    table: &RawTable,
    options: ImportOptions,
    strategy: Strategy,
) -> Result<ImportReport, ImportError> {
    let state = prepare(store, kind, table, options).await?;
    commit(store, state.resolve_with(strategy)).await
}
