//! CSV import pipeline for FTT metrics.
//!
//! Reads an uploaded file, checks it against the record kind's columns,
//! coerces cells into typed values, looks up colliding natural keys in the
//! store, and writes the reconciled batch in one upsert:
//!
//! raw file → schema → coerce → duplicate check → (operator decision)
//! → reconcile → upsert writer.

pub mod batch;
pub mod coerce;
pub mod duplicates;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod schema;
pub mod table;
pub mod template;
pub mod writer;

pub use batch::{ImportBatch, RejectReason, RejectedRow};
pub use coerce::{coerce_int, parse_date, ParseWarning, WarningReason};
pub use duplicates::{detect_duplicates, DuplicateSet};
pub use error::{DuplicateCheckError, ImportError, SchemaError, WriteError};
pub use pipeline::{commit, prepare, run_headless, ImportOptions, ImportReport};
pub use reconcile::{PendingDecision, ReconcileState, Resolution, Strategy, WritePlan};
pub use schema::{validate_schema, ValidatedTable};
pub use table::{read_csv, read_csv_path, RawTable};
pub use template::template_csv;
pub use writer::{collapse_last_wins, write_resolution, WriteOutcome};
