//! Reconciliation of an import batch against the stored rows it collides with.
//!
//! ```text
//! Collecting (ImportBatch)
//!   ├─ check failed ───────────────► Resolved(write-all, warning)
//!   ├─ no duplicates ──────────────► Resolved(write-all)
//!   └─ duplicates ─► AwaitingDecision
//!                      ├─ Overwrite ────► Resolved(write-all)
//!                      └─ KeepExisting ─► Resolved(write-new-only)
//! ```
//!
//! The collecting state is the [`ImportBatch`] itself; the decision pause is
//! an explicit [`PendingDecision`] so a headless run can answer it with a
//! default [`Strategy`] while an interactive run prompts.

use std::str::FromStr;

use fttm_core::MetricRecord;

use crate::{DuplicateCheckError, DuplicateSet, ImportBatch};

/// Operator choice for candidates whose key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Write every candidate, replacing stored values.
    Overwrite,
    /// Drop colliding candidates and write only new keys.
    KeepExisting,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Overwrite => f.write_str("overwrite"),
            Strategy::KeepExisting => f.write_str("keep-existing"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" | "o" => Ok(Strategy::Overwrite),
            "keep-existing" | "keep" | "k" | "skip" => Ok(Strategy::KeepExisting),
            other => Err(format!(
                "unknown duplicate strategy '{other}' (expected overwrite or keep-existing)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePlan {
    WriteAll,
    WriteNewOnly,
}

/// Outcome of reconciliation: the records to hand to the writer.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The batch with `records` narrowed to what will be written.
    pub batch: ImportBatch,
    pub plan: WritePlan,
    /// Stored rows that collided with the batch.
    pub duplicates: usize,
    /// Candidates dropped by [`Strategy::KeepExisting`].
    pub skipped: usize,
    /// Set when the duplicate check failed and the import fell back to
    /// write-all without knowing what already exists.
    pub check_warning: Option<DuplicateCheckError>,
}

impl Resolution {
    fn write_all(batch: ImportBatch, duplicates: usize) -> Self {
        Self {
            batch,
            plan: WritePlan::WriteAll,
            duplicates,
            skipped: 0,
            check_warning: None,
        }
    }

    #[must_use]
    pub fn records(&self) -> &[MetricRecord] {
        &self.batch.records
    }
}

/// Batch paused until the operator picks a [`Strategy`].
#[derive(Debug, Clone)]
pub struct PendingDecision {
    batch: ImportBatch,
    duplicates: DuplicateSet,
}

impl PendingDecision {
    #[must_use]
    pub fn batch(&self) -> &ImportBatch {
        &self.batch
    }

    /// Stored rows the batch collides with.
    #[must_use]
    pub fn duplicates(&self) -> &DuplicateSet {
        &self.duplicates
    }

    /// Candidate rows whose key is already stored.
    #[must_use]
    pub fn colliding_candidates(&self) -> usize {
        self.batch
            .records
            .iter()
            .filter(|r| self.duplicates.contains(&r.key()))
            .count()
    }

    #[must_use]
    pub fn resolve(self, strategy: Strategy) -> Resolution {
        let Self {
            mut batch,
            duplicates,
        } = self;

        match strategy {
            Strategy::Overwrite => Resolution::write_all(batch, duplicates.len()),
            Strategy::KeepExisting => {
                let before = batch.records.len();
                batch.records.retain(|r| !duplicates.contains(&r.key()));
                let skipped = before - batch.records.len();
                Resolution {
                    batch,
                    plan: WritePlan::WriteNewOnly,
                    duplicates: duplicates.len(),
                    skipped,
                    check_warning: None,
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum ReconcileState {
    AwaitingDecision(PendingDecision),
    Resolved(Resolution),
}

impl ReconcileState {
    /// Leaves the collecting state with the result of the duplicate check.
    #[must_use]
    pub fn from_check(
        batch: ImportBatch,
        check: Result<DuplicateSet, DuplicateCheckError>,
    ) -> Self {
        match check {
            Err(err) => {
                tracing::warn!(
                    batch_id = %batch.id,
                    error = %err,
                    "duplicate check skipped; importing without knowing existing rows"
                );
                let mut resolution = Resolution::write_all(batch, 0);
                resolution.check_warning = Some(err);
                ReconcileState::Resolved(resolution)
            }
            Ok(duplicates) if duplicates.is_empty() => {
                ReconcileState::Resolved(Resolution::write_all(batch, 0))
            }
            Ok(duplicates) => {
                ReconcileState::AwaitingDecision(PendingDecision { batch, duplicates })
            }
        }
    }

    /// Answers a pending decision with `strategy`; an already resolved state
    /// is returned unchanged.
    #[must_use]
    pub fn resolve_with(self, strategy: Strategy) -> Resolution {
        match self {
            ReconcileState::AwaitingDecision(pending) => pending.resolve(strategy),
            ReconcileState::Resolved(resolution) => resolution,
        }
    }

    #[must_use]
    pub fn batch(&self) -> &ImportBatch {
        match self {
            ReconcileState::AwaitingDecision(pending) => &pending.batch,
            ReconcileState::Resolved(resolution) => &resolution.batch,
        }
    }
}
