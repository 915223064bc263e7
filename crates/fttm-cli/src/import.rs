//! `import` command: CSV upload with interactive duplicate reconciliation.

use std::io::{BufRead, Write};
use std::path::Path;

use fttm_core::{MetricKind, MetricStore};
use fttm_import::{
    commit, prepare, read_csv_path, ImportOptions, ImportReport, PendingDecision, ReconcileState,
    Strategy, WritePlan,
};

use crate::format::record_table;

/// Asks the operator how to treat colliding rows.
///
/// Re-prompts on unrecognised answers.
///
/// # Errors
///
/// Returns an error when input ends before a valid answer.
pub(crate) fn prompt_strategy<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> anyhow::Result<Strategy> {
    loop {
        write!(output, "Overwrite existing rows or keep them? [overwrite/keep-existing]: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            anyhow::bail!("no answer given; rerun with --on-duplicate overwrite|keep-existing");
        }
        match line.parse::<Strategy>() {
            Ok(strategy) => return Ok(strategy),
            Err(msg) => writeln!(output, "{msg}")?,
        }
    }
}

fn describe_pending(pending: &PendingDecision) -> Vec<String> {
    let mut lines = vec![format!(
        "{} of {} rows already exist in {}:",
        pending.colliding_candidates(),
        pending.batch().records.len(),
        pending.batch().kind.title()
    )];
    let stored: Vec<_> = pending.duplicates().records().cloned().collect();
    lines.extend(record_table(pending.batch().kind, &stored));
    lines
}

/// Human-readable outcome of an import.
pub(crate) fn report_lines(report: &ImportReport) -> Vec<String> {
    if report.is_empty_upload() {
        return vec!["The uploaded file has no data rows; nothing was imported.".to_string()];
    }

    let mut lines = Vec::new();
    for warning in &report.warnings {
        lines.push(format!("warning: {warning}"));
    }
    for rejected in &report.rejected {
        lines.push(format!(
            "skipped row {}: {}",
            rejected.row_number, rejected.reason
        ));
    }
    if let Some(check) = &report.check_warning {
        lines.push(format!(
            "warning: {check}; imported without checking for existing rows"
        ));
    }

    let title = report.kind.title();
    if report.dry_run {
        let mode = match report.plan {
            WritePlan::WriteAll => "write all",
            WritePlan::WriteNewOnly => "write new only",
        };
        lines.push(format!(
            "dry run: would write {} {title} rows ({mode}); {} existing, {} kept as is",
            report.to_write, report.duplicates, report.skipped
        ));
        return lines;
    }

    let counts = report.written.counts;
    lines.push(format!(
        "imported {title}: {} inserted, {} updated",
        counts.inserted, counts.updated
    ));
    if report.skipped > 0 {
        lines.push(format!("{} existing rows kept as is", report.skipped));
    }
    if report.written.collapsed > 0 {
        lines.push(format!(
            "{} repeated rows in the file were superseded by later ones",
            report.written.collapsed
        ));
    }
    lines
}

/// Decides a pending state from the flag or by prompting on stdin.
fn decide<R: BufRead, W: Write>(
    state: ReconcileState,
    on_duplicate: Option<Strategy>,
    input: &mut R,
    output: &mut W,
) -> anyhow::Result<fttm_import::Resolution> {
    match state {
        ReconcileState::Resolved(resolution) => Ok(resolution),
        ReconcileState::AwaitingDecision(pending) => {
            for line in describe_pending(&pending) {
                writeln!(output, "{line}")?;
            }
            let strategy = match on_duplicate {
                Some(strategy) => strategy,
                None => prompt_strategy(input, output)?,
            };
            tracing::info!(batch_id = %pending.batch().id, %strategy, "duplicate strategy chosen");
            Ok(pending.resolve(strategy))
        }
    }
}

/// Imports `path` as `kind` records.
///
/// # Errors
///
/// Returns an error if the file cannot be read, lacks required columns,
/// the prompt gets no answer, or the store rejects the write.
pub(crate) async fn run_import<S: MetricStore>(
    store: &S,
    kind: MetricKind,
    path: &Path,
    options: ImportOptions,
    on_duplicate: Option<Strategy>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let table = read_csv_path(path)?;
    let state = prepare(store, kind, &table, options).await?;

    let resolution = {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        decide(state, on_duplicate, &mut input, &mut output)?
    };

    let report = if dry_run {
        ImportReport::planned(&resolution)
    } else {
        commit(store, resolution).await?
    };

    for line in report_lines(&report) {
        println!("{line}");
    }
    Ok(())
}
