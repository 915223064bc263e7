//! Plain-text rendering helpers shared by the read-only commands.

use chrono::NaiveDate;
use fttm_core::{MetricKind, MetricRecord};

/// `DD/MM/YYYY`, the date form used in printable summaries.
pub(crate) fn fmt_dmy(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Integer with `,` thousands separators.
pub(crate) fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Cells of one record in [`MetricKind::expected_columns`] order.
fn record_cells(record: &MetricRecord) -> Vec<String> {
    let key = record.key();
    let mut cells = vec![key.brand, key.date.to_string()];
    if let Some(end) = key.end_date {
        cells.push(end.to_string());
    }
    cells.extend(record.values().into_iter().map(|(_, v)| v.to_string()));
    cells
}

/// Left-aligned table with an upper-case header row.
pub(crate) fn record_table(kind: MetricKind, records: &[MetricRecord]) -> Vec<String> {
    let header: Vec<String> = kind
        .expected_columns()
        .iter()
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let rows: Vec<Vec<String>> = records.iter().map(record_cells).collect();

    let mut widths: Vec<usize> = header.iter().map(String::len).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    std::iter::once(render(&header))
        .chain(rows.iter().map(|row| render(row)))
        .collect()
}
