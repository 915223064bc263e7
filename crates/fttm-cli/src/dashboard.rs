//! `dashboard` command: KPI lines and trend tables for a date range.

use fttm_core::{DashboardState, ListQuery, MetricKind, MetricRecord, MetricStore};

use crate::format::{record_table, thousands};

/// How a KPI folds one brand's rows into a single figure.
#[derive(Debug, Clone, Copy)]
enum Fold {
    Latest,
    Sum,
}

const KPIS: [(MetricKind, &str, Fold); 4] = [
    (MetricKind::Traffic, "Users", Fold::Latest),
    (MetricKind::Ads, "Clicks", Fold::Sum),
    (MetricKind::Postings, "Listings", Fold::Latest),
    (MetricKind::Index, "Indexed Pages", Fold::Latest),
];

/// Rows of one kind inside the dashboard's range and brand selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Trend {
    pub kind: MetricKind,
    /// Sorted by order date, then brand.
    pub records: Vec<MetricRecord>,
}

/// Loads every kind for `state`.
///
/// # Errors
///
/// Returns an error if any listing fails.
pub(crate) async fn load_dashboard<S: MetricStore>(
    store: &S,
    state: &DashboardState,
) -> anyhow::Result<Vec<Trend>> {
    let query = ListQuery {
        range: Some(state.range),
        ..ListQuery::default()
    };

    let mut trends = Vec::with_capacity(MetricKind::ALL.len());
    for kind in MetricKind::ALL {
        let mut records: Vec<MetricRecord> = store
            .list(kind, &query)
            .await?
            .into_iter()
            .filter(|r| state.includes_brand(r.brand()))
            .collect();
        records.sort_by(|a, b| {
            a.order_date()
                .cmp(&b.order_date())
                .then_with(|| a.brand().cmp(b.brand()))
        });
        tracing::debug!(%kind, rows = records.len(), "dashboard trend loaded");
        trends.push(Trend { kind, records });
    }
    Ok(trends)
}

fn headline(record: &MetricRecord) -> i64 {
    record.values().first().map_or(0, |&(_, v)| v)
}

/// One line per KPI, brands in the order of `state.brands`.
///
/// Brands without rows in range are left out of a line.
pub(crate) fn kpi_lines(trends: &[Trend], state: &DashboardState) -> Vec<String> {
    KPIS.iter()
        .map(|&(kind, label, fold)| {
            let records: &[MetricRecord] = trends
                .iter()
                .find(|t| t.kind == kind)
                .map(|t| t.records.as_slice())
                .unwrap_or_default();

            let parts: Vec<String> = state
                .brands
                .iter()
                .filter_map(|brand| {
                    let mut rows = records
                        .iter()
                        .filter(|r| r.brand() == brand.as_str())
                        .peekable();
                    rows.peek()?;
                    let value = match fold {
                        Fold::Latest => rows.last().map_or(0, headline),
                        Fold::Sum => rows.map(headline).sum(),
                    };
                    Some(format!("{brand}: {}", thousands(value)))
                })
                .collect();

            if parts.is_empty() {
                format!("{label}: no data")
            } else {
                format!("{label}: {}", parts.join(" | "))
            }
        })
        .collect()
}

pub(crate) fn render_dashboard(trends: &[Trend], state: &DashboardState) -> Vec<String> {
    let mut lines = vec![format!(
        "Showing data from {} to {}",
        state.range.start, state.range.end
    )];
    lines.push(String::new());
    lines.extend(kpi_lines(trends, state));

    for trend in trends {
        lines.push(String::new());
        lines.push(format!("== {} ==", trend.kind.title()));
        if trend.records.is_empty() {
            lines.push("No data found.".to_string());
        } else {
            lines.extend(record_table(trend.kind, &trend.records));
        }
    }
    lines
}

pub(crate) async fn run_dashboard<S: MetricStore>(
    store: &S,
    state: &DashboardState,
) -> anyhow::Result<()> {
    let trends = load_dashboard(store, state).await?;
    for line in render_dashboard(&trends, state) {
        println!("{line}");
    }
    Ok(())
}
