//! `overview` command: newest stored rows of each record kind.

use fttm_core::{ListQuery, MetricKind, MetricRecord, MetricStore};

/// Newest `limit` rows of each requested kind, in [`MetricKind::ALL`] order.
///
/// # Errors
///
/// Returns an error if any listing fails.
pub(crate) async fn load_overview<S: MetricStore>(
    store: &S,
    kind: Option<MetricKind>,
    limit: u32,
) -> anyhow::Result<Vec<(MetricKind, Vec<MetricRecord>)>> {
    let kinds: Vec<MetricKind> = match kind {
        Some(kind) => vec![kind],
        None => MetricKind::ALL.to_vec(),
    };
    let query = ListQuery {
        descending: true,
        limit: Some(i64::from(limit)),
        ..ListQuery::default()
    };

    let mut sections = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let records = store.list(kind, &query).await?;
        sections.push((kind, records));
    }
    Ok(sections)
}

pub(crate) async fn run_overview<S: MetricStore>(
    store: &S,
    kind: Option<MetricKind>,
    limit: u32,
    json: bool,
) -> anyhow::Result<()> {
    let sections = load_overview(store, kind, limit).await?;

    if json {
        let body: serde_json::Map<String, serde_json::Value> = sections
            .iter()
            .map(|(kind, records)| {
                serde_json::to_value(records).map(|value| (kind.slug().to_string(), value))
            })
            .collect::<Result<_, serde_json::Error>>()?;
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    for (kind, records) in &sections {
        println!("== {} ==", kind.title());
        if records.is_empty() {
            println!("No data found.");
        } else {
            for line in crate::format::record_table(*kind, records) {
                println!("{line}");
            }
        }
        println!();
    }
    Ok(())
}
