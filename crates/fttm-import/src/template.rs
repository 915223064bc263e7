//! Downloadable CSV templates, one per record kind.

use fttm_core::MetricKind;

use crate::ImportError;

fn example_row(kind: MetricKind) -> &'static [&'static str] {
    match kind {
        MetricKind::Traffic => &["FindHouse", "2024-01-01", "2024-01-07", "1200"],
        MetricKind::Ads => &["FindHouse", "2024-01-01", "100", "2000"],
        MetricKind::Postings => &["FindHouse", "2024-01-01", "60", "30", "20", "10"],
        MetricKind::Index => &["FindHouse", "2024-01-01", "450"],
        MetricKind::Rank => &["FindHouse", "2024-01-01", "12"],
    }
}

/// Header row of `kind`'s import columns plus one example row.
///
/// # Errors
///
/// Returns [`ImportError::Csv`] if the writer fails.
pub fn template_csv(kind: MetricKind) -> Result<String, ImportError> {
    let mut buf = Vec::new();
    {
        let mut wtr = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut buf);
        wtr.write_record(kind.expected_columns())?;
        wtr.write_record(example_row(kind))?;
        wtr.flush().map_err(|source| ImportError::Io {
            path: "<template>".to_string(),
            source,
        })?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{read_csv, run_headless, ImportOptions, Strategy};

    #[test]
    fn ads_template_matches_import_columns() {
        assert_eq!(
            template_csv(MetricKind::Ads).unwrap(),
            "brand,date,clicks,impressions\nFindHouse,2024-01-01,100,2000\n"
        );
    }

    #[test]
    fn every_template_example_fits_its_schema() {
        for kind in MetricKind::ALL {
            assert_eq!(example_row(kind).len(), kind.expected_columns().len(), "{kind}");
        }
    }

    #[tokio::test]
    async fn templates_import_cleanly() {
        let store = fttm_core::MemoryStore::new();
        for kind in MetricKind::ALL {
            let table = read_csv(template_csv(kind).unwrap().as_bytes()).unwrap();
            let report = run_headless(
                &store,
                kind,
                &table,
                ImportOptions::default(),
                Strategy::Overwrite,
            )
                .await
                .unwrap();
            assert!(report.warnings.is_empty(), "{kind}: {:?}", report.warnings);
            assert_eq!(report.written.counts.inserted, 1, "{kind}");
        }
    }
}
