//! `summary` command: a plain-text per-brand block meant for pasting into
//! chat messages.

use fttm_core::{BrandsFile, ListQuery, MetricKind, MetricRecord, MetricStore};

use crate::format::fmt_dmy;

const SEPARATOR: &str = "--------------------";

/// Rank is kept out of the summary.
const SECTIONS: [MetricKind; 4] = [
    MetricKind::Traffic,
    MetricKind::Ads,
    MetricKind::Postings,
    MetricKind::Index,
];

fn summary_line(record: &MetricRecord) -> String {
    match record {
        MetricRecord::Traffic(r) => format!(
            "{}\u{2013}{}: {}",
            fmt_dmy(r.start_date),
            fmt_dmy(r.end_date),
            r.users
        ),
        MetricRecord::Ads(r) => format!("{}: [{},{}]", fmt_dmy(r.date), r.clicks, r.impressions),
        MetricRecord::Postings(r) => format!(
            "{}: {} [{},{},{}]",
            fmt_dmy(r.date),
            r.total_listings,
            r.sale_listings,
            r.rent_listings,
            r.auction_listings
        ),
        MetricRecord::Index(r) => format!("{}: {}", fmt_dmy(r.date), r.indexed),
        MetricRecord::Rank(r) => format!("{}: {}", fmt_dmy(r.date), r.rank),
    }
}

/// One brand's block. `sections` holds ascending rows per kind; empty
/// sections are omitted.
pub(crate) fn render_block(
    brand: &str,
    sections: &[(MetricKind, Vec<MetricRecord>)],
) -> Vec<String> {
    let mut lines = vec![SEPARATOR.to_string(), brand.to_string(), SEPARATOR.to_string()];

    let mut first = true;
    for (kind, records) in sections {
        if records.is_empty() {
            continue;
        }
        if !first {
            lines.push(String::new());
        }
        first = false;
        lines.push(format!("*{}*:", kind.title()));
        lines.extend(records.iter().map(summary_line));
    }
    lines
}

/// Latest `latest` rows per section for `brand`, oldest first.
async fn load_brand<S: MetricStore>(
    store: &S,
    brand: &str,
    latest: u32,
) -> anyhow::Result<Vec<(MetricKind, Vec<MetricRecord>)>> {
    let query = ListQuery::latest(brand, i64::from(latest));
    let mut sections = Vec::with_capacity(SECTIONS.len());
    for kind in SECTIONS {
        let mut records = store.list(kind, &query).await?;
        records.reverse();
        sections.push((kind, records));
    }
    Ok(sections)
}

pub(crate) async fn summary_text<S: MetricStore>(
    store: &S,
    brands: &BrandsFile,
    latest: u32,
) -> anyhow::Result<String> {
    let mut lines = Vec::new();
    for brand in brands.names() {
        let sections = load_brand(store, &brand, latest).await?;
        lines.extend(render_block(&brand, &sections));
        lines.push(String::new());
    }
    Ok(lines.join("\n"))
}

pub(crate) async fn run_summary<S: MetricStore>(
    store: &S,
    brands: &BrandsFile,
    latest: u32,
) -> anyhow::Result<()> {
    print!("{}", summary_text(store, brands, latest).await?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use fttm_core::{
        brands::parse_brands, AdsRecord, IndexRecord, MemoryStore, PostingsRecord, RankRecord,
        TrafficRecord,
    };

    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn index(brand: &str, date: &str, indexed: i64) -> MetricRecord {
        MetricRecord::Index(IndexRecord {
            brand: brand.to_string(),
            date: d(date),
            indexed,
        })
    }

    #[test]
    fn block_matches_printable_layout() {
        let sections = vec![
            (
                MetricKind::Traffic,
                vec![MetricRecord::Traffic(TrafficRecord {
                    brand: "FindHouse".to_string(),
                    start_date: d("2024-01-01"),
                    end_date: d("2024-01-07"),
                    users: 1200,
                })],
            ),
            (
                MetricKind::Ads,
                vec![MetricRecord::Ads(AdsRecord {
                    brand: "FindHouse".to_string(),
                    date: d("2024-01-01"),
                    clicks: 100,
                    impressions: 2000,
                })],
            ),
            (
                MetricKind::Postings,
                vec![MetricRecord::Postings(PostingsRecord::from_counts(
                    "FindHouse".to_string(),
                    d("2024-01-01"),
                    30,
                    20,
                    10,
                ))],
            ),
            (MetricKind::Index, vec![index("FindHouse", "2024-01-01", 450)]),
        ];

        assert_eq!(
            render_block("FindHouse", &sections),
            vec![
                "--------------------",
                "FindHouse",
                "--------------------",
                "*Google Analytics*:",
                "01/01/2024\u{2013}07/01/2024: 1200",
                "",
                "*Google Ads*:",
                "01/01/2024: [100,2000]",
                "",
                "*Agent Postings*:",
                "01/01/2024: 60 [30,20,10]",
                "",
                "*Google Index*:",
                "01/01/2024: 450",
            ]
        );
    }

    #[test]
    fn empty_sections_are_omitted_without_leading_blank() {
        let sections = vec![
            (MetricKind::Traffic, Vec::new()),
            (MetricKind::Index, vec![index("CheckValue", "2024-01-01", 7)]),
        ];
        assert_eq!(
            render_block("CheckValue", &sections),
            vec![
                "--------------------",
                "CheckValue",
                "--------------------",
                "*Google Index*:",
                "01/01/2024: 7",
            ]
        );
    }

    #[tokio::test]
    async fn latest_rows_are_shown_oldest_first_without_rank() {
        let brands = parse_brands("brands:\n  - name: FindHouse\n").unwrap();
        let store = MemoryStore::with_records([
            index("FindHouse", "2024-01-01", 1),
            index("FindHouse", "2024-01-02", 2),
            index("FindHouse", "2024-01-03", 3),
            MetricRecord::Rank(RankRecord {
                brand: "FindHouse".to_string(),
                date: d("2024-01-03"),
                rank: 4,
            }),
        ]);

        let text = summary_text(&store, &brands, 2).await.unwrap();
        assert_eq!(
            text,
            "--------------------\nFindHouse\n--------------------\n\
             *Google Index*:\n02/01/2024: 2\n03/01/2024: 3\n"
        );
    }
}
