//! Manual single-row entry, one subcommand per record kind.

use chrono::{Duration, NaiveDate};
use clap::Subcommand;
use fttm_core::{
    AdsRecord, BrandsFile, IndexRecord, MetricRecord, MetricStore, PostingsRecord, RankRecord,
    TrafficRecord,
};

/// Sub-commands available under `entry`.
#[derive(Debug, Subcommand)]
pub enum EntryCommands {
    /// Google Analytics users for a reporting window
    Traffic {
        #[arg(long)]
        brand: String,
        /// Window start (defaults to seven days before today)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Window end (defaults to today)
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        users: i64,
    },
    /// Google Ads clicks and impressions
    Ads {
        #[arg(long)]
        brand: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        clicks: i64,
        #[arg(long)]
        impressions: i64,
    },
    /// Agent listing counts; the total is computed
    Postings {
        #[arg(long)]
        brand: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        sale: i64,
        #[arg(long)]
        rent: i64,
        #[arg(long)]
        auction: i64,
    },
    /// Google indexed pages
    Index {
        #[arg(long)]
        brand: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        indexed: i64,
    },
    /// Semrush rank (1 is best)
    Rank {
        #[arg(long)]
        brand: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        rank: i64,
    },
}

fn ensure_known_brand(brands: &BrandsFile, brand: &str) -> anyhow::Result<()> {
    if brands.is_known(brand) {
        Ok(())
    } else {
        anyhow::bail!(
            "unknown brand '{brand}'; configured brands: {}",
            brands.names().join(", ")
        )
    }
}

/// Builds and validates the record an entry command describes.
///
/// # Errors
///
/// Returns an error for an unconfigured brand, a postings entry for a brand
/// without postings, a traffic window that ends before it starts, or a value
/// outside its allowed range.
pub(crate) fn build_entry_record(
    command: EntryCommands,
    brands: &BrandsFile,
    today: NaiveDate,
) -> anyhow::Result<MetricRecord> {
    let record = match command {
        EntryCommands::Traffic {
            brand,
            start,
            end,
            users,
        } => {
            ensure_known_brand(brands, &brand)?;
            let end_date = end.unwrap_or(today);
            let start_date = start.unwrap_or(end_date - Duration::days(7));
            if start_date > end_date {
                anyhow::bail!("window start {start_date} is after its end {end_date}");
            }
            MetricRecord::Traffic(TrafficRecord {
                brand,
                start_date,
                end_date,
                users,
            })
        }
        EntryCommands::Ads {
            brand,
            date,
            clicks,
            impressions,
        } => {
            ensure_known_brand(brands, &brand)?;
            MetricRecord::Ads(AdsRecord {
                brand,
                date: date.unwrap_or(today),
                clicks,
                impressions,
            })
        }
        EntryCommands::Postings {
            brand,
            date,
            sale,
            rent,
            auction,
        } => {
            ensure_known_brand(brands, &brand)?;
            if !brands.get(&brand).is_some_and(|b| b.postings) {
                anyhow::bail!(
                    "brand '{brand}' does not publish agent postings; allowed: {}",
                    brands.postings_brands().join(", ")
                );
            }
            MetricRecord::Postings(PostingsRecord::from_counts(
                brand,
                date.unwrap_or(today),
                sale,
                rent,
                auction,
            ))
        }
        EntryCommands::Index {
            brand,
            date,
            indexed,
        } => {
            ensure_known_brand(brands, &brand)?;
            MetricRecord::Index(IndexRecord {
                brand,
                date: date.unwrap_or(today),
                indexed,
            })
        }
        EntryCommands::Rank { brand, date, rank } => {
            ensure_known_brand(brands, &brand)?;
            MetricRecord::Rank(RankRecord {
                brand,
                date: date.unwrap_or(today),
                rank,
            })
        }
    };

    record.validate()?;
    Ok(record)
}

/// Upserts one manually entered record.
///
/// # Errors
///
/// Returns an error if the record is invalid or the store rejects it.
pub(crate) async fn run_entry<S: MetricStore>(
    store: &S,
    brands: &BrandsFile,
    command: EntryCommands,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let record = build_entry_record(command, brands, today)?;
    let kind = record.kind();
    let counts = store.upsert(kind, std::slice::from_ref(&record)).await?;

    let action = if counts.inserted > 0 { "saved" } else { "updated" };
    println!("{action} {} entry for {}", kind.title(), record.key());
    Ok(())
}
