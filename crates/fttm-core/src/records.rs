//! Typed metric records and their composite natural keys.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{CoreError, MetricKind};

/// Composite natural key of a record within one kind.
///
/// `end_date` is only set for traffic records, whose key spans a reporting
/// window; every other kind is keyed on `(brand, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NaturalKey {
    pub brand: String,
    pub date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl NaturalKey {
    #[must_use]
    pub fn dated(brand: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            brand: brand.into(),
            date,
            end_date: None,
        }
    }

    #[must_use]
    pub fn window(brand: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            brand: brand.into(),
            date: start,
            end_date: Some(end),
        }
    }
}

impl std::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.end_date {
            Some(end) => write!(f, "{} {}..{}", self.brand, self.date, end),
            None => write!(f, "{} {}", self.brand, self.date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficRecord {
    pub brand: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub users: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdsRecord {
    pub brand: String,
    pub date: NaiveDate,
    pub clicks: i64,
    pub impressions: i64,
}

/// Listing counts. `total_listings` is the sum of the other three by
/// convention only; imported files may disagree and are stored as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingsRecord {
    pub brand: String,
    pub date: NaiveDate,
    pub total_listings: i64,
    pub sale_listings: i64,
    pub rent_listings: i64,
    pub auction_listings: i64,
}

impl PostingsRecord {
    /// Builds a record whose total is the sum of the three listing counts.
    #[must_use]
    pub fn from_counts(
        brand: impl Into<String>,
        date: NaiveDate,
        sale: i64,
        rent: i64,
        auction: i64,
    ) -> Self {
        Self {
            brand: brand.into(),
            date,
            total_listings: sale.saturating_add(rent).saturating_add(auction),
            sale_listings: sale,
            rent_listings: rent,
            auction_listings: auction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub brand: String,
    pub date: NaiveDate,
    pub indexed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRecord {
    pub brand: String,
    pub date: NaiveDate,
    pub rank: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricRecord {
    Traffic(TrafficRecord),
    Ads(AdsRecord),
    Postings(PostingsRecord),
    Index(IndexRecord),
    Rank(RankRecord),
}

impl MetricRecord {
    /// Assembles a record from its columns in [`MetricKind`] order.
    ///
    /// `dates` follows [`MetricKind::date_columns`] and `values` follows
    /// [`MetricKind::int_columns`]. Returns `None` when the slice lengths do
    /// not match the kind's schema.
    #[must_use]
    pub fn from_columns(
        kind: MetricKind,
        brand: String,
        dates: &[NaiveDate],
        values: &[i64],
    ) -> Option<Self> {
        let record = match (kind, dates, values) {
            (MetricKind::Traffic, &[start_date, end_date], &[users]) => {
                MetricRecord::Traffic(TrafficRecord {
                    brand,
                    start_date,
                    end_date,
                    users,
                })
            }
            (MetricKind::Ads, &[date], &[clicks, impressions]) => MetricRecord::Ads(AdsRecord {
                brand,
                date,
                clicks,
                impressions,
            }),
            (MetricKind::Postings, &[date], &[total, sale, rent, auction]) => {
                MetricRecord::Postings(PostingsRecord {
                    brand,
                    date,
                    total_listings: total,
                    sale_listings: sale,
                    rent_listings: rent,
                    auction_listings: auction,
                })
            }
            (MetricKind::Index, &[date], &[indexed]) => {
                MetricRecord::Index(IndexRecord { brand, date, indexed })
            }
            (MetricKind::Rank, &[date], &[rank]) => {
                MetricRecord::Rank(RankRecord { brand, date, rank })
            }
            _ => return None,
        };
        Some(record)
    }

    #[must_use]
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricRecord::Traffic(_) => MetricKind::Traffic,
            MetricRecord::Ads(_) => MetricKind::Ads,
            MetricRecord::Postings(_) => MetricKind::Postings,
            MetricRecord::Index(_) => MetricKind::Index,
            MetricRecord::Rank(_) => MetricKind::Rank,
        }
    }

    #[must_use]
    pub fn brand(&self) -> &str {
        match self {
            MetricRecord::Traffic(r) => &r.brand,
            MetricRecord::Ads(r) => &r.brand,
            MetricRecord::Postings(r) => &r.brand,
            MetricRecord::Index(r) => &r.brand,
            MetricRecord::Rank(r) => &r.brand,
        }
    }

    /// Date used for range filtering and ordering (`end_date` for traffic).
    #[must_use]
    pub fn order_date(&self) -> NaiveDate {
        match self {
            MetricRecord::Traffic(r) => r.end_date,
            MetricRecord::Ads(r) => r.date,
            MetricRecord::Postings(r) => r.date,
            MetricRecord::Index(r) => r.date,
            MetricRecord::Rank(r) => r.date,
        }
    }

    #[must_use]
    pub fn key(&self) -> NaturalKey {
        match self {
            MetricRecord::Traffic(r) => NaturalKey::window(&r.brand, r.start_date, r.end_date),
            MetricRecord::Ads(r) => NaturalKey::dated(&r.brand, r.date),
            MetricRecord::Postings(r) => NaturalKey::dated(&r.brand, r.date),
            MetricRecord::Index(r) => NaturalKey::dated(&r.brand, r.date),
            MetricRecord::Rank(r) => NaturalKey::dated(&r.brand, r.date),
        }
    }

    /// Value attributes paired with their column names, in schema order.
    #[must_use]
    pub fn values(&self) -> Vec<(&'static str, i64)> {
        match self {
            MetricRecord::Traffic(r) => vec![("users", r.users)],
            MetricRecord::Ads(r) => vec![("clicks", r.clicks), ("impressions", r.impressions)],
            MetricRecord::Postings(r) => vec![
                ("total_listings", r.total_listings),
                ("sale_listings", r.sale_listings),
                ("rent_listings", r.rent_listings),
                ("auction_listings", r.auction_listings),
            ],
            MetricRecord::Index(r) => vec![("indexed", r.indexed)],
            MetricRecord::Rank(r) => vec![("rank", r.rank)],
        }
    }

    /// Checks the value ranges enforced on manual entry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OutOfRange`] for a negative count or a rank below 1.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (field, value) in self.values() {
            let min = if field == "rank" { 1 } else { 0 };
            if value < min {
                return Err(CoreError::OutOfRange { field, min, value });
            }
        }
        Ok(())
    }
}
