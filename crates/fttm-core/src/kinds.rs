//! The five metric record kinds and their fixed column schemas.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Google Analytics users over a reporting window.
    Traffic,
    /// Google Ads clicks and impressions.
    Ads,
    /// Agent listing counts.
    Postings,
    /// Google indexed pages.
    Index,
    /// Semrush rank, lower is better.
    Rank,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Traffic,
        MetricKind::Ads,
        MetricKind::Postings,
        MetricKind::Index,
        MetricKind::Rank,
    ];

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            MetricKind::Traffic => "traffic",
            MetricKind::Ads => "ads",
            MetricKind::Postings => "postings",
            MetricKind::Index => "index",
            MetricKind::Rank => "rank",
        }
    }

    /// Backing table name.
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            MetricKind::Traffic => "ga_traffic",
            MetricKind::Ads => "ads_metrics",
            MetricKind::Postings => "agent_postings",
            MetricKind::Index => "google_index",
            MetricKind::Rank => "semrush_rank",
        }
    }

    /// Human-readable section title.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            MetricKind::Traffic => "Google Analytics",
            MetricKind::Ads => "Google Ads",
            MetricKind::Postings => "Agent Postings",
            MetricKind::Index => "Google Index",
            MetricKind::Rank => "Semrush Rank",
        }
    }

    /// Columns forming the natural key, in order.
    #[must_use]
    pub fn key_columns(self) -> &'static [&'static str] {
        match self {
            MetricKind::Traffic => &["brand", "start_date", "end_date"],
            _ => &["brand", "date"],
        }
    }

    #[must_use]
    pub fn date_columns(self) -> &'static [&'static str] {
        match self {
            MetricKind::Traffic => &["start_date", "end_date"],
            _ => &["date"],
        }
    }

    /// Integer value columns, in file order.
    #[must_use]
    pub fn int_columns(self) -> &'static [&'static str] {
        match self {
            MetricKind::Traffic => &["users"],
            MetricKind::Ads => &["clicks", "impressions"],
            MetricKind::Postings => &[
                "total_listings",
                "sale_listings",
                "rent_listings",
                "auction_listings",
            ],
            MetricKind::Index => &["indexed"],
            MetricKind::Rank => &["rank"],
        }
    }

    /// Every column an import file must carry: the key followed by the values.
    #[must_use]
    pub fn expected_columns(self) -> Vec<&'static str> {
        self.key_columns()
            .iter()
            .chain(self.int_columns())
            .copied()
            .collect()
    }

    /// Date column used for range filters and "latest N" ordering.
    #[must_use]
    pub fn order_column(self) -> &'static str {
        match self {
            MetricKind::Traffic => "end_date",
            _ => "date",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for MetricKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "traffic" | "ga" | "ga_traffic" => Ok(MetricKind::Traffic),
            "ads" | "ads_metrics" => Ok(MetricKind::Ads),
            "postings" | "agent_postings" => Ok(MetricKind::Postings),
            "index" | "google_index" => Ok(MetricKind::Index),
            "rank" | "semrush_rank" => Ok(MetricKind::Rank),
            other => Err(CoreError::UnknownKind(other.to_string())),
        }
    }
}
