//! Date ranges, quick-filter presets and the per-invocation dashboard state.

use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};

use crate::CoreError;

/// Span used when no range or preset is chosen.
pub const DEFAULT_RANGE_DAYS: i64 = 60;

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range from two user-picked dates.
    ///
    /// Reversed bounds are swapped and an end in the future is clamped to
    /// `today`. If clamping leaves the start after the end, the range
    /// collapses to the single day `today`.
    #[must_use]
    pub fn new(a: NaiveDate, b: NaiveDate, today: NaiveDate) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        let end = end.min(today);
        let start = start.min(end);
        Self { start, end }
    }

    /// The last [`DEFAULT_RANGE_DAYS`] days ending `today`.
    #[must_use]
    pub fn default_for(today: NaiveDate) -> Self {
        Self {
            start: today - Duration::days(DEFAULT_RANGE_DAYS),
            end: today,
        }
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePreset {
    Last7Days,
    Last30Days,
    Last60Days,
    Last90Days,
    YearToDate,
}

impl DatePreset {
    #[must_use]
    pub fn range(self, today: NaiveDate) -> DateRange {
        let days_back = match self {
            DatePreset::Last7Days => 7,
            DatePreset::Last30Days => 30,
            DatePreset::Last60Days => 60,
            DatePreset::Last90Days => 90,
            DatePreset::YearToDate => {
                let jan_first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                return DateRange {
                    start: jan_first,
                    end: today,
                };
            }
        };
        DateRange {
            start: today - Duration::days(days_back),
            end: today,
        }
    }
}

impl FromStr for DatePreset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-7-days" | "7d" => Ok(DatePreset::Last7Days),
            "last-30-days" | "30d" => Ok(DatePreset::Last30Days),
            "last-60-days" | "60d" => Ok(DatePreset::Last60Days),
            "last-90-days" | "90d" => Ok(DatePreset::Last90Days),
            "year-to-date" | "ytd" => Ok(DatePreset::YearToDate),
            other => Err(CoreError::UnknownPreset(other.to_string())),
        }
    }
}

/// Selections that scope one dashboard rendering.
///
/// Built once per invocation and passed down to every query and renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
    pub range: DateRange,
    pub brands: Vec<String>,
}

impl DashboardState {
    /// Resolves the range from a preset, an explicit pair of dates, or the
    /// default window, in that order of precedence.
    ///
    /// A half-open pair (only `from` or only `to`) is anchored on `today`.
    #[must_use]
    pub fn resolve(
        today: NaiveDate,
        preset: Option<DatePreset>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        brands: Vec<String>,
    ) -> Self {
        let range = match (preset, from, to) {
            (Some(p), _, _) => p.range(today),
            (None, Some(a), Some(b)) => DateRange::new(a, b, today),
            (None, Some(a), None) => DateRange::new(a, today, today),
            (None, None, Some(b)) => {
                DateRange::new(b - Duration::days(DEFAULT_RANGE_DAYS), b, today)
            }
            (None, None, None) => DateRange::default_for(today),
        };
        Self { range, brands }
    }

    #[must_use]
    pub fn includes_brand(&self, brand: &str) -> bool {
        self.brands.iter().any(|b| b == brand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn new_swaps_reversed_bounds() {
        let r = DateRange::new(d("2024-03-10"), d("2024-03-01"), d("2024-06-01"));
        assert_eq!(r.start, d("2024-03-01"));
        assert_eq!(r.end, d("2024-03-10"));
    }

    #[test]
    fn new_clamps_future_end_to_today() {
        let r = DateRange::new(d("2024-05-01"), d("2024-07-01"), d("2024-06-01"));
        assert_eq!(r.end, d("2024-06-01"));
        assert_eq!(r.start, d("2024-05-01"));
    }

    #[test]
    fn new_collapses_fully_future_range() {
        let r = DateRange::new(d("2025-01-01"), d("2025-02-01"), d("2024-06-01"));
        assert_eq!(r.start, d("2024-06-01"));
        assert_eq!(r.end, d("2024-06-01"));
    }

    #[test]
    fn presets_end_today() {
        let today = d("2024-06-15");
        assert_eq!(DatePreset::Last7Days.range(today).start, d("2024-06-08"));
        assert_eq!(DatePreset::Last90Days.range(today).start, d("2024-03-17"));
        let ytd = DatePreset::YearToDate.range(today);
        assert_eq!(ytd.start, d("2024-01-01"));
        assert_eq!(ytd.end, today);
    }

    #[test]
    fn parses_presets() {
        assert_eq!("last-30-days".parse(), Ok(DatePreset::Last30Days));
        assert_eq!("YTD".parse(), Ok(DatePreset::YearToDate));
        assert!("last-week".parse::<DatePreset>().is_err());
    }

    #[test]
    fn resolve_defaults_to_sixty_days() {
        let today = d("2024-06-15");
        let state = DashboardState::resolve(today, None, None, None, vec![]);
        assert_eq!(state.range.start, d("2024-04-16"));
        assert_eq!(state.range.end, today);
    }

    #[test]
    fn resolve_prefers_preset_over_dates() {
        let today = d("2024-06-15");
        let state = DashboardState::resolve(
            today,
            Some(DatePreset::Last7Days),
            Some(d("2024-01-01")),
            Some(d("2024-02-01")),
            vec!["FindHouse".to_string()],
        );
        assert_eq!(state.range, DatePreset::Last7Days.range(today));
        assert!(state.includes_brand("FindHouse"));
        assert!(!state.includes_brand("CheckValue"));
    }

    #[test]
    fn contains_is_inclusive() {
        let r = DateRange::new(d("2024-01-01"), d("2024-01-31"), d("2024-06-01"));
        assert!(r.contains(d("2024-01-01")));
        assert!(r.contains(d("2024-01-31")));
        assert!(!r.contains(d("2024-02-01")));
    }
}
