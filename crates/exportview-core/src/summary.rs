use std::fmt;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    Dataset, View, ViewerConfig,
    timestamp::{format_duration_secs, parse_duration_secs, parse_timestamp},
};

pub const NOT_AVAILABLE: &str = "N/A";

/// Earliest and latest valid timestamp of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

impl DateRange {
    /// Single pass with constant extra space, whatever the input length.
    pub fn from_dates<I>(dates: I) -> Option<Self>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        dates.into_iter().fold(None, |acc, d| {
            Some(match acc {
                None => DateRange {
                    earliest: d,
                    latest: d,
                },
                Some(r) => DateRange {
                    earliest: r.earliest.min(d),
                    latest: r.latest.max(d),
                },
            })
        })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.earliest.format("%Y-%m-%d"),
            self.latest.format("%Y-%m-%d")
        )
    }
}

/// Count and date range of the current view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub date_range: Option<DateRange>,
}

impl Summary {
    /// Invalid or missing timestamps are left out of the range entirely.
    pub fn compute(dataset: &Dataset, view: &View, timestamp_column: Option<usize>) -> Self {
        let date_range = timestamp_column.and_then(|column| {
            DateRange::from_dates(
                view.records(dataset)
                    .filter_map(|r| parse_timestamp(r.get(column))),
            )
        });
        Summary {
            count: view.len(),
            date_range,
        }
    }

    pub fn date_range_label(&self) -> String {
        self.date_range
            .map(|r| r.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
    }
}

/// Viewing statistics beyond the plain summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Insights {
    /// Sum of every parseable `HH:MM:SS` duration.
    pub total_watch_secs: u64,
    /// Series (title up to the first `:`) with the most records, and its count.
    pub most_watched: Option<(String, usize)>,
    pub unique_titles: usize,
    pub unique_devices: usize,
}

impl Insights {
    pub fn compute(dataset: &Dataset, view: &View, config: &ViewerConfig) -> Self {
        let title = dataset.column(&config.title_field);
        let duration = dataset.column(&config.duration_field);
        let device = dataset.column(&config.device_field);

        let total_watch_secs = duration
            .map(|c| {
                view.records(dataset)
                    .filter_map(|r| parse_duration_secs(r.get(c)))
                    .fold(0u64, u64::saturating_add)
            })
            .unwrap_or(0);

        let (most_watched, unique_titles) = match title {
            Some(c) => {
                let titles: Vec<&str> = view
                    .records(dataset)
                    .map(|r| r.get(c))
                    .filter(|t| !t.is_empty())
                    .collect();
                let unique = titles.iter().unique().count();
                let series = titles.into_iter().map(series_name).counts();
                // highest count, ties broken alphabetically
                let top = series
                    .into_iter()
                    .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
                    .map(|(name, n)| (name.to_owned(), n));
                (top, unique)
            },
            None => (None, 0),
        };

        let unique_devices = device
            .map(|c| {
                view.records(dataset)
                    .map(|r| r.get(c))
                    .filter(|d| !d.is_empty())
                    .unique()
                    .count()
            })
            .unwrap_or(0);

        Insights {
            total_watch_secs,
            most_watched,
            unique_titles,
            unique_devices,
        }
    }

    pub fn total_watch_time(&self) -> String {
        format_duration_secs(self.total_watch_secs)
    }

    pub fn most_watched_label(&self) -> String {
        self.most_watched
            .as_ref()
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned())
    }
}

/// `"Stranger Things: Season 1: Chapter One"` -> `"Stranger Things"`.
pub fn series_name(title: &str) -> &str {
    title.split(':').next().unwrap_or(title).trim()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn netflix(rows: &[[&str; 5]]) -> Dataset {
        Dataset::new(
            ["Profile Name", "Start Time", "Duration", "Title", "Device Type"]
                .map(String::from)
                .to_vec(),
            rows.iter()
                .map(|r| r.iter().map(|v| (*v).to_owned()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_date_range_ignores_invalid_dates() {
        let ds = Dataset::new(
            vec!["date".into(), "title".into()],
            vec![
                vec!["2021-05-12".into(), "Valid A".into()],
                vec!["".into(), "Empty".into()],
                vec!["2021-08-24".into(), "Valid B".into()],
                vec!["Not a date".into(), "Invalid".into()],
            ],
        );
        let summary = Summary::compute(&ds, &View::all(&ds), ds.column("date"));
        assert_eq!(summary.count, 4);
        assert_eq!(summary.date_range_label(), "2021-05-12 - 2021-08-24");
    }

    #[test]
    fn test_no_valid_dates_is_not_available() {
        let ds = Dataset::new(vec!["date".into()], vec![vec!["soon".into()], vec!["".into()]]);
        let summary = Summary::compute(&ds, &View::all(&ds), Some(0));
        assert_eq!(summary.count, 2);
        assert_eq!(summary.date_range, None);
        assert_eq!(summary.date_range_label(), "N/A");

        let summary = Summary::compute(&ds, &View::all(&ds), None);
        assert_eq!(summary.date_range_label(), "N/A");
    }

    #[test]
    fn test_empty_view_summary() {
        let ds = Dataset::new(vec!["date".into()], vec![vec!["2021-01-01".into()]]);
        let summary = Summary::compute(&ds, &View::default(), Some(0));
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_large_range_fold() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let n = 150_000;
        let range = DateRange::from_dates((0..n).map(|i| start + Duration::seconds(i))).unwrap();
        assert_eq!(range.earliest, start);
        assert_eq!(range.latest, start + Duration::seconds(n - 1));
        assert!(range.to_string().starts_with("2020-01-01 - "));
    }

    #[test]
    fn test_insights() {
        let ds = netflix(&[
            [
                "Alice",
                "2021-05-12 15:00:00",
                "00:45:00",
                "Stranger Things: Season 1: Chapter One",
                "Apple iPhone",
            ],
            [
                "Alice",
                "2021-05-13 15:00:00",
                "00:50:30",
                "Stranger Things: Season 1: Chapter Two",
                "Apple iPhone",
            ],
            ["Bob", "2021-05-14 15:00:00", "02:28:00", "Inception", "Sony PS4"],
            ["Bob", "2021-05-15 15:00:00", "not a duration", "Inception", ""],
        ]);
        let insights = Insights::compute(&ds, &View::all(&ds), &ViewerConfig::default());
        assert_eq!(insights.total_watch_secs, 45 * 60 + 50 * 60 + 30 + 148 * 60);
        assert_eq!(insights.total_watch_time(), "4:03:30");
        assert_eq!(insights.unique_titles, 3);
        assert_eq!(insights.unique_devices, 2);
        // two records each; alphabetical tie-break
        assert_eq!(insights.most_watched, Some(("Inception".to_owned(), 2)));
    }

    #[test]
    fn test_huge_durations_never_overflow() {
        let ds = netflix(&[
            ["Alice", "", "6000000000000000:00:00", "Dark", "TV"],
            ["Alice", "", "5000000000000000:00:00", "Dark", "TV"],
            ["Alice", "", "5000000000000000:00:00", "Dark", "TV"],
            ["Alice", "", "00:00:10", "Dark", "TV"],
        ]);
        let insights = Insights::compute(&ds, &View::all(&ds), &ViewerConfig::default());
        // the first value does not fit in seconds and is skipped; the rest saturate
        assert_eq!(insights.total_watch_secs, u64::MAX);
        assert!(!insights.total_watch_time().is_empty());
    }

    #[test]
    fn test_insights_without_fields() {
        let ds = Dataset::new(vec!["x".into()], vec![vec!["1".into()]]);
        let insights = Insights::compute(&ds, &View::all(&ds), &ViewerConfig::default());
        assert_eq!(insights, Insights::default());
        assert_eq!(insights.most_watched_label(), "N/A");
        assert_eq!(insights.total_watch_time(), "0:00:00");
    }

    #[test]
    fn test_series_name() {
        assert_eq!(series_name("Dark: Season 2: Lost and Found"), "Dark");
        assert_eq!(series_name("Inception"), "Inception");
        assert_eq!(series_name(""), "");
    }
}
