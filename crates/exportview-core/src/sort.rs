use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use crate::{Dataset, View, timestamp::parse_timestamp};

/// Most recent first; anything without a valid date goes after every dated
/// value, and undated values tie.
#[inline]
pub fn cmp_most_recent_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Reorders `view` by the timestamp in `column`, most recent first. The sort
/// is stable and each value is parsed once.
pub fn sort_most_recent_first(dataset: &Dataset, view: &View, column: usize) -> View {
    let records = dataset.records();
    let mut keyed: Vec<(Option<DateTime<Utc>>, usize)> = view
        .indices()
        .par_iter()
        .map(|&i| (records.get(i).and_then(|r| parse_timestamp(r.get(column))), i))
        .collect();

    // par_sort_by is stable
    keyed.par_sort_by(|a, b| cmp_most_recent_first(a.0, b.0));

    let undated = keyed.iter().rev().take_while(|(d, _)| d.is_none()).count();
    tracing::debug!(
        "sorted {} records by column {column}, {undated} without a valid date",
        keyed.len()
    );
    View::from_indices(keyed.into_iter().map(|(_, i)| i).collect())
}

/// The ordering every other view derives from: chronological when the
/// dataset has `timestamp_field`, otherwise source order.
pub fn base_order(dataset: &Dataset, timestamp_field: &str) -> View {
    let all = View::all(dataset);
    match dataset.column(timestamp_field) {
        Some(column) => sort_most_recent_first(dataset, &all, column),
        None => all,
    }
}
