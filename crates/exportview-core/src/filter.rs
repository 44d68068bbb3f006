use itertools::Itertools;

use crate::{Dataset, View, util::to_lowercase_into};

/// Display text of the profile option that imposes no constraint.
pub const ALL_PROFILES: &str = "All Profiles";

/// Current filter inputs. Empty strings impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub profile: String,
    pub query: String,
}

/// Records of `base` with the selected profile that contain the query in any
/// field, case-insensitively. `base` order is preserved.
///
/// A non-empty profile matches nothing when `profile_column` is `None`.
pub fn filter_view(
    dataset: &Dataset,
    base: &View,
    profile_column: Option<usize>,
    criteria: &FilterCriteria,
) -> View {
    let profiled = profile_view(dataset, base, profile_column, &criteria.profile);
    if criteria.query.is_empty() {
        return profiled;
    }

    let needle = criteria.query.to_lowercase();
    let mut buf = String::new();
    let indices = profiled
        .indices()
        .iter()
        .copied()
        .filter(|&i| {
            dataset.record(i).is_some_and(|record| {
                record.values().iter().any(|value| {
                    to_lowercase_into(value, &mut buf);
                    buf.contains(&needle)
                })
            })
        })
        .collect();
    View::from_indices(indices)
}

/// Records of `base` whose profile field equals `profile` exactly.
pub fn profile_view(
    dataset: &Dataset,
    base: &View,
    profile_column: Option<usize>,
    profile: &str,
) -> View {
    if profile.is_empty() {
        return base.clone();
    }
    let Some(column) = profile_column else {
        return View::default();
    };
    View::from_indices(
        base.indices()
            .iter()
            .copied()
            .filter(|&i| dataset.record(i).is_some_and(|r| r.get(column) == profile))
            .collect(),
    )
}

/// Distinct non-empty profile values, ascending.
pub fn profile_options(dataset: &Dataset, profile_column: Option<usize>) -> Vec<String> {
    let Some(column) = profile_column else {
        return Vec::new();
    };
    dataset
        .records()
        .iter()
        .map(|r| r.get(column))
        .filter(|p| !p.is_empty())
        .sorted_unstable()
        .dedup()
        .map(str::to_owned)
        .collect()
}

pub fn download_label(profile: &str) -> String {
    if profile.is_empty() {
        "Download Full History".to_owned()
    } else {
        format!("Download {profile}'s History")
    }
}
