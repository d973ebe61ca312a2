//! Sort composition.
//!
//! Every mode is a stable sort over precomputed keys, so equal keys keep their
//! input order and comparators never recompute distances or reparse dates.
//! The input slice is never touched; callers get a new `Vec`.

use crate::error::{Result, SearchError};
use crate::model::{parse_timestamp, PetReport};
use pawfinder_geo::{distances_from, Coordinate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// How to order reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Largest reward first
    RewardDesc,
    /// Smallest reward first
    RewardAsc,
    /// Newest first
    #[default]
    DateDesc,
    /// Oldest first
    DateAsc,
    /// Nearest to the reference coordinate first
    DistanceAsc,
}

impl SortMode {
    /// Every mode.
    pub const ALL: [SortMode; 5] = [
        SortMode::RewardDesc,
        SortMode::RewardAsc,
        SortMode::DateDesc,
        SortMode::DateAsc,
        SortMode::DistanceAsc,
    ];

    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::RewardDesc => "reward_desc",
            SortMode::RewardAsc => "reward_asc",
            SortMode::DateDesc => "date_desc",
            SortMode::DateAsc => "date_asc",
            SortMode::DistanceAsc => "distance_asc",
        }
    }

    /// Parse a mode name, falling back to [`SortMode::DateDesc`] for anything
    /// unrecognised.
    ///
    /// ```
    /// use pawfinder_search::SortMode;
    ///
    /// assert_eq!(SortMode::parse_or_default("reward-desc"), SortMode::RewardDesc);
    /// assert_eq!(SortMode::parse_or_default("by vibes"), SortMode::DateDesc);
    /// ```
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            tracing::debug!(mode = raw, "Unknown sort mode, using date_desc");
            SortMode::DateDesc
        })
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "reward_desc" | "reward_high" | "highest_reward" => Ok(SortMode::RewardDesc),
            "reward_asc" | "reward_low" | "lowest_reward" => Ok(SortMode::RewardAsc),
            "date_desc" | "newest" | "latest" => Ok(SortMode::DateDesc),
            "date_asc" | "oldest" => Ok(SortMode::DateAsc),
            "distance_asc" | "distance" | "nearest" => Ok(SortMode::DistanceAsc),
            _ => Err(SearchError::InvalidValue {
                field: "sort",
                value: s.to_string(),
            }),
        }
    }
}

/// Which timestamp the date modes compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateKey {
    /// Date the pet was lost or found
    #[default]
    Event,
    /// When the listing was created
    Created,
}

impl DateKey {
    /// Parse a key name, falling back to [`DateKey::Event`].
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl FromStr for DateKey {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "event" | "event_date" => Ok(DateKey::Event),
            "created" | "created_at" => Ok(DateKey::Created),
            _ => Err(SearchError::InvalidValue {
                field: "date_key",
                value: s.to_string(),
            }),
        }
    }
}

/// Sort mode plus what the modes need.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SortOptions {
    /// Ordering
    pub mode: SortMode,
    /// Reference point for [`SortMode::DistanceAsc`]
    pub reference: Option<Coordinate>,
    /// Timestamp for the date modes
    pub date_key: DateKey,
}

impl SortOptions {
    /// Options for `mode` with no reference and event dates.
    pub fn new(mode: SortMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Set the distance reference.
    #[must_use]
    pub fn with_reference(mut self, reference: Option<Coordinate>) -> Self {
        self.reference = reference;
        self
    }

    /// Set the date key.
    #[must_use]
    pub fn with_date_key(mut self, date_key: DateKey) -> Self {
        self.date_key = date_key;
        self
    }
}

/// Sorted output.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T = PetReport> {
    /// Items in sorted order
    pub reports: Vec<T>,
    /// Distance sort was requested without a reference; `reports` is in input order
    pub distance_unavailable: bool,
}

/// What the comparators need from an item.
pub trait Rankable {
    /// Identifier used in log lines.
    fn rank_id(&self) -> &str;

    /// Reward with a missing reward counted as zero.
    fn reward_amount(&self) -> f64;

    /// Raw timestamp for the requested key.
    fn raw_date(&self, key: DateKey) -> Option<&str>;

    /// Map pin, if any.
    fn coordinate(&self) -> Option<Coordinate>;
}

impl Rankable for PetReport {
    fn rank_id(&self) -> &str {
        &self.id
    }

    fn reward_amount(&self) -> f64 {
        PetReport::reward_amount(self)
    }

    fn raw_date(&self, key: DateKey) -> Option<&str> {
        match key {
            DateKey::Event => self.event_date.as_deref(),
            DateKey::Created => self.created_at.as_deref(),
        }
    }

    fn coordinate(&self) -> Option<Coordinate> {
        self.location.coordinate
    }
}

/// Distance in km from `reference` to each item; unknown is `f64::INFINITY`.
pub fn distances<T: Rankable>(items: &[T], reference: Option<&Coordinate>) -> Vec<f64> {
    let pins: Vec<Option<Coordinate>> = items.iter().map(Rankable::coordinate).collect();
    distances_from(reference, &pins)
}

/// Milliseconds since the epoch; missing or unparseable dates count as the epoch.
fn date_key_millis<T: Rankable>(item: &T, key: DateKey) -> i64 {
    let raw = item.raw_date(key);
    match raw.and_then(parse_timestamp) {
        Some(ts) => ts.timestamp_millis(),
        None => {
            tracing::warn!(
                report_id = item.rank_id(),
                raw_date = raw.unwrap_or(""),
                date_key = ?key,
                "Unusable date, sorting as epoch"
            );
            0
        }
    }
}

fn order_by<T: Clone, K>(items: &[T], keys: Vec<K>, cmp: impl Fn(&K, &K) -> Ordering) -> Vec<T> {
    let mut indexed: Vec<(usize, K)> = keys.into_iter().enumerate().collect();
    indexed.sort_by(|(_, a), (_, b)| cmp(a, b));
    indexed.into_iter().map(|(i, _)| items[i].clone()).collect()
}

/// Sort any [`Rankable`] items.
pub fn sort_by_mode<T: Rankable + Clone>(items: &[T], options: &SortOptions) -> Ranked<T> {
    let reports = match options.mode {
        SortMode::RewardDesc | SortMode::RewardAsc => {
            let keys: Vec<f64> = items.iter().map(Rankable::reward_amount).collect();
            if options.mode == SortMode::RewardDesc {
                order_by(items, keys, |a, b| b.total_cmp(a))
            } else {
                order_by(items, keys, f64::total_cmp)
            }
        }
        SortMode::DateDesc | SortMode::DateAsc => {
            let keys: Vec<i64> = items
                .iter()
                .map(|item| date_key_millis(item, options.date_key))
                .collect();
            if options.mode == SortMode::DateDesc {
                order_by(items, keys, |a, b| b.cmp(a))
            } else {
                order_by(items, keys, Ord::cmp)
            }
        }
        SortMode::DistanceAsc => {
            let Some(reference) = options.reference.as_ref() else {
                tracing::debug!("Distance sort without a reference, keeping input order");
                return Ranked {
                    reports: items.to_vec(),
                    distance_unavailable: true,
                };
            };
            order_by(items, distances(items, Some(reference)), f64::total_cmp)
        }
    };

    Ranked {
        reports,
        distance_unavailable: false,
    }
}

/// Sort reports.
pub fn sort_reports(reports: &[PetReport], options: &SortOptions) -> Ranked {
    sort_by_mode(reports, options)
}
