//! Rewards leaderboard: open lost-pet reports that offer a reward.

use crate::model::{PetReport, ReportKind};
use crate::paginate::Page;
use crate::sort::{distances, sort_reports, SortMode, SortOptions};
use pawfinder_geo::Coordinate;
use serde::{Deserialize, Serialize};

/// Leaderboard ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardSort {
    /// Largest reward first
    #[default]
    Reward,
    /// Most recently lost first
    Newest,
    /// Closest first; needs a reference coordinate
    Nearest,
}

impl LeaderboardSort {
    fn mode(self) -> SortMode {
        match self {
            LeaderboardSort::Reward => SortMode::RewardDesc,
            LeaderboardSort::Newest => SortMode::DateDesc,
            LeaderboardSort::Nearest => SortMode::DistanceAsc,
        }
    }
}

/// A ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based position across all pages
    pub rank: usize,
    /// The report
    pub report: PetReport,
    /// Kilometers from the reference, when both pins are known
    pub distance_km: Option<f64>,
}

/// One leaderboard page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    /// Ranked entries on this page
    pub entries: Page<LeaderboardEntry>,
    /// Nearest ordering was requested without a reference
    pub distance_unavailable: bool,
}

/// Leaderboard request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderboardQuery {
    /// Ordering
    pub sort: LeaderboardSort,
    /// User location, used for distances and nearest ordering
    pub reference: Option<Coordinate>,
    /// 1-based page
    pub page: usize,
    /// Entries per page
    pub page_size: usize,
}

impl Default for LeaderboardQuery {
    fn default() -> Self {
        Self {
            sort: LeaderboardSort::default(),
            reference: None,
            page: 1,
            page_size: 12,
        }
    }
}

/// Whether a report belongs on the leaderboard.
pub fn is_eligible(report: &PetReport) -> bool {
    report.kind == ReportKind::Lost && report.status.is_active() && report.reward_amount() > 0.0
}

/// Build one page of the rewards leaderboard.
pub fn rewards_leaderboard(reports: &[PetReport], query: &LeaderboardQuery) -> Leaderboard {
    let eligible: Vec<PetReport> = reports.iter().filter(|r| is_eligible(r)).cloned().collect();

    let options = SortOptions::new(query.sort.mode()).with_reference(query.reference);
    let ranked = sort_reports(&eligible, &options);
    let km = distances(&ranked.reports, query.reference.as_ref());

    let entries: Vec<LeaderboardEntry> = ranked
        .reports
        .into_iter()
        .zip(km)
        .enumerate()
        .map(|(i, (report, d))| LeaderboardEntry {
            rank: i + 1,
            report,
            distance_km: d.is_finite().then_some(d),
        })
        .collect();

    tracing::debug!(
        eligible = entries.len(),
        sort = ?query.sort,
        page = query.page,
        "Built rewards leaderboard"
    );

    Leaderboard {
        entries: Page::of(&entries, query.page, query.page_size),
        distance_unavailable: ranked.distance_unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PetCategory, ReportStatus};

    fn fixture() -> Vec<PetReport> {
        let mut resolved = PetReport::new("resolved", ReportKind::Lost, PetCategory::Dog).with_reward(9000.0);
        resolved.status = ReportStatus::Other("resolved".into());

        vec![
            PetReport::new("small", ReportKind::Lost, PetCategory::Cat)
                .with_reward(300.0)
                .with_event_date("2024-05-01")
                .with_coordinate(Coordinate::new(18.7883, 98.9853)),
            PetReport::new("no_reward", ReportKind::Lost, PetCategory::Cat),
            PetReport::new("zero", ReportKind::Lost, PetCategory::Cat).with_reward(0.0),
            PetReport::new("found", ReportKind::Found, PetCategory::Dog).with_reward(5000.0),
            resolved,
            PetReport::new("big", ReportKind::Lost, PetCategory::Dog)
                .with_reward(3000.0)
                .with_event_date("2024-01-01")
                .with_coordinate(Coordinate::new(13.7563, 100.5018)),
        ]
    }

    fn ids(board: &Leaderboard) -> Vec<&str> {
        board.entries.items.iter().map(|e| e.report.id.as_str()).collect()
    }

    #[test]
    fn test_only_active_lost_with_reward() {
        let board = rewards_leaderboard(&fixture(), &LeaderboardQuery::default());
        assert_eq!(ids(&board), vec!["big", "small"]);
        assert_eq!(board.entries.total_items, 2);
        assert_eq!(board.entries.items[0].rank, 1);
        assert_eq!(board.entries.items[0].distance_km, None);
    }

    #[test]
    fn test_newest_first() {
        let query = LeaderboardQuery {
            sort: LeaderboardSort::Newest,
            ..Default::default()
        };
        assert_eq!(ids(&rewards_leaderboard(&fixture(), &query)), vec!["small", "big"]);
    }

    #[test]
    fn test_nearest_with_distances() {
        let query = LeaderboardQuery {
            sort: LeaderboardSort::Nearest,
            reference: Some(Coordinate::new(18.8, 99.0)),
            ..Default::default()
        };
        let board = rewards_leaderboard(&fixture(), &query);
        assert_eq!(ids(&board), vec!["small", "big"]);
        let near = board.entries.items[0].distance_km.unwrap();
        assert!(near < 5.0);
        assert!(!board.distance_unavailable);
    }

    #[test]
    fn test_nearest_without_reference() {
        let query = LeaderboardQuery {
            sort: LeaderboardSort::Nearest,
            ..Default::default()
        };
        assert!(rewards_leaderboard(&fixture(), &query).distance_unavailable);
    }

    #[test]
    fn test_ranks_continue_across_pages() {
        let query = LeaderboardQuery {
            page: 2,
            page_size: 1,
            ..Default::default()
        };
        let board = rewards_leaderboard(&fixture(), &query);
        assert_eq!(ids(&board), vec!["small"]);
        assert_eq!(board.entries.items[0].rank, 2);
        assert!(board.entries.has_prev);
    }
}
