//! Rewards leaderboard command

use crate::context::{api, Context};
use crate::output;
use anyhow::Result;
use owo_colors::OwoColorize;
use pawfinder_api_client::{ReportFeed, ReportQuery};
use pawfinder_geo::{format_distance, Coordinate};
use pawfinder_search::{rewards_leaderboard, LeaderboardQuery, LeaderboardSort, ReportKind};

/// Leaderboard ordering flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RewardSort {
    /// Largest reward first
    Reward,
    /// Most recently lost first
    Newest,
    /// Closest first (needs --near)
    Nearest,
}

impl From<RewardSort> for LeaderboardSort {
    fn from(sort: RewardSort) -> Self {
        match sort {
            RewardSort::Reward => LeaderboardSort::Reward,
            RewardSort::Newest => LeaderboardSort::Newest,
            RewardSort::Nearest => LeaderboardSort::Nearest,
        }
    }
}

/// Show one page of the leaderboard
pub async fn run(
    ctx: &Context,
    sort: RewardSort,
    near: Option<Coordinate>,
    page: usize,
    page_size: Option<usize>,
) -> Result<()> {
    let client = ctx.client()?;
    let feed = ReportFeed::from_client(&client, &ctx.schema().feed);
    let lost = api(feed.load(ReportKind::Lost, &ReportQuery::active()).await)?;

    let query = LeaderboardQuery {
        sort: sort.into(),
        reference: near,
        page,
        page_size: page_size.unwrap_or(LeaderboardQuery::default().page_size),
    };
    let board = rewards_leaderboard(&lost, &query);

    if ctx.is_json() {
        return ctx.print_json(&board);
    }

    output::banner("🏆 Rewards Leaderboard");
    if board.distance_unavailable {
        println!(
            "  {} Nearest ordering needs {}; showing unsorted",
            "⚠".yellow().bold(),
            "--near".bold()
        );
        println!();
    }

    if board.entries.is_empty() {
        println!("  {}", "No open rewards".dimmed());
    }
    for entry in &board.entries.items {
        let report = &entry.report;
        let distance = entry
            .distance_km
            .map(|km| format!(" · {}", format_distance(km)))
            .unwrap_or_default();
        println!(
            "  {:>3}. {:>10}  {} {}{}",
            entry.rank.bold(),
            output::baht(report.reward_amount()).green(),
            report.category.as_str(),
            report.breed,
            format!(" · {}{}", report.location.province, distance).dimmed()
        );
    }
    println!();
    println!(
        "  {}",
        format!(
            "Page {}/{} · {} open rewards",
            board.entries.page,
            board.entries.total_pages.max(1),
            board.entries.total_items
        )
        .dimmed()
    );
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_sort_maps_to_leaderboard() {
        assert_eq!(LeaderboardSort::from(RewardSort::Reward), LeaderboardSort::Reward);
        assert_eq!(LeaderboardSort::from(RewardSort::Newest), LeaderboardSort::Newest);
        assert_eq!(LeaderboardSort::from(RewardSort::Nearest), LeaderboardSort::Nearest);
    }
}
