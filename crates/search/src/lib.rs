//! Report filtering, ranking and pagination for PawFinder.
//!
//! This crate provides:
//! - The pet report data model and the mapping from stored rows
//! - AND-combined filters with explicit wildcards
//! - Stable sorting by reward, date or distance
//! - Page slicing and the rewards leaderboard
//!
//! Everything here is pure: inputs are borrowed and never modified.
//!
//! # Example
//!
//! ```
//! use pawfinder_search::{
//!     filter_reports, paginate, sort_reports, FilterCriteria, PetCategory, PetReport,
//!     ReportKind, SortMode, SortOptions,
//! };
//!
//! let reports = vec![
//!     PetReport::new("1", ReportKind::Lost, PetCategory::Cat).with_reward(500.0),
//!     PetReport::new("2", ReportKind::Lost, PetCategory::Dog).with_reward(900.0),
//!     PetReport::new("3", ReportKind::Lost, PetCategory::Cat).with_reward(2000.0),
//! ];
//!
//! let cats = filter_reports(&reports, &FilterCriteria::any().with_category(PetCategory::Cat));
//! let ranked = sort_reports(&cats, &SortOptions::new(SortMode::RewardDesc));
//! let first_page = paginate(&ranked.reports, 1, 12);
//!
//! assert_eq!(first_page[0].id, "3");
//! ```

mod error;
pub mod filter;
pub mod leaderboard;
pub mod model;
pub mod paginate;
pub mod sort;

pub use error::{Result, SearchError};
pub use filter::{filter_reports, Criterion, FilterCriteria};
pub use leaderboard::{
    rewards_leaderboard, Leaderboard, LeaderboardEntry, LeaderboardQuery, LeaderboardSort,
};
pub use model::{
    Contact, Location, PetCategory, PetReport, ReportKind, ReportRecord, ReportStatus, Reward,
};
pub use paginate::{paginate, total_pages, Page};
pub use sort::{sort_by_mode, sort_reports, DateKey, Rankable, Ranked, SortMode, SortOptions};

pub use pawfinder_geo::Coordinate;
