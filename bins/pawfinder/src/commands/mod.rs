//! CLI command implementations

pub mod auth;
pub mod health;
pub mod locate;
pub mod places;
pub mod reports;
pub mod rewards;
pub mod storage;
