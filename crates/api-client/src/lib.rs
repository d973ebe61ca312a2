//! Supabase client for PawFinder
//!
//! This crate provides a resilient HTTP client for the PawFinder backend:
//! report tables, photo storage and identity, plus the report feed and the
//! submission flow built on top of them.
//!
//! # Features
//!
//! - **Environment-based configuration**: Load the project URL and keys from environment variables
//! - **Retry with exponential backoff**: Opt-in, and only for reads; writes are sent once
//! - **Circuit breaker**: Prevent cascading failures during outages
//! - **Rate limiting**: Separate budgets for data, storage and auth, waited on rather than refused
//! - **Request correlation**: Track requests with unique IDs for debugging
//! - **Explicit session**: A [`SessionStore`] handed to whoever needs it
//! - **Settle-all image loading**: One slow photo lookup never blocks the feed
//!
//! # Example
//!
//! ```rust,no_run
//! use pawfinder_api_client::{PawfinderClient, ReportFeed, ReportQuery};
//! use pawfinder_core::config::FeedConfig;
//! use pawfinder_search::ReportKind;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PawfinderClient::new()?;
//!
//!     let health = client.health().check().await;
//!     println!("Backend healthy: {}", health.is_healthy());
//!
//!     let feed = ReportFeed::from_client(&client, &FeedConfig::default());
//!     let lost = feed.load(ReportKind::Lost, &ReportQuery::active()).await?;
//!     println!("{} lost pets", lost.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod feed;
pub mod session;
pub mod submit;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiRequest, PawfinderClient, Service};
pub use config::{ClientConfig, Environment};
pub use endpoints::{NewReport, ReportQuery};
pub use error::{ApiError, ApiResult};
pub use feed::{settle_all, settle_all_outcomes, ImageSource, ReportFeed, ReportSource, Settled};
pub use session::{Session, SessionStore, User};
pub use submit::{PhotoUpload, ReportBackend, ReportForm, SubmitError, SubmitStep, Submitted, Submitter};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::PawfinderClient;
    pub use crate::config::{ClientConfig, Environment};
    pub use crate::endpoints::{AuthApi, HealthApi, ImagesApi, ReportQuery, ReportsApi, StorageApi};
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::feed::{settle_all, ReportFeed};
    pub use crate::session::{Session, SessionStore};
    pub use crate::submit::{ReportForm, Submitter};
}
