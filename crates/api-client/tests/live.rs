//! Checks against a running backend.
//!
//! Run with `SUPABASE_URL` and `SUPABASE_ANON_KEY` set:
//! `cargo test -p pawfinder-api-client --features integration`

#![cfg(feature = "integration")]

use pawfinder_api_client::{PawfinderClient, ReportFeed, ReportQuery};
use pawfinder_core::config::FeedConfig;
use pawfinder_search::ReportKind;

fn client() -> PawfinderClient {
    PawfinderClient::new().expect("SUPABASE_URL must be set for integration tests")
}

#[tokio::test]
async fn backend_is_healthy() {
    let report = client().health().check().await;
    for status in &report.services {
        assert!(status.is_healthy, "{} unhealthy: {:?}", status.service, status.error);
    }
}

#[tokio::test]
async fn active_reports_load_with_images() {
    let client = client();
    let feed = ReportFeed::from_client(&client, &FeedConfig::default());
    let reports = feed
        .load(ReportKind::Lost, &ReportQuery::active().with_limit(5))
        .await
        .unwrap();

    assert!(reports.len() <= 5);
    assert!(reports.iter().all(|r| r.kind == ReportKind::Lost));
}

#[tokio::test]
async fn buckets_are_listed() {
    let buckets = client().storage().list_buckets().await.unwrap();
    assert!(buckets.iter().all(|b| !b.name.is_empty()));
}
