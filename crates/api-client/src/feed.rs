//! Report feed: rows plus their photos.
//!
//! Images are fetched per report, all at once, each with its own timeout. A
//! slow or failing image lookup leaves that report with no photos instead of
//! failing the whole feed.

use crate::client::PawfinderClient;
use crate::endpoints::ReportQuery;
use crate::error::ApiResult;
use async_trait::async_trait;
use futures::future::join_all;
use pawfinder_core::config::FeedConfig;
use pawfinder_search::{PetReport, ReportKind};
use pawfinder_telemetry::Timer;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How one future in a [`settle_all`] batch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled<T> {
    /// Finished with a value
    Value(T),
    /// Finished with an error
    Failed(String),
    /// Did not finish in time
    TimedOut,
}

impl<T> Settled<T> {
    /// The value, or `fallback()` for failures and timeouts.
    pub fn unwrap_or_else(self, fallback: impl FnOnce() -> T) -> T {
        match self {
            Settled::Value(value) => value,
            Settled::Failed(_) | Settled::TimedOut => fallback(),
        }
    }

    /// Whether a value arrived
    pub fn is_value(&self) -> bool {
        matches!(self, Settled::Value(_))
    }
}

/// Run every future concurrently, each bounded by `per_item_timeout`.
///
/// Completes when all have settled. Outcomes are in input order.
pub async fn settle_all_outcomes<I, F, T, E>(futures: I, per_item_timeout: Duration) -> Vec<Settled<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let bounded = futures.into_iter().enumerate().map(|(index, future)| async move {
        match tokio::time::timeout(per_item_timeout, future).await {
            Ok(Ok(value)) => Settled::Value(value),
            Ok(Err(e)) => {
                warn!(index, error = %e, "Item failed, using fallback");
                Settled::Failed(e.to_string())
            }
            Err(_) => {
                warn!(index, timeout_ms = per_item_timeout.as_millis(), "Item timed out, using fallback");
                Settled::TimedOut
            }
        }
    });
    join_all(bounded).await
}

/// Like [`settle_all_outcomes`], with failures and timeouts replaced by `fallback()`.
pub async fn settle_all<I, F, T, E>(futures: I, per_item_timeout: Duration, fallback: impl Fn() -> T) -> Vec<T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    settle_all_outcomes(futures, per_item_timeout)
        .await
        .into_iter()
        .map(|outcome| outcome.unwrap_or_else(&fallback))
        .collect()
}

/// Where report rows come from.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Reports of one kind, without images.
    async fn list_reports(&self, kind: ReportKind, query: &ReportQuery) -> ApiResult<Vec<PetReport>>;
}

/// Where report photos come from.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Photo URLs of one report.
    async fn report_images(&self, kind: ReportKind, report_id: &str) -> ApiResult<Vec<String>>;
}

#[async_trait]
impl ReportSource for PawfinderClient {
    async fn list_reports(&self, kind: ReportKind, query: &ReportQuery) -> ApiResult<Vec<PetReport>> {
        self.reports().list(kind, query).await
    }
}

#[async_trait]
impl ImageSource for PawfinderClient {
    async fn report_images(&self, kind: ReportKind, report_id: &str) -> ApiResult<Vec<String>> {
        self.images().for_report(kind, report_id).await
    }
}

/// Loads reports and attaches their photos.
#[derive(Clone)]
pub struct ReportFeed {
    reports: Arc<dyn ReportSource>,
    images: Arc<dyn ImageSource>,
    image_timeout: Duration,
    list_limit: Option<u32>,
}

impl ReportFeed {
    /// Default per-report image timeout.
    pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Feed over explicit sources.
    pub fn new(reports: Arc<dyn ReportSource>, images: Arc<dyn ImageSource>, image_timeout: Duration) -> Self {
        Self {
            reports,
            images,
            image_timeout,
            list_limit: None,
        }
    }

    /// Cap listings that do not set their own limit.
    #[must_use]
    pub fn with_list_limit(mut self, limit: u32) -> Self {
        self.list_limit = Some(limit);
        self
    }

    /// Feed backed by `client`, using the `[feed]` config section.
    pub fn from_client(client: &PawfinderClient, config: &FeedConfig) -> Self {
        let client = Arc::new(client.clone());
        Self::new(
            client.clone(),
            client,
            Duration::from_millis(config.image_timeout_ms),
        )
        .with_list_limit(config.list_limit)
    }

    /// Per-report image timeout.
    pub fn image_timeout(&self) -> Duration {
        self.image_timeout
    }

    /// Reports of one kind with photos attached.
    ///
    /// Fails only if the report list itself cannot be fetched. A query
    /// without a limit gets the feed's list limit, which also bounds the
    /// number of image lookups.
    pub async fn load(&self, kind: ReportKind, query: &ReportQuery) -> ApiResult<Vec<PetReport>> {
        let timer = Timer::start(format!("feed.load.{kind}"));
        let capped;
        let query = match (query.limit, self.list_limit) {
            (None, Some(limit)) => {
                capped = query.clone().with_limit(limit);
                &capped
            }
            _ => query,
        };
        let mut reports = self.reports.list_reports(kind, query).await?;

        let lookups = reports
            .iter()
            .map(|report| self.images.report_images(kind, &report.id));
        let images = settle_all(lookups, self.image_timeout, Vec::new).await;

        for (report, urls) in reports.iter_mut().zip(images) {
            report.images = urls;
        }

        debug!(
            kind = %kind,
            reports = reports.len(),
            elapsed_ms = timer.stop().as_millis(),
            "Feed loaded"
        );
        Ok(reports)
    }

    /// Lost reports followed by found reports.
    pub async fn load_both(&self, query: &ReportQuery) -> ApiResult<Vec<PetReport>> {
        let (lost, found) = futures::try_join!(
            self.load(ReportKind::Lost, query),
            self.load(ReportKind::Found, query)
        )?;
        let mut all = lost;
        all.extend(found);
        Ok(all)
    }
}
