//! Geolocation fallback chain.
//!
//! Stages run strictly in order and stop at the first success:
//!
//! 1. device fix with high accuracy (15 s by default)
//! 2. device fix with low accuracy (10 s)
//! 3. IP lookup
//!
//! There is no automatic retry; a new request starts again at stage 1.

use crate::error::{LocateError, Result, Stage, StageFailure};
use crate::providers::{DeviceLocator, IpLocator};
use pawfinder_core::config::LocateConfig;
use pawfinder_geo::Coordinate;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How a coordinate was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    /// High-accuracy device fix
    Precise,
    /// Low-accuracy device fix
    Approximate,
    /// IP lookup, named after the city when known
    CityLevel {
        /// City reported by the lookup service
        city: Option<String>,
    },
}

impl Provenance {
    /// Short label for display.
    ///
    /// ```
    /// use pawfinder_locate::Provenance;
    ///
    /// let city = Provenance::CityLevel { city: Some("Bangkok".into()) };
    /// assert_eq!(city.label(), "city-level, named Bangkok");
    /// assert_eq!(Provenance::Precise.label(), "precise");
    /// ```
    pub fn label(&self) -> String {
        match self {
            Provenance::Precise => "precise".to_string(),
            Provenance::Approximate => "approximate".to_string(),
            Provenance::CityLevel { city: Some(city) } => format!("city-level, named {city}"),
            Provenance::CityLevel { city: None } => "city-level".to_string(),
        }
    }
}

/// A successful lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Located {
    /// Where the user is
    pub coordinate: Coordinate,
    /// How we know
    pub provenance: Provenance,
}

impl Located {
    /// Display label of the provenance.
    pub fn label(&self) -> String {
        self.provenance.label()
    }
}

impl fmt::Display for Located {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.coordinate, self.label())
    }
}

/// Per-stage time limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainTimeouts {
    /// High-accuracy device stage
    pub high_accuracy: Duration,
    /// Low-accuracy device stage
    pub low_accuracy: Duration,
    /// IP lookup stage
    pub ip_lookup: Duration,
}

impl Default for ChainTimeouts {
    fn default() -> Self {
        Self::from_config(&LocateConfig::default())
    }
}

impl ChainTimeouts {
    /// Timeouts from the `[locate]` config section.
    pub fn from_config(config: &LocateConfig) -> Self {
        Self {
            high_accuracy: Duration::from_millis(config.high_accuracy_timeout_ms),
            low_accuracy: Duration::from_millis(config.low_accuracy_timeout_ms),
            ip_lookup: Duration::from_millis(config.ip_timeout_ms),
        }
    }
}

/// Device then IP fallback chain.
#[derive(Clone)]
pub struct LocationChain {
    device: Arc<dyn DeviceLocator>,
    ip: Arc<dyn IpLocator>,
    timeouts: ChainTimeouts,
}

impl fmt::Debug for LocationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationChain")
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

async fn within<T>(limit: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .unwrap_or(Err(LocateError::Timeout(limit)))
}

impl LocationChain {
    /// Build a chain over a device and an IP service.
    pub fn new(device: Arc<dyn DeviceLocator>, ip: Arc<dyn IpLocator>, timeouts: ChainTimeouts) -> Self {
        Self { device, ip, timeouts }
    }

    /// Stage limits in use.
    pub fn timeouts(&self) -> ChainTimeouts {
        self.timeouts
    }

    /// Run the chain to completion.
    #[tracing::instrument(skip(self))]
    pub async fn locate(&self) -> Result<Located> {
        let mut failures = Vec::with_capacity(3);

        for (stage, high_accuracy, limit, provenance) in [
            (Stage::HighAccuracy, true, self.timeouts.high_accuracy, Provenance::Precise),
            (Stage::LowAccuracy, false, self.timeouts.low_accuracy, Provenance::Approximate),
        ] {
            match within(limit, self.device.current_position(high_accuracy)).await {
                Ok(coordinate) => {
                    info!(%stage, %coordinate, "Location resolved");
                    return Ok(Located { coordinate, provenance });
                }
                Err(err) => {
                    warn!(%stage, error = %err, "Location stage failed, falling back");
                    failures.push(StageFailure {
                        stage,
                        reason: err.to_string(),
                    });
                }
            }
        }

        match within(self.timeouts.ip_lookup, self.ip.locate()).await {
            Ok(found) => {
                info!(
                    coordinate = %found.coordinate,
                    city = found.city.as_deref().unwrap_or("unknown"),
                    "Location resolved from IP"
                );
                Ok(Located {
                    coordinate: found.coordinate,
                    provenance: Provenance::CityLevel { city: found.city },
                })
            }
            Err(err) => {
                warn!(error = %err, "IP lookup failed, no location available");
                failures.push(StageFailure {
                    stage: Stage::IpLookup,
                    reason: err.to_string(),
                });
                Err(LocateError::Exhausted(failures))
            }
        }
    }

    /// Run the chain in the background.
    pub fn spawn(&self) -> LocationRequest {
        let chain = self.clone();
        LocationRequest::new(tokio::spawn(async move { chain.locate().await }))
    }
}

/// Handle to an in-flight lookup. Dropping it cancels the lookup.
#[derive(Debug)]
pub struct LocationRequest {
    handle: Option<JoinHandle<Result<Located>>>,
}

impl LocationRequest {
    pub(crate) fn new(handle: JoinHandle<Result<Located>>) -> Self {
        Self { handle: Some(handle) }
    }

    /// Wait for the outcome.
    pub async fn wait(mut self) -> Result<Located> {
        let Some(handle) = self.handle.take() else {
            return Err(LocateError::Cancelled);
        };
        match handle.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(LocateError::Cancelled),
            Err(err) => Err(LocateError::Unavailable(format!("location task failed: {err}"))),
        }
    }

    /// Abort the lookup and any pending timers.
    pub fn cancel(mut self) {
        self.abort();
    }

    /// Whether the lookup has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Cancelling location request");
            handle.abort();
        }
    }
}

impl Drop for LocationRequest {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::providers::{FixedDevice, IpLocation, NoDevice};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A device that never answers.
    pub(crate) struct SilentDevice;

    #[async_trait]
    impl DeviceLocator for SilentDevice {
        async fn current_position(&self, _high_accuracy: bool) -> Result<Coordinate> {
            std::future::pending().await
        }
    }

    /// Answers only low accuracy requests.
    struct LowOnlyDevice(Coordinate);

    #[async_trait]
    impl DeviceLocator for LowOnlyDevice {
        async fn current_position(&self, high_accuracy: bool) -> Result<Coordinate> {
            if high_accuracy {
                std::future::pending().await
            } else {
                Ok(self.0)
            }
        }
    }

    pub(crate) struct FakeIp {
        pub(crate) answer: Result<IpLocation>,
        pub(crate) calls: AtomicUsize,
    }

    impl FakeIp {
        pub(crate) fn city(name: &str, coordinate: Coordinate) -> Self {
            Self {
                answer: Ok(IpLocation {
                    coordinate,
                    city: Some(name.to_string()),
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                answer: Err(LocateError::Http("connection refused".into())),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl IpLocator for FakeIp {
        async fn locate(&self) -> Result<IpLocation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    fn bangkok() -> Coordinate {
        Coordinate::new(13.7563, 100.5018)
    }

    #[tokio::test(start_paused = true)]
    async fn test_falls_back_to_ip_after_both_timeouts() {
        let ip = Arc::new(FakeIp::city("Bangkok", bangkok()));
        let chain = LocationChain::new(Arc::new(SilentDevice), ip.clone(), ChainTimeouts::default());

        let start = tokio::time::Instant::now();
        let located = chain.locate().await.unwrap();

        assert_eq!(located.coordinate, bangkok());
        assert!(located.label().contains("Bangkok"));
        assert_eq!(start.elapsed(), Duration::from_secs(25));
        assert_eq!(ip.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_precise_fix_skips_fallbacks() {
        let ip = Arc::new(FakeIp::city("Bangkok", bangkok()));
        let here = Coordinate::new(18.7883, 98.9853);
        let chain = LocationChain::new(Arc::new(FixedDevice::new(here)), ip.clone(), ChainTimeouts::default());

        let located = chain.locate().await.unwrap();
        assert_eq!(located.provenance, Provenance::Precise);
        assert_eq!(located.coordinate, here);
        assert_eq!(ip.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_accuracy_after_high_timeout() {
        let here = Coordinate::new(7.8804, 98.3923);
        let chain = LocationChain::new(
            Arc::new(LowOnlyDevice(here)),
            Arc::new(FakeIp::failing()),
            ChainTimeouts::default(),
        );

        let start = tokio::time::Instant::now();
        let located = chain.locate().await.unwrap();
        assert_eq!(located.provenance, Provenance::Approximate);
        assert_eq!(located.label(), "approximate");
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_reports_every_stage() {
        let chain = LocationChain::new(Arc::new(NoDevice), Arc::new(FakeIp::failing()), ChainTimeouts::default());

        let err = chain.locate().await.unwrap_err();
        let LocateError::Exhausted(failures) = &err else {
            panic!("expected exhaustion, got {err:?}");
        };
        let stages: Vec<Stage> = failures.iter().map(|f| f.stage).collect();
        assert_eq!(stages, vec![Stage::HighAccuracy, Stage::LowAccuracy, Stage::IpLookup]);
        assert!(err.suggestion().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_request() {
        let ip = Arc::new(FakeIp::city("Bangkok", bangkok()));
        let chain = LocationChain::new(Arc::new(SilentDevice), ip.clone(), ChainTimeouts::default());

        let request = chain.spawn();
        tokio::time::sleep(Duration::from_secs(1)).await;
        request.cancel();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(ip.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_request_completes() {
        let chain = LocationChain::new(
            Arc::new(NoDevice),
            Arc::new(FakeIp::city("Chiang Mai", Coordinate::new(18.7883, 98.9853))),
            ChainTimeouts::default(),
        );

        let located = chain.spawn().wait().await.unwrap();
        assert_eq!(located.label(), "city-level, named Chiang Mai");
    }
}
