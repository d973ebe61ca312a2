//! Place-name search with debouncing.
//!
//! Typing into a search box fires [`DebouncedSearch::submit`] on every
//! keystroke. A request goes out only after the input has been idle for the
//! debounce delay, and only the latest query's results are ever published.

use crate::error::{LocateError, Result};
use crate::generation::Generation;
use async_trait::async_trait;
use pawfinder_core::config::LocateConfig;
use pawfinder_geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A geocoded place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    /// Human-readable name
    pub name: String,
    /// Where it is
    pub coordinate: Coordinate,
}

/// Geocoder backend.
#[async_trait]
pub trait PlaceSearcher: Send + Sync {
    /// Look up places matching `query`.
    async fn search(&self, query: &str) -> Result<Vec<Place>>;
}

#[derive(Debug, Deserialize)]
struct NominatimHit {
    display_name: String,
    lat: String,
    lon: String,
}

/// Nominatim geocoder restricted to one country.
#[derive(Debug, Clone)]
pub struct NominatimSearcher {
    http: reqwest::Client,
    endpoint: String,
    country_code: String,
    limit: usize,
}

impl NominatimSearcher {
    /// Searcher for `endpoint`, restricted to `country_code`.
    pub fn new(endpoint: impl Into<String>, country_code: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("pawfinder/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            country_code: country_code.into(),
            limit: 5,
        })
    }

    /// Searcher from the `[locate]` config section.
    pub fn from_config(config: &LocateConfig) -> Result<Self> {
        Self::new(&config.geocoder_endpoint, &config.country_code)
    }

    /// Maximum results per query.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Interpret a response body; hits with unparseable coordinates are skipped.
    pub fn parse(body: &str) -> Result<Vec<Place>> {
        let hits: Vec<NominatimHit> =
            serde_json::from_str(body).map_err(|e| LocateError::InvalidResponse(e.to_string()))?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let lat = hit.lat.parse::<f64>().ok()?;
                let lon = hit.lon.parse::<f64>().ok()?;
                let coordinate = Coordinate::try_new(lat, lon).ok()?;
                Some(Place {
                    name: hit.display_name,
                    coordinate,
                })
            })
            .collect())
    }
}

#[async_trait]
impl PlaceSearcher for NominatimSearcher {
    #[tracing::instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<Place>> {
        let limit = self.limit.to_string();
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("countrycodes", self.country_code.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = %status, "Geocoder returned non-success");
            return Err(LocateError::Http(format!("geocoder returned {status}")));
        }

        Self::parse(&body)
    }
}

/// Published search state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaceResults {
    /// Query these results answer
    pub query: String,
    /// Matches, best first
    pub places: Vec<Place>,
    /// Failure message when the lookup failed
    pub error: Option<String>,
}

/// Last-request-wins, debounced place search.
pub struct DebouncedSearch {
    searcher: Arc<dyn PlaceSearcher>,
    delay: Duration,
    generation: Generation,
    tx: Arc<watch::Sender<PlaceResults>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for DebouncedSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebouncedSearch")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl DebouncedSearch {
    /// Default idle gap before a request is sent.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

    /// Wrap `searcher` with the given idle gap.
    pub fn new(searcher: Arc<dyn PlaceSearcher>, delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(PlaceResults::default());
        Self {
            searcher,
            delay,
            generation: Generation::new(),
            tx: Arc::new(tx),
            pending: Mutex::new(None),
        }
    }

    /// Wrap `searcher` using the configured debounce.
    pub fn from_config(searcher: Arc<dyn PlaceSearcher>, config: &LocateConfig) -> Self {
        Self::new(searcher, Duration::from_millis(config.search_debounce_ms))
    }

    /// Receive published results.
    pub fn subscribe(&self) -> watch::Receiver<PlaceResults> {
        self.tx.subscribe()
    }

    /// Latest published results.
    pub fn current(&self) -> PlaceResults {
        self.tx.borrow().clone()
    }

    fn replace_pending(&self, next: Option<JoinHandle<()>>) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = next;
    }

    /// Register a keystroke. Must be called from within a Tokio runtime.
    pub fn submit(&self, query: &str) {
        let ticket = self.generation.next();
        let query = query.trim().to_string();

        if query.is_empty() {
            self.replace_pending(None);
            self.tx.send_replace(PlaceResults::default());
            return;
        }

        let searcher = Arc::clone(&self.searcher);
        let generation = self.generation.clone();
        let tx = Arc::clone(&self.tx);
        let delay = self.delay;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !generation.is_current(ticket) {
                return;
            }

            tracing::debug!(query = %query, "Searching places");
            let outcome = searcher.search(&query).await;

            if !generation.is_current(ticket) {
                tracing::debug!(query = %query, "Dropping superseded place results");
                return;
            }
            let results = match outcome {
                Ok(places) => PlaceResults {
                    query,
                    places,
                    error: None,
                },
                Err(err) => {
                    tracing::warn!(query = %query, error = %err, "Place search failed");
                    PlaceResults {
                        query,
                        places: Vec::new(),
                        error: Some(err.to_string()),
                    }
                }
            };
            tx.send_replace(results);
        });

        self.replace_pending(Some(task));
    }

    /// Abort pending work; nothing further is published.
    pub fn close(&self) {
        self.generation.invalidate();
        self.replace_pending(None);
    }
}

impl Drop for DebouncedSearch {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingSearcher {
        calls: Mutex<Vec<String>>,
        latency: Duration,
        count: AtomicUsize,
    }

    impl RecordingSearcher {
        fn new(latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                latency,
                count: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PlaceSearcher for RecordingSearcher {
        async fn search(&self, query: &str) -> Result<Vec<Place>> {
            self.count.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().unwrap().push(query.to_string());
            tokio::time::sleep(self.latency).await;
            Ok(vec![Place {
                name: format!("{query}, Thailand"),
                coordinate: Coordinate::new(13.7563, 100.5018),
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_latest_query_is_sent() {
        let searcher = RecordingSearcher::new(Duration::from_millis(50));
        let search = DebouncedSearch::new(searcher.clone(), DebouncedSearch::DEFAULT_DELAY);
        let mut rx = search.subscribe();

        for query in ["b", "ba", "ban", "bang"] {
            search.submit(query);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        rx.changed().await.unwrap();
        assert_eq!(searcher.calls(), vec!["bang"]);
        assert_eq!(search.current().query, "bang");
        assert_eq!(search.current().places[0].name, "bang, Thailand");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stale_response_is_discarded() {
        let searcher = RecordingSearcher::new(Duration::from_secs(2));
        let search = DebouncedSearch::new(searcher.clone(), DebouncedSearch::DEFAULT_DELAY);

        search.submit("chiang");
        // first request is in flight once the debounce elapses
        tokio::time::sleep(Duration::from_millis(400)).await;
        search.submit("chiang mai");
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(searcher.calls(), vec!["chiang", "chiang mai"]);
        assert_eq!(search.current().query, "chiang mai");
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_clears_without_request() {
        let searcher = RecordingSearcher::new(Duration::ZERO);
        let search = DebouncedSearch::new(searcher.clone(), DebouncedSearch::DEFAULT_DELAY);

        search.submit("phuket");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(search.current().places.len(), 1);

        search.submit("   ");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(search.current(), PlaceResults::default());
        assert_eq!(searcher.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_aborts_pending() {
        let searcher = RecordingSearcher::new(Duration::ZERO);
        let search = DebouncedSearch::new(searcher.clone(), DebouncedSearch::DEFAULT_DELAY);

        search.submit("krabi");
        search.close();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(searcher.calls().is_empty());
        assert_eq!(search.current(), PlaceResults::default());
    }

    #[test]
    fn test_parse_nominatim() {
        let body = r#"[
            {"display_name": "Bangkok, Thailand", "lat": "13.7524938", "lon": "100.4935089"},
            {"display_name": "Broken", "lat": "north", "lon": "100.0"}
        ]"#;
        let places = NominatimSearcher::parse(body).unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name, "Bangkok, Thailand");
        assert!(NominatimSearcher::parse(r#"{"error": "bad"}"#).is_err());
    }
}
