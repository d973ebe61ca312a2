//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::{AuthApi, EndpointStatus, HealthApi, ImagesApi, ReportsApi, StorageApi};
use crate::error::{ApiError, ApiResult, ErrorContext};
use crate::session::SessionStore;
use pawfinder_core::rate_limit::RateLimiter;
use pawfinder_core::retry::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// API key header for Supabase
const APIKEY_HEADER: &str = "apikey";

/// Backend service a request goes to; each has its own rate limit bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// PostgREST tables
    Rest,
    /// Object storage
    Storage,
    /// Identity
    Auth,
}

impl Service {
    /// Rate limiter key
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Service::Rest => "rest",
            Service::Storage => "storage",
            Service::Auth => "auth",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Bytes {
        data: Arc<[u8]>,
        content_type: String,
    },
}

/// A request that can be sent more than once.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    service: Service,
    url: String,
    query: Vec<(String, String)>,
    headers: Vec<(&'static str, String)>,
    bearer: Option<String>,
    body: RequestBody,
    throttled: bool,
}

impl ApiRequest {
    /// Request with no body
    pub fn new(method: Method, service: Service, url: impl Into<String>) -> Self {
        Self {
            method,
            service,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            bearer: None,
            body: RequestBody::Empty,
            throttled: true,
        }
    }

    /// GET request
    pub fn get(service: Service, url: impl Into<String>) -> Self {
        Self::new(Method::GET, service, url)
    }

    /// POST request
    pub fn post(service: Service, url: impl Into<String>) -> Self {
        Self::new(Method::POST, service, url)
    }

    /// DELETE request
    pub fn delete(service: Service, url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, service, url)
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Authenticate with this token instead of the session/key default
    #[must_use]
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Serialize `body` as the JSON payload
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Raw payload with the given content type
    #[must_use]
    pub fn bytes(mut self, data: impl Into<Arc<[u8]>>, content_type: impl Into<String>) -> Self {
        self.body = RequestBody::Bytes {
            data: data.into(),
            content_type: content_type.into(),
        };
        self
    }

    /// Skip the client-side rate limiter.
    ///
    /// For follow-up reads fanned out from an already-throttled listing.
    #[must_use]
    pub fn unthrottled(mut self) -> Self {
        self.throttled = false;
        self
    }

    /// Whether a retry policy may resend this request
    #[must_use]
    pub fn is_idempotent(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD)
    }

    /// Target URL without query string
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP method
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }
}

/// PawFinder backend client with built-in resilience patterns
///
/// This client wraps `reqwest` and adds:
/// - Opt-in retry with exponential backoff, for reads only
/// - Circuit breaker to prevent cascading failures
/// - Per-service rate limiting that waits for a token up to the request timeout
/// - Request correlation IDs for tracing
/// - The signed-in session's token on every request
#[derive(Clone)]
pub struct PawfinderClient {
    inner: Client,
    config: Arc<ClientConfig>,
    circuit_breaker: Arc<CircuitBreaker>,
    rate_limiter: Arc<RateLimiter>,
    session: SessionStore,
}

impl fmt::Debug for PawfinderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PawfinderClient")
            .field("supabase_url", &self.config.supabase_url)
            .field("environment", &self.config.environment)
            .field("circuit", &self.circuit_breaker.state())
            .finish_non_exhaustive()
    }
}

impl PawfinderClient {
    /// Create a new client with default configuration from environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration and a fresh session store
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        Self::with_session(config, SessionStore::new())
    }

    /// Create a client sharing an existing session store
    pub fn with_session(config: ClientConfig, session: SessionStore) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("pawfinder-api-client/", env!("CARGO_PKG_VERSION"))),
        );

        if let Some(ref key) = config.anon_key {
            if let Ok(value) = HeaderValue::from_str(key) {
                default_headers.insert(APIKEY_HEADER, value);
            }
        }

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        let circuit_breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default()));
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

        Ok(Self {
            inner,
            config: Arc::new(config),
            circuit_breaker,
            rate_limiter,
            session,
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Session store shared by this client and its clones
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Get circuit breaker state
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    /// Reset the circuit breaker
    pub fn reset_circuit(&self) {
        self.circuit_breaker.reset();
    }

    /// Reset rate limits for a service
    pub fn reset_rate_limit(&self, service: Service) {
        self.rate_limiter.reset(service.as_str());
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access report tables
    #[must_use]
    pub fn reports(&self) -> ReportsApi {
        ReportsApi::new(self.clone())
    }

    /// Access report image tables
    #[must_use]
    pub fn images(&self) -> ImagesApi {
        ImagesApi::new(self.clone())
    }

    /// Access the configured photo bucket
    #[must_use]
    pub fn storage(&self) -> StorageApi {
        StorageApi::new(self.clone(), self.config.bucket.clone())
    }

    /// Access a specific bucket
    #[must_use]
    pub fn storage_bucket(&self, bucket: impl Into<String>) -> StorageApi {
        StorageApi::new(self.clone(), bucket.into())
    }

    /// Access identity endpoints
    #[must_use]
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access health check endpoints
    #[must_use]
    pub fn health(&self) -> HealthApi {
        HealthApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Low-level HTTP methods with resilience
    // -------------------------------------------------------------------------

    /// Send a request and deserialize the JSON response
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> ApiResult<T> {
        let response = self.execute(request).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a request whose response body is not needed
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn send_empty(&self, request: &ApiRequest) -> ApiResult<()> {
        self.execute(request).await?;
        Ok(())
    }

    /// Token sent as `Authorization: Bearer`: session first, then keys
    fn bearer_token(&self, request: &ApiRequest) -> Option<String> {
        request
            .bearer
            .clone()
            .or_else(|| self.session.current().map(|s| s.access_token))
            .or_else(|| self.config.service_role_key.clone())
            .or_else(|| self.config.anon_key.clone())
    }

    /// Execute a request with full resilience patterns
    async fn execute(&self, request: &ApiRequest) -> ApiResult<Response> {
        let request_id = Uuid::new_v4().to_string();

        if !self.circuit_breaker.can_execute() {
            warn!(
                request_id = %request_id,
                url = %request.url,
                "Circuit breaker is open, rejecting request"
            );
            return Err(ApiError::CircuitOpen);
        }

        if request.throttled {
            self.acquire(&request_id, request.service).await?;
        }

        let result = self.execute_with_retry(&request_id, request).await;
        if let Err(ref e) = result {
            let context = ErrorContext {
                request_id: Some(request_id),
                endpoint: request.url.clone(),
                method: request.method.to_string(),
            };
            debug!(context = %context, error = %e, "Request failed");
        }
        result
    }

    /// Wait for a rate limit token, giving up once the wait would outlast the timeout
    async fn acquire(&self, request_id: &str, service: Service) -> ApiResult<()> {
        let deadline = tokio::time::Instant::now() + self.config.timeout;
        loop {
            if self.rate_limiter.try_acquire(service.as_str()) {
                return Ok(());
            }

            let wait = self
                .rate_limiter
                .time_until_available(service.as_str())
                .max(Duration::from_millis(1));
            let ready = tokio::time::Instant::now().checked_add(wait);
            if ready.is_none_or(|at| at > deadline) {
                warn!(
                    request_id = %request_id,
                    service = %service,
                    wait_ms = wait.as_millis(),
                    "Rate limited"
                );
                return Err(ApiError::RateLimited);
            }

            debug!(
                request_id = %request_id,
                service = %service,
                wait_ms = wait.as_millis(),
                "Waiting for rate limit"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Execute request with retry logic; only idempotent requests are resent
    async fn execute_with_retry(&self, request_id: &str, request: &ApiRequest) -> ApiResult<Response> {
        let retry_config = &self.config.retry;
        let max_attempts = if request.is_idempotent() {
            retry_config.max_attempts.max(1)
        } else {
            1
        };
        let mut last_error: Option<ApiError> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = retry_config.delay_for_attempt(attempt);
                debug!(
                    request_id = %request_id,
                    attempt = attempt,
                    delay_ms = delay.as_millis(),
                    "Retrying after delay"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();
            let result = self.execute_single_request(request_id, request).await;
            let elapsed = start.elapsed();

            match result {
                Ok(response) => {
                    self.circuit_breaker.record_success();
                    debug!(
                        request_id = %request_id,
                        attempt = attempt + 1,
                        elapsed_ms = elapsed.as_millis(),
                        "Request succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    // 4xx answers mean the service is up
                    if e.is_client_error() {
                        self.circuit_breaker.record_success();
                    } else {
                        self.circuit_breaker.record_failure();
                    }

                    if e.is_retryable() && attempt + 1 < max_attempts {
                        debug!(
                            request_id = %request_id,
                            attempt = attempt + 1,
                            error = %e,
                            "Request failed, will retry"
                        );
                        last_error = Some(e);
                    } else {
                        debug!(
                            request_id = %request_id,
                            attempt = attempt + 1,
                            error = %e,
                            "Request failed, not retrying"
                        );
                        return Err(e);
                    }
                }
            }
        }

        Err(ApiError::RetriesExhausted {
            attempts: max_attempts,
            last_error: last_error.map_or_else(|| "Unknown error".to_string(), |e| e.to_string()),
        })
    }

    /// Execute a single request without retry
    async fn execute_single_request(&self, request_id: &str, request: &ApiRequest) -> ApiResult<Response> {
        let mut builder = self
            .inner
            .request(request.method.clone(), &request.url)
            .header(X_REQUEST_ID, request_id);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(token) = self.bearer_token(request) {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Bytes { data, content_type } => builder
                .header(CONTENT_TYPE, content_type.as_str())
                .body(data.to_vec()),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.config.timeout)
            } else {
                ApiError::Request(e)
            }
        })?;
        Self::check_status(response).await
    }

    /// Turn a non-success response into an error
    async fn check_status(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_body(status.as_u16(), &body))
    }

    /// Single unretried request that reports status instead of failing on it
    pub async fn probe(&self, service: Service, url: &str) -> ApiResult<EndpointStatus> {
        if !self.circuit_breaker.can_execute() {
            return Err(ApiError::CircuitOpen);
        }

        let request_id = Uuid::new_v4().to_string();
        let mut builder = self.inner.get(url).header(X_REQUEST_ID, &request_id);
        if let Some(ref key) = self.config.anon_key {
            builder = builder.header(AUTHORIZATION, format!("Bearer {key}"));
        }

        let start = Instant::now();
        let response = builder.send().await?;
        let elapsed = start.elapsed();

        let status = response.status();
        if status.is_server_error() {
            self.circuit_breaker.record_failure();
        } else {
            self.circuit_breaker.record_success();
        }

        Ok(EndpointStatus {
            service,
            url: url.to_string(),
            status_code: Some(status.as_u16()),
            response_time: elapsed,
            is_healthy: status.is_success(),
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::ReportQuery;
    use crate::session::{Session, User};
    use crate::testing::serve;
    use pawfinder_core::rate_limit::RateLimitConfig;
    use pawfinder_core::retry::RetryConfig;
    use pawfinder_search::ReportKind;

    fn client() -> PawfinderClient {
        let config = ClientConfig::development()
            .with_anon_key("anon")
            .with_service_role_key("service");
        PawfinderClient::with_config(config).unwrap()
    }

    fn local(url: &str) -> ClientConfig {
        ClientConfig::development().with_supabase_url(url).with_anon_key("anon")
    }

    fn strict(max_requests: u32, window: Duration) -> RateLimitConfig {
        RateLimitConfig {
            max_requests,
            window,
            burst: 0,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = client();
        assert_eq!(client.circuit_state(), CircuitState::Closed);
        assert!(!client.session().is_signed_in());
        assert!(PawfinderClient::with_config(ClientConfig::development().with_supabase_url("")).is_err());
    }

    #[test]
    fn test_bearer_priority() {
        let client = client();
        let request = ApiRequest::get(Service::Rest, client.config().rest_url("lost_pets"));
        assert_eq!(client.bearer_token(&request).as_deref(), Some("service"));

        client.session().set(Session {
            access_token: "user-token".into(),
            refresh_token: None,
            expires_at: None,
            user: User {
                id: "u1".into(),
                email: None,
            },
        });
        assert_eq!(client.bearer_token(&request).as_deref(), Some("user-token"));

        let explicit = request.bearer("explicit");
        assert_eq!(client.bearer_token(&explicit).as_deref(), Some("explicit"));
    }

    #[test]
    fn test_clones_share_session() {
        let client = client();
        let clone = client.clone();
        clone.session().set(Session {
            access_token: "t".into(),
            refresh_token: None,
            expires_at: None,
            user: User {
                id: "u2".into(),
                email: None,
            },
        });
        assert_eq!(client.session().user().map(|u| u.id), Some("u2".into()));
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::post(Service::Storage, "http://localhost/storage/v1/object/b/a.jpg")
            .header("x-upsert", "false")
            .bytes(vec![1u8, 2, 3], "image/jpeg");
        assert_eq!(*request.method(), Method::POST);
        assert!(matches!(request.body, RequestBody::Bytes { ref data, .. } if data.len() == 3));

        let json = ApiRequest::post(Service::Rest, "http://localhost/rest/v1/x")
            .json(&serde_json::json!({"a": 1}))
            .unwrap();
        assert!(matches!(json.body, RequestBody::Json(_)));
    }

    #[test]
    fn test_service_keys() {
        assert_eq!(Service::Rest.as_str(), "rest");
        assert_eq!(Service::Storage.to_string(), "storage");
    }

    #[tokio::test]
    async fn test_writes_are_sent_once() {
        for retry in [RetryConfig::no_retry(), RetryConfig::quick()] {
            let (url, seen) = serve(vec![(503, ""), (201, "")]);
            let client = PawfinderClient::with_config(local(&url).with_retry(retry)).unwrap();

            let result = client
                .images()
                .insert(ReportKind::Lost, "r1", &["https://x/a.jpg".to_string()])
                .await;

            assert!(matches!(result, Err(ApiError::ApiResponse { status: 503, .. })));
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0], "POST /rest/v1/lost_pet_images");
        }
    }

    #[tokio::test]
    async fn test_reads_are_not_retried_by_default() {
        let (url, seen) = serve(vec![(503, ""), (200, "[]")]);
        let client = PawfinderClient::with_config(local(&url)).unwrap();

        let result = client.reports().list(ReportKind::Lost, &ReportQuery::active()).await;

        assert!(result.is_err());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reads_retry_when_enabled() {
        let (url, seen) = serve(vec![(503, ""), (200, "[]")]);
        let client = PawfinderClient::with_config(local(&url).with_retry(RetryConfig::quick())).unwrap();

        let reports = client
            .reports()
            .list(ReportKind::Lost, &ReportQuery::active())
            .await
            .unwrap();

        assert!(reports.is_empty());
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_image_lookups_skip_rate_limit() {
        let (url, seen) = serve(vec![(200, "[]")]);
        let config = local(&url).with_rate_limit(strict(1, Duration::from_secs(60)));
        let client = PawfinderClient::with_config(config).unwrap();

        client
            .reports()
            .list(ReportKind::Lost, &ReportQuery::active())
            .await
            .unwrap();
        for id in ["r1", "r2", "r3", "r4", "r5"] {
            let images = client.images().for_report(ReportKind::Lost, id).await.unwrap();
            assert!(images.is_empty());
        }

        // The listing budget is spent and refills long after the timeout
        let result = client.reports().list(ReportKind::Lost, &ReportQuery::active()).await;
        assert!(matches!(result, Err(ApiError::RateLimited)));
        assert_eq!(seen.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_rate_limit_waits_for_a_token() {
        let (url, seen) = serve(vec![(200, "[]")]);
        let config = local(&url).with_rate_limit(strict(2, Duration::from_millis(200)));
        let client = PawfinderClient::with_config(config).unwrap();

        for _ in 0..3 {
            client
                .reports()
                .list(ReportKind::Found, &ReportQuery::new())
                .await
                .unwrap();
        }
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_only_reads_are_idempotent() {
        assert!(ApiRequest::get(Service::Rest, "http://x").is_idempotent());
        assert!(!ApiRequest::post(Service::Rest, "http://x").is_idempotent());
        assert!(!ApiRequest::delete(Service::Rest, "http://x").is_idempotent());
    }
}
