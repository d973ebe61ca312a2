//! Configuration for the PawFinder API client
//!
//! Supports environment-based configuration with per-environment presets.

use crate::error::{ApiError, ApiResult};
use pawfinder_core::rate_limit::RateLimitConfig;
use pawfinder_core::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Local Supabase started by `supabase start`
const LOCAL_SUPABASE_URL: &str = "http://localhost:54321";

/// Default bucket for report photos
const DEFAULT_BUCKET: &str = "pet-images";

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (localhost Supabase)
    Development,
    /// Staging project
    Staging,
    /// Production project
    #[default]
    Production,
}

impl Environment {
    /// Parse from `PAWFINDER_ENV`
    pub fn from_env() -> Self {
        Self::parse(&env::var("PAWFINDER_ENV").unwrap_or_default())
    }

    /// Parse a name; anything unrecognised is production
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Self::Development,
            "staging" | "stage" => Self::Staging,
            _ => Self::Production,
        }
    }

    fn rate_limit(self) -> RateLimitConfig {
        match self {
            Self::Development => RateLimitConfig::per_minute(1000),
            Self::Staging => RateLimitConfig::per_minute(300),
            Self::Production => RateLimitConfig::per_minute(200),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Supabase project URL, e.g. `https://abc.supabase.co`
    pub supabase_url: String,
    /// Anonymous key (public access, row-level security applies)
    pub anon_key: Option<String>,
    /// Service role key (operator tooling only)
    pub service_role_key: Option<String>,
    /// Storage bucket for report photos
    pub bucket: String,
    /// Request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Retry configuration; off unless set, and applied to reads only
    pub retry: RetryConfig,
    /// Rate limit configuration
    pub rate_limit: RateLimitConfig,
    /// Current environment
    pub environment: Environment,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `SUPABASE_URL`: project URL (required outside development)
    /// - `SUPABASE_ANON_KEY`: anonymous key
    /// - `SUPABASE_SERVICE_ROLE_KEY`: service role key
    /// - `PAWFINDER_ENV`: environment (development/staging/production)
    /// - `PAWFINDER_TIMEOUT_SECS`: request timeout in seconds
    /// - `PAWFINDER_BUCKET`: photo bucket name
    pub fn from_env() -> ApiResult<Self> {
        let environment = Environment::from_env();

        let supabase_url = match env::var("SUPABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            _ if environment == Environment::Development => LOCAL_SUPABASE_URL.to_string(),
            _ => return Err(ApiError::missing_env("SUPABASE_URL")),
        };

        let timeout = env::var("PAWFINDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map_or(Duration::from_secs(30), Duration::from_secs);

        Ok(Self {
            supabase_url,
            anon_key: env::var("SUPABASE_ANON_KEY").ok(),
            service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY").ok(),
            bucket: env::var("PAWFINDER_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string()),
            timeout,
            retry: RetryConfig::no_retry(),
            rate_limit: environment.rate_limit(),
            environment,
        })
    }

    /// Create development configuration (local Supabase)
    #[must_use]
    pub fn development() -> Self {
        Self::preset(Environment::Development, LOCAL_SUPABASE_URL, Duration::from_secs(10))
    }

    /// Create staging configuration for the given project URL
    #[must_use]
    pub fn staging(supabase_url: impl Into<String>) -> Self {
        Self::preset(Environment::Staging, supabase_url, Duration::from_secs(30))
    }

    /// Create production configuration for the given project URL
    #[must_use]
    pub fn production(supabase_url: impl Into<String>) -> Self {
        Self::preset(Environment::Production, supabase_url, Duration::from_secs(30))
    }

    fn preset(environment: Environment, supabase_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            supabase_url: supabase_url.into(),
            anon_key: env::var("SUPABASE_ANON_KEY").ok(),
            service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY").ok(),
            bucket: DEFAULT_BUCKET.to_string(),
            timeout,
            retry: RetryConfig::no_retry(),
            rate_limit: environment.rate_limit(),
            environment,
        }
    }

    /// Builder-style method to set the project URL
    #[must_use]
    pub fn with_supabase_url(mut self, url: impl Into<String>) -> Self {
        self.supabase_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder-style method to set anon key
    #[must_use]
    pub fn with_anon_key(mut self, key: impl Into<String>) -> Self {
        self.anon_key = Some(key.into());
        self
    }

    /// Builder-style method to set service role key
    #[must_use]
    pub fn with_service_role_key(mut self, key: impl Into<String>) -> Self {
        self.service_role_key = Some(key.into());
        self
    }

    /// Builder-style method to set the photo bucket
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set retry config
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Builder-style method to set rate limit config
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// PostgREST URL for a table
    #[must_use]
    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.supabase_url)
    }

    /// Storage API URL
    #[must_use]
    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.supabase_url, path.trim_start_matches('/'))
    }

    /// Auth API URL
    #[must_use]
    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.supabase_url, path.trim_start_matches('/'))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.supabase_url.is_empty() {
            return Err(ApiError::config("supabase_url cannot be empty"));
        }

        if !self.supabase_url.starts_with("http://") && !self.supabase_url.starts_with("https://") {
            return Err(ApiError::config("supabase_url must start with http:// or https://"));
        }

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        if self.bucket.trim().is_empty() {
            return Err(ApiError::config("bucket cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_config() {
        let config = ClientConfig::development();
        assert!(config.supabase_url.contains("localhost"));
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.bucket, "pet-images");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_pattern() {
        let config = ClientConfig::production("https://abc.supabase.co/")
            .with_supabase_url("https://xyz.supabase.co/")
            .with_timeout(Duration::from_secs(60))
            .with_bucket("pet-photos");

        assert_eq!(config.supabase_url, "https://xyz.supabase.co");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.bucket, "pet-photos");
    }

    #[test]
    fn test_service_urls() {
        let config = ClientConfig::development();
        assert_eq!(config.rest_url("lost_pets"), "http://localhost:54321/rest/v1/lost_pets");
        assert_eq!(
            config.storage_url("/object/pet-images/a.jpg"),
            "http://localhost:54321/storage/v1/object/pet-images/a.jpg"
        );
        assert_eq!(config.auth_url("token"), "http://localhost:54321/auth/v1/token");
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::development().validate().is_ok());
        assert!(ClientConfig::development().with_supabase_url("").validate().is_err());
        assert!(ClientConfig::development().with_supabase_url("ftp://x").validate().is_err());
        assert!(ClientConfig::development().with_timeout(Duration::ZERO).validate().is_err());
    }

    #[test]
    fn test_presets_do_not_retry() {
        let presets = [
            ClientConfig::development(),
            ClientConfig::staging("https://abc.supabase.co"),
            ClientConfig::production("https://abc.supabase.co"),
        ];
        for config in presets {
            assert_eq!(config.retry.max_attempts, 1, "{:?}", config.environment);
        }

        let config = ClientConfig::development().with_retry(RetryConfig::quick());
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("DEV"), Environment::Development);
        assert_eq!(Environment::parse("stage"), Environment::Staging);
        assert_eq!(Environment::parse(""), Environment::Production);
    }
}
