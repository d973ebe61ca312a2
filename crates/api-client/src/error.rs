//! Error types for the API client

use pawfinder_core::{Error as CoreError, ErrorCode};
use std::fmt;
use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing environment variable
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Backend returned an error response
    #[error("API error ({status}): {message}")]
    ApiResponse {
        /// HTTP status code
        status: u16,
        /// Error message from the backend
        message: String,
    },

    /// Row lookup came back empty
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation needs a signed-in user
    #[error("Not signed in")]
    Unauthenticated,

    /// Circuit breaker is open
    #[error("Circuit breaker is open - service temporarily unavailable")]
    CircuitOpen,

    /// Rate limited
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Request timeout
    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// All retry attempts exhausted
    #[error("All {attempts} retry attempts failed: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Last error message
        last_error: String,
    },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a missing env var error
    pub fn missing_env(var: impl Into<String>) -> Self {
        Self::MissingEnvVar(var.into())
    }

    /// Create an API response error
    pub fn api_response(status: u16, message: impl Into<String>) -> Self {
        Self::ApiResponse {
            status,
            message: message.into(),
        }
    }

    /// Build an error from a non-success response body.
    ///
    /// PostgREST, Storage and Auth each shape their errors differently; the
    /// first of `message`, `error_description`, `msg` or `error` wins, and a
    /// non-JSON body is used verbatim.
    pub fn from_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["message", "error_description", "msg", "error"]
                    .iter()
                    .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_string))
            })
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    "Unknown error".to_string()
                } else {
                    trimmed.to_string()
                }
            });
        Self::api_response(status, message)
    }

    /// Check if this error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(e) => e.is_connect() || e.is_timeout(),
            Self::ApiResponse { status, .. } => *status >= 500 || *status == 429,
            Self::Timeout(_) => true,
            Self::CircuitOpen | Self::RateLimited => false,
            Self::Config(_)
            | Self::MissingEnvVar(_)
            | Self::Json(_)
            | Self::NotFound(_)
            | Self::Unauthenticated
            | Self::InvalidUrl(_)
            | Self::RetriesExhausted { .. } => false,
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if (400..500).contains(status))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if *status >= 500)
    }
}

impl From<ApiError> for CoreError {
    fn from(err: ApiError) -> Self {
        let code = match &err {
            ApiError::Config(_) | ApiError::MissingEnvVar(_) | ApiError::InvalidUrl(_) => {
                ErrorCode::ConfigError
            }
            ApiError::NotFound(_) => ErrorCode::RecordNotFound,
            ApiError::Unauthenticated => ErrorCode::Unauthenticated,
            ApiError::ApiResponse { status: 401 | 403, .. } => ErrorCode::Unauthenticated,
            ApiError::Timeout(_) => ErrorCode::Timeout,
            _ => ErrorCode::BackendError,
        };
        let suggestion = match code {
            ErrorCode::ConfigError => Some("Set SUPABASE_URL and SUPABASE_ANON_KEY"),
            ErrorCode::Unauthenticated => Some("Sign in with `pawfinder auth sign-in`"),
            _ if err.is_retryable() => Some("The backend may be busy; try again shortly"),
            _ => None,
        };
        let mapped = CoreError::new(code, err.to_string());
        match suggestion {
            Some(s) => mapped.with_suggestion(s),
            None => mapped,
        }
    }
}

/// Error context for better debugging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Request ID for correlation
    pub request_id: Option<String>,
    /// Endpoint that was called
    pub endpoint: String,
    /// HTTP method used
    pub method: String,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)?;
        if let Some(ref id) = self.request_id {
            write!(f, " (request_id: {id})")?;
        }
        Ok(())
    }
}
