//! Core utilities shared by the PawFinder crates
//!
//! - **Error handling**: coded errors with context and recovery suggestions
//! - **Validation**: fluent field validation for report forms
//! - **Configuration**: TOML-based configuration with defaults for every field
//! - **Resilience**: retry backoff, circuit breaker and rate limiting used by
//!   the backend client
//!
//! # Example
//!
//! ```rust
//! use pawfinder_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .required("contact_name", "Somchai")
//!     .email("contact_email", "somchai@example.com")
//!     .validate();
//!
//! assert!(result.is_valid());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod rate_limit;
pub mod retry;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema, OrphanPolicy};
    pub use crate::error::{Error, ErrorCode, Result, ResultExt};
    pub use crate::rate_limit::{RateLimitConfig, RateLimiter};
    pub use crate::retry::{CircuitBreaker, CircuitState, RetryConfig};
    pub use crate::validation::{ValidationResult, Validator};
}
