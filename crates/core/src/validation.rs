//! Form input validation
//!
//! Report forms are validated client-side before any backend call. Each
//! failed rule yields a [`ValidationError`] naming the offending field so a
//! front end can render it inline.
//!
//! # Example
//!
//! ```rust
//! use pawfinder_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .required("breed", "")
//!     .phone("contact_phone", "081-234-5678")
//!     .non_negative("reward", -5.0)
//!     .validate();
//!
//! assert_eq!(result.errors().len(), 2);
//! assert!(result.field_errors("breed").next().is_some());
//! ```

use crate::error::{Error, ErrorCode, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[\w.+-]+@[\w-]+(\.[\w-]+)*\.[A-Za-z]{2,}$").ok());

/// Thai numbers: 0 + 8-9 digits, or +66 with the leading zero dropped.
static PHONE_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^(0\d{8,9}|\+66\d{8,9})$").ok());

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Rule code
    pub code: String,
    /// Expected value (if applicable)
    pub expected: Option<String>,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl ValidationError {
    fn new(field: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            code: code.to_string(),
            expected: None,
            actual: None,
        }
    }

    fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get all warnings
    #[must_use]
    pub fn warnings(&self) -> &[ValidationError] {
        &self.warnings
    }

    /// Errors for a single field, in the order the rules ran
    pub fn field_errors<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.errors.iter().filter(move |e| e.field == field)
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: ValidationError) {
        self.warnings.push(warning);
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Convert to Result type, keeping the field errors on the error value
    pub fn into_result(self) -> Result<()> {
        if self.is_valid() {
            return Ok(());
        }

        let fields: Vec<&str> = self.errors.iter().map(|e| e.field.as_str()).collect();
        let message = format!("{} field(s) invalid: {}", self.errors.len(), fields.join(", "));
        Err(Error::new(ErrorCode::ValidationError, message).with_fields(self.errors))
    }
}

/// Fluent validator builder
#[derive(Default)]
pub struct Validator {
    result: ValidationResult,
}

impl Validator {
    /// Create a new validator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(mut self, error: ValidationError) -> Self {
        self.result.add_error(error);
        self
    }

    /// Validate that a field is not blank
    #[must_use]
    pub fn required(self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            return self.fail(
                ValidationError::new(field, "REQUIRED", "Field is required")
                    .expected("non-empty value")
                    .actual("empty"),
            );
        }
        self
    }

    /// Validate that an optional field was supplied
    #[must_use]
    pub fn present<T>(self, field: &str, value: Option<&T>) -> Self {
        if value.is_none() {
            return self.fail(ValidationError::new(field, "REQUIRED", "Field is required"));
        }
        self
    }

    /// Validate maximum length in characters
    #[must_use]
    pub fn max_length(self, field: &str, value: &str, max: usize) -> Self {
        let len = value.chars().count();
        if len > max {
            return self.fail(
                ValidationError::new(field, "MAX_LENGTH", format!("Must be at most {max} characters"))
                    .expected(format!("<= {max} chars"))
                    .actual(format!("{len} chars")),
            );
        }
        self
    }

    /// Validate against a regex pattern
    #[must_use]
    pub fn pattern(self, field: &str, value: &str, pattern: &str, description: &str) -> Self {
        match Regex::new(pattern) {
            Ok(re) if re.is_match(value) => self,
            Ok(_) => self.fail(
                ValidationError::new(field, "PATTERN", format!("Must match {description}"))
                    .expected(description)
                    .actual(value),
            ),
            Err(_) => self.fail(ValidationError::new(field, "INTERNAL", "Invalid validation pattern")),
        }
    }

    /// Validate an email address; blank values are skipped (use `required` for that)
    #[must_use]
    pub fn email(self, field: &str, value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return self;
        }
        let ok = EMAIL_RE.as_ref().is_some_and(|re| re.is_match(value));
        if ok {
            self
        } else {
            self.fail(
                ValidationError::new(field, "EMAIL", "Must be a valid email address")
                    .expected("name@example.com")
                    .actual(value),
            )
        }
    }

    /// Validate a Thai phone number; spaces and dashes are ignored
    #[must_use]
    pub fn phone(self, field: &str, value: &str) -> Self {
        let digits: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        let ok = PHONE_RE.as_ref().is_some_and(|re| re.is_match(&digits));
        if ok {
            self
        } else {
            self.fail(
                ValidationError::new(field, "PHONE", "Must be a valid phone number")
                    .expected("0XXXXXXXXX or +66XXXXXXXXX")
                    .actual(value),
            )
        }
    }

    /// Validate that a value is in a list of allowed values
    #[must_use]
    pub fn one_of(self, field: &str, value: &str, allowed: &[&str]) -> Self {
        if allowed.contains(&value) {
            return self;
        }
        self.fail(
            ValidationError::new(field, "ONE_OF", format!("Must be one of: {}", allowed.join(", ")))
                .expected(allowed.join(", "))
                .actual(value),
        )
    }

    /// Validate a numeric range (inclusive)
    #[must_use]
    pub fn range<T: PartialOrd + std::fmt::Display>(self, field: &str, value: T, min: T, max: T) -> Self {
        if value < min || value > max {
            return self.fail(
                ValidationError::new(field, "RANGE", format!("Must be between {min} and {max}"))
                    .expected(format!("{min} - {max}"))
                    .actual(value.to_string()),
            );
        }
        self
    }

    /// Validate a finite, non-negative amount
    #[must_use]
    pub fn non_negative(self, field: &str, value: f64) -> Self {
        if value.is_finite() && value >= 0.0 {
            return self;
        }
        self.fail(
            ValidationError::new(field, "NON_NEGATIVE", "Must be zero or more")
                .expected(">= 0")
                .actual(value.to_string()),
        )
    }

    /// Validate that a date is not after `today`
    #[must_use]
    pub fn not_after(self, field: &str, value: NaiveDate, today: NaiveDate) -> Self {
        if value <= today {
            return self;
        }
        self.fail(
            ValidationError::new(field, "FUTURE_DATE", "Date cannot be in the future")
                .expected(format!("<= {today}"))
                .actual(value.to_string()),
        )
    }

    /// Validate a collection size (inclusive bounds)
    #[must_use]
    pub fn count(self, field: &str, len: usize, min: usize, max: usize) -> Self {
        if (min..=max).contains(&len) {
            return self;
        }
        self.fail(
            ValidationError::new(field, "COUNT", format!("Must have between {min} and {max} items"))
                .expected(format!("{min} - {max}"))
                .actual(len.to_string()),
        )
    }

    /// Add a custom validation
    #[must_use]
    pub fn custom<F>(self, field: &str, f: F) -> Self
    where
        F: FnOnce() -> Option<String>,
    {
        match f() {
            Some(message) => self.fail(ValidationError::new(field, "CUSTOM", message)),
            None => self,
        }
    }

    /// Add a warning (non-blocking)
    #[must_use]
    pub fn warn_if(mut self, field: &str, condition: bool, message: &str) -> Self {
        if condition {
            self.result
                .add_warning(ValidationError::new(field, "WARNING", message));
        }
        self
    }

    /// Complete validation and return result
    #[must_use]
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}
