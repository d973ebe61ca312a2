//! Error types for the search crate.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur while parsing search input or stored records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    /// A filter or sort parameter could not be understood
    #[error("Invalid {field}: '{value}'")]
    InvalidValue {
        /// Parameter name
        field: &'static str,
        /// Rejected input
        value: String,
    },

    /// A stored row could not be turned into a report
    #[error("Invalid record {id}: {reason}")]
    InvalidRecord {
        /// Row id
        id: String,
        /// What was wrong with it
        reason: String,
    },
}
