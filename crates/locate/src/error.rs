//! Error types for location lookups and place search.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for location operations.
pub type Result<T> = std::result::Result<T, LocateError>;

/// One step of the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Device fix with high accuracy requested
    HighAccuracy,
    /// Device fix with low accuracy
    LowAccuracy,
    /// IP geolocation over HTTP
    IpLookup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::HighAccuracy => "high-accuracy device",
            Stage::LowAccuracy => "low-accuracy device",
            Stage::IpLookup => "IP lookup",
        })
    }
}

/// Why a single stage failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    /// Which stage
    pub stage: Stage,
    /// What went wrong
    pub reason: String,
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.reason)
    }
}

/// Errors from locating the user or searching places.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocateError {
    /// The user or platform refused location access
    #[error("Location permission denied")]
    PermissionDenied,

    /// The device could not produce a fix
    #[error("Device location unavailable: {0}")]
    Unavailable(String),

    /// A step did not answer in time
    #[error("Timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// HTTP failure talking to a lookup service
    #[error("HTTP error: {0}")]
    Http(String),

    /// A lookup service answered with something unusable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Every stage of the chain failed
    #[error("Could not determine location ({})", join_failures(.0))]
    Exhausted(Vec<StageFailure>),

    /// The request was cancelled before it finished
    #[error("Location request cancelled")]
    Cancelled,
}

fn join_failures(failures: &[StageFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl LocateError {
    /// What the user can do about it.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            LocateError::PermissionDenied => {
                Some("Allow location access, or pick your area on the map instead")
            }
            LocateError::Exhausted(failures) => {
                if failures.iter().any(|f| f.stage == Stage::IpLookup) {
                    Some("Check your network connection, or pick your area on the map instead")
                } else {
                    Some("Pick your area on the map instead")
                }
            }
            LocateError::Timeout(_) | LocateError::Unavailable(_) => {
                Some("Move somewhere with better signal and try again")
            }
            LocateError::Http(_) | LocateError::InvalidResponse(_) => {
                Some("The lookup service may be down; try again later")
            }
            LocateError::Cancelled => None,
        }
    }

    /// Whether this error ends the chain immediately.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LocateError::Cancelled)
    }
}

impl From<reqwest::Error> for LocateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LocateError::InvalidResponse(err.to_string())
        } else {
            LocateError::Http(err.to_string())
        }
    }
}

impl From<LocateError> for pawfinder_core::Error {
    fn from(err: LocateError) -> Self {
        use pawfinder_core::ErrorCode;

        let code = match &err {
            LocateError::Timeout(_) => ErrorCode::LocationTimeout,
            LocateError::Exhausted(_) | LocateError::Unavailable(_) | LocateError::PermissionDenied => {
                ErrorCode::LocationUnavailable
            }
            _ => ErrorCode::LocationError,
        };
        let suggestion = err.suggestion();
        let mapped = pawfinder_core::Error::new(code, err.to_string());
        match suggestion {
            Some(s) => mapped.with_suggestion(s),
            None => mapped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_lists_stages() {
        let err = LocateError::Exhausted(vec![
            StageFailure {
                stage: Stage::HighAccuracy,
                reason: "Timed out after 15000ms".into(),
            },
            StageFailure {
                stage: Stage::IpLookup,
                reason: "HTTP error: connection refused".into(),
            },
        ]);
        let message = err.to_string();
        assert!(message.contains("high-accuracy device: Timed out after 15000ms"));
        assert!(message.contains("IP lookup: HTTP error"));
        assert!(err.suggestion().unwrap().contains("network"));
    }

    #[test]
    fn test_core_error_mapping() {
        let err: pawfinder_core::Error = LocateError::Timeout(Duration::from_secs(10)).into();
        assert_eq!(err.code, pawfinder_core::ErrorCode::LocationTimeout);
        assert!(err.suggestion.is_some());
        assert!(!LocateError::Timeout(Duration::ZERO).is_cancelled());
    }
}
