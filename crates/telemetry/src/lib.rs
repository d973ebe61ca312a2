//! Logging and timing for PawFinder tools
//!
//! - Structured logging with `tracing`, compact or JSON
//! - A per-process session id stamped on startup and on events
//! - [`Timer`] for logging how long an operation took
//! - [`Event`] for one-off structured records (diagnostic runs, submissions)

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize logging with defaults (`info`, compact output)
pub fn init() -> anyhow::Result<()> {
    init_with_config(&TelemetryConfig::default())
}

/// Initialize with custom configuration.
///
/// `RUST_LOG` takes precedence over `config.log_level` when set. Fails if a
/// global subscriber is already installed.
pub fn init_with_config(config: &TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| anyhow::anyhow!("Invalid log filter '{}': {}", config.log_level, e))?;

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_target(config.show_target)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_target(config.show_target)
                    .with_writer(std::io::stderr)
                    .json(),
            )
            .try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single line
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter directive, e.g. `info` or `pawfinder_api_client=debug`
    pub log_level: String,
    /// Output format
    pub format: LogFormat,
    /// Include the module target in each line
    pub show_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Compact,
            show_target: false,
        }
    }
}

impl TelemetryConfig {
    /// Debug-level logging for the PawFinder crates, warnings elsewhere
    #[must_use]
    pub fn verbose() -> Self {
        Self {
            log_level: "warn,pawfinder=debug,pawfinder_api_client=debug,pawfinder_locate=debug,pawfinder_search=debug".to_string(),
            show_target: true,
            ..Self::default()
        }
    }

    /// Switch output format
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Timer for measuring operation duration
pub struct Timer {
    name: String,
    start: Instant,
    stopped: bool,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            stopped: false,
        }
    }

    /// Time elapsed so far
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and log the duration
    pub fn stop(mut self) -> Duration {
        self.stopped = true;
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.name,
            duration_ms = duration.as_millis(),
            "Timer completed"
        );
        duration
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if !self.stopped {
            tracing::debug!(
                operation = %self.name,
                duration_ms = self.start.elapsed().as_millis(),
                "Timer dropped"
            );
        }
    }
}

/// Event for structured logging
#[derive(Debug, Serialize)]
pub struct Event {
    /// When the event was recorded
    pub timestamp: DateTime<Utc>,
    /// Process session id
    pub session_id: String,
    /// Event name, e.g. `diagnostics.upload`
    pub event_type: String,
    /// Arbitrary payload
    pub data: serde_json::Value,
}

impl Event {
    /// Create an event stamped with the current time and session
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            session_id: session_id().to_string(),
            event_type: event_type.into(),
            data,
        }
    }

    /// Emit the event at info level
    pub fn log(&self) {
        tracing::info!(
            event_type = %self.event_type,
            session_id = %self.session_id,
            data = %self.data,
            "Event recorded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer() {
        let timer = Timer::start("search.rank");
        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.stop();
        assert!(duration.as_millis() >= 10);
    }

    #[test]
    fn test_session_id() {
        let id = session_id();
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(id, session_id());
    }

    #[test]
    fn test_event_carries_session() {
        let event = Event::new("diagnostics.upload", serde_json::json!({ "bytes": 1024 }));
        assert_eq!(event.session_id, session_id());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "diagnostics.upload");
        assert_eq!(json["data"]["bytes"], 1024);
    }

    #[test]
    fn test_config_formats() {
        let config = TelemetryConfig::verbose().with_format(LogFormat::Json);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.log_level.contains("pawfinder=debug"));

        let parsed: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(parsed, LogFormat::Json);
    }
}
