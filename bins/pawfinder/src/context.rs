//! Shared command state: configuration, output format, backend access

use anyhow::Result;
use pawfinder_api_client::{ApiResult, PawfinderClient};
use pawfinder_core::config::{Config, ConfigSchema};
use pawfinder_core::Error as CoreError;
use pawfinder_telemetry::{LogFormat, TelemetryConfig};
use serde::Serialize;
use std::path::Path;

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    Text,
    /// Pretty-printed JSON on stdout
    Json,
}

/// Everything a command needs besides its own arguments
pub struct Context {
    pub config: Config,
    pub format: OutputFormat,
}

impl Context {
    /// Install logging and load configuration.
    pub fn init(config_path: Option<&Path>, format: OutputFormat, verbose: bool) -> Result<Self> {
        let telemetry = if verbose {
            TelemetryConfig::verbose()
        } else {
            TelemetryConfig {
                log_level: "warn".to_string(),
                ..TelemetryConfig::default()
            }
        };
        let log_format = match format {
            OutputFormat::Text => LogFormat::Compact,
            OutputFormat::Json => LogFormat::Json,
        };
        pawfinder_telemetry::init_with_config(&telemetry.with_format(log_format))?;

        let config = Config::load(config_path)?;
        if let Some(ref path) = config.path {
            tracing::debug!(path = %path.display(), "Loaded configuration");
        }

        Ok(Self { config, format })
    }

    /// Parsed configuration sections
    pub fn schema(&self) -> &ConfigSchema {
        &self.config.schema
    }

    /// Whether to print JSON
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Backend client from the environment
    pub fn client(&self) -> Result<PawfinderClient> {
        api(PawfinderClient::new())
    }

    /// Print `value` as pretty JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Surface backend errors with their code and suggestion.
pub fn api<T>(result: ApiResult<T>) -> Result<T> {
    result.map_err(|e| CoreError::from(e).into())
}
