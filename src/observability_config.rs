//! # Observability Configuration
//!
//! Logging and metrics settings for the decoder CLI.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::errors::{AppError, AppResult};

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogFormat {
    /// Multi-line human readable output
    Pretty,
    /// One line per event
    #[default]
    Compact,
    /// Newline-delimited JSON
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "Invalid LOG_FORMAT '{}': expected pretty, compact or json",
                other
            ))),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level for the decoder's own targets
    pub log_level: String,
    pub log_format: LogFormat,
    /// Whether decode metrics are recorded at all
    pub metrics_enabled: bool,
    /// Prometheus textfile written when the run ends
    pub metrics_textfile: Option<PathBuf>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: true,
            metrics_textfile: None,
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "warn".to_string())
                .to_lowercase(),
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "compact".to_string())
                .parse()?,
            metrics_enabled: env::var("METRICS_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .map_err(|_| AppError::Config("METRICS_ENABLED must be true or false".to_string()))?,
            metrics_textfile: env::var("METRICS_TEXTFILE")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(AppError::Config(format!(
                "Invalid log level '{}': expected one of {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if let Some(path) = &self.metrics_textfile {
            if path.as_os_str().is_empty() || path.is_dir() {
                return Err(AppError::Config(format!(
                    "Metrics textfile must be a file path, got '{}'",
                    path.display()
                )));
            }
        }

        Ok(())
    }

    /// Log level after applying `-v`/`-q` counts from the command line.
    ///
    /// Each `-v` raises verbosity one step from the configured level, each
    /// `-q` lowers it.
    pub fn level_with_verbosity(&self, verbose: u8, quiet: u8) -> &'static str {
        let current = VALID_LOG_LEVELS
            .iter()
            .position(|level| *level == self.log_level)
            .unwrap_or(3) as i32;
        let shifted = (current - verbose as i32 + quiet as i32).clamp(0, 4);
        VALID_LOG_LEVELS[shifted as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_format, LogFormat::Compact);
        assert!(config.metrics_enabled);
        assert!(config.metrics_textfile.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ObservabilityConfig::default();

        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
        config.log_level = "debug".to_string();

        config.metrics_textfile = Some(std::env::temp_dir());
        assert!(config.validate().is_err());
        config.metrics_textfile = Some(std::env::temp_dir().join("decoder.prom"));

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().ok(), Some(LogFormat::Json));
        assert_eq!("pretty".parse::<LogFormat>().ok(), Some(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_level_with_verbosity() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.level_with_verbosity(0, 0), "warn");
        assert_eq!(config.level_with_verbosity(1, 0), "info");
        assert_eq!(config.level_with_verbosity(2, 0), "debug");
        assert_eq!(config.level_with_verbosity(9, 0), "trace");
        assert_eq!(config.level_with_verbosity(0, 1), "error");
        assert_eq!(config.level_with_verbosity(0, 5), "error");
    }
}
