//! Logging configuration using tracing

use crate::config::LoggingConfig;
use scorebeat_core::{Error, Result};
use std::str::FromStr;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format (default for development)
    #[default]
    Pretty,
    /// JSON format (for log aggregation next to the result documents)
    Json,
    /// Compact single-line format
    Compact,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(Error::InvalidConfig {
                key: String::from("logging.format"),
                message: format!("unknown log format {:?}", other),
            }),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level, used when RUST_LOG is unset (default: info)
    pub level: String,
    /// Log format
    pub format: LogFormat,
    /// Include span events (enter/exit)
    pub with_spans: bool,
    /// Include target (module path)
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: LogFormat::Pretty,
            with_spans: false,
            with_target: true,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Build from the `[logging]` section of the config file
    pub fn from_config(config: &LoggingConfig) -> Result<Self> {
        Ok(Self {
            level: config.level.clone(),
            format: config.format.parse()?,
            with_spans: config.with_spans,
            with_target: config.with_target,
        })
    }
}

/// Initialize the global tracing subscriber with default settings
pub fn init_logging() -> Result<()> {
    init_logging_with_config(LogConfig::default())
}

/// Initialize the global tracing subscriber with custom configuration
///
/// Fails if a global subscriber is already installed.
pub fn init_logging_with_config(config: LogConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let span_events = if config.with_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    // Logs go to stderr; stdout carries the encoded documents
    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(span_events)
                    .with_target(config.with_target),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_span_events(span_events)
                    .with_target(config.with_target),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_span_events(span_events)
                    .with_target(config.with_target),
            )
            .try_init(),
    };

    installed.map_err(|e| Error::Configuration(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::new().level("debug").format(LogFormat::Json);

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.with_spans);
        assert!(config.with_target);
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_config_from_config() {
        let section = LoggingConfig {
            level: String::from("trace"),
            format: String::from("compact"),
            with_spans: true,
            with_target: false,
        };
        let config = LogConfig::from_config(&section).unwrap();
        assert_eq!(config.level, "trace");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.with_spans);
        assert!(!config.with_target);
    }

    #[test]
    fn test_second_init_fails() {
        let _ = init_logging_with_config(LogConfig::new().level("warn"));
        assert!(init_logging().is_err());
    }
}
