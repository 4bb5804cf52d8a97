//! Configuration management for scorebeat

use scorebeat_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Longest accepted run deadline (one day)
pub const MAX_PROBE_TIMEOUT_SECONDS: u64 = 86_400;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Probe settings
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Where check definitions live
    #[serde(default)]
    pub checks: ChecksConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Reject settings no probe could run with
    pub fn validate(&self) -> Result<()> {
        let timeout = self.probe.timeout_seconds;
        if timeout == 0 || timeout > MAX_PROBE_TIMEOUT_SECONDS {
            return Err(Error::InvalidConfig {
                key: String::from("probe.timeout_seconds"),
                message: format!(
                    "must be between 1 and {}, got {}",
                    MAX_PROBE_TIMEOUT_SECONDS, timeout
                ),
            });
        }
        Ok(())
    }

    /// Merge with environment variables (SCOREBEAT_ prefix)
    pub fn merge_env(mut self) -> Self {
        if let Ok(val) = std::env::var("SCOREBEAT_PROBE_TIMEOUT_SECONDS") {
            if let Ok(n) = val.parse() {
                if n > 0 {
                    self.probe.timeout_seconds = n;
                }
            }
        }

        if let Ok(val) = std::env::var("SCOREBEAT_CHECKS_DIR") {
            self.checks.dir = Some(val);
        }

        // Logging
        if let Ok(val) = std::env::var("SCOREBEAT_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("SCOREBEAT_LOG_FORMAT") {
            self.logging.format = val;
        }

        self
    }
}

/// Probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Deadline for one whole check run, in seconds
    #[serde(default = "default_probe_timeout")]
    pub timeout_seconds: u64,
}

fn default_probe_timeout() -> u64 {
    10
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_probe_timeout(),
        }
    }
}

/// Check definition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksConfig {
    /// Directory of YAML check definitions
    pub dir: Option<String>,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            dir: Some(String::from("/etc/scorebeat/checks")),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log span open/close events
    #[serde(default)]
    pub with_spans: bool,

    /// Include the module path of each event
    #[serde(default = "default_true")]
    pub with_target: bool,
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("pretty")
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            with_spans: false,
            with_target: true,
        }
    }
}

/// Builder for constructing Config
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe.timeout_seconds = timeout.as_secs().max(1);
        self
    }

    pub fn checks_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.checks.dir = Some(dir.into());
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn log_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
