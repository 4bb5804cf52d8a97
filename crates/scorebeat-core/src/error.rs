//! Error types for scorebeat

use thiserror::Error;

/// Result type alias using scorebeat Error
pub type Result<T> = std::result::Result<T, Error>;

/// scorebeat error types
///
/// Probe failures never surface here: a check run always produces a
/// [`CheckResult`](crate::CheckResult). These errors cover building checks
/// and loading their definitions.
#[derive(Error, Debug)]
pub enum Error {
    // === Check Definition Errors ===
    #[error("Check {check_id} is missing required attributes: {}", missing.join(", "))]
    MissingAttributes {
        check_id: String,
        missing: Vec<String>,
    },

    #[error("Unknown check type for {check_id}: {check_type}")]
    UnknownCheckType { check_id: String, check_type: String },

    #[error("Invalid check definition: {path} - {message}")]
    InvalidCheckDefinition { path: String, message: String },

    #[error("Duplicate check id: {check_id}")]
    DuplicateCheck { check_id: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },
}

impl Error {
    /// Check if this error should stop the beat from starting
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_) | Error::InvalidConfig { .. } | Error::FileNotFound { .. }
        )
    }

    /// Get an error code for logging
    pub fn code(&self) -> &'static str {
        match self {
            Error::MissingAttributes { .. } => "MISSING_ATTRIBUTES",
            Error::UnknownCheckType { .. } => "UNKNOWN_CHECK_TYPE",
            Error::InvalidCheckDefinition { .. } => "INVALID_CHECK_DEF",
            Error::DuplicateCheck { .. } => "DUPLICATE_CHECK",
            Error::Configuration(_) => "CONFIG_ERROR",
            Error::InvalidConfig { .. } => "INVALID_CONFIG",
            Error::Io(_) => "IO_ERROR",
            Error::FileNotFound { .. } => "FILE_NOT_FOUND",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_attributes_lists_every_field() {
        let err = Error::MissingAttributes {
            check_id: String::from("web01-tcp"),
            missing: vec![String::from("ip"), String::from("content")],
        };
        assert_eq!(
            err.to_string(),
            "Check web01-tcp is missing required attributes: ip, content"
        );
        assert_eq!(err.code(), "MISSING_ATTRIBUTES");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_configuration_is_fatal() {
        assert!(Error::Configuration(String::from("bad")).is_fatal());
    }
}
