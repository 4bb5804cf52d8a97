//! Check results - the canonical outcome of one check run

use crate::check::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of a single check run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// When the run started
    pub timestamp: DateTime<Utc>,

    /// Copy of the check's metadata
    pub metadata: Metadata,

    /// Whether the target behaved as expected
    pub passed: bool,

    /// Why the check failed (empty on success)
    #[serde(default)]
    pub message: String,

    /// Extra diagnostic data for admins
    #[serde(default)]
    pub details: HashMap<String, String>,
}

impl CheckResult {
    /// Start a failed result timestamped now
    pub fn new(metadata: Metadata) -> Self {
        Self {
            timestamp: Utc::now(),
            metadata,
            passed: false,
            message: String::new(),
            details: HashMap::new(),
        }
    }

    pub fn pass(mut self) -> Self {
        self.passed = true;
        self.message.clear();
        self
    }

    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.passed = false;
        self.message = message.into();
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}
