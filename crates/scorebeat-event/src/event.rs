//! Events - a finished check result, ready to be encoded

use chrono::{DateTime, Utc};
use scorebeat_core::CheckResult;
use std::collections::HashMap;

/// A completed check outcome
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub id: String,
    pub name: String,
    pub check_type: String,
    pub group: String,
    pub score_weight: f64,
    pub passed: bool,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl Event {
    /// Project a check result into an event
    pub fn from_result(result: &CheckResult) -> Self {
        let metadata = &result.metadata;
        Self {
            timestamp: result.timestamp,
            id: metadata.id.clone(),
            name: metadata.name.clone(),
            check_type: metadata.check_type.clone(),
            group: metadata.group.clone(),
            score_weight: metadata.score_weight,
            passed: result.passed,
            message: result.message.clone(),
            details: result.details.clone(),
        }
    }
}

impl From<CheckResult> for Event {
    fn from(result: CheckResult) -> Self {
        Self::from_result(&result)
    }
}
