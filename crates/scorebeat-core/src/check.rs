//! Check trait and configuration - the interface all network checks implement

use crate::context::RunContext;
use crate::result::CheckResult;
use serde::{Deserialize, Serialize};

/// The trait that all checks must implement
///
/// A check is built once from its definition and then run many times. Each
/// run is independent: it opens its own connection and returns exactly one
/// [`CheckResult`], whether the target passed or not.
#[async_trait::async_trait]
pub trait Check: Send + Sync {
    /// Run a single instance of the check
    async fn run(&self, ctx: &RunContext) -> CheckResult;

    /// Get the configuration this check was initialized with
    fn config(&self) -> &CheckConfig;

    /// Reconfigure this check
    fn set_config(&mut self, config: CheckConfig);

    /// Unique identifier of this check
    fn id(&self) -> &str {
        &self.config().metadata.id
    }
}

/// Identity of a check, owned by whoever scheduled it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Unique identifier (e.g. "web01-tcp-blue1")
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Check type ("tcp", "udp")
    #[serde(rename = "type")]
    pub check_type: String,

    /// Team or group that owns the target
    pub group: String,

    /// Weight of this check when scoring
    #[serde(default = "default_score_weight")]
    pub score_weight: f64,
}

fn default_score_weight() -> f64 {
    1.0
}

impl Metadata {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        check_type: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            check_type: check_type.into(),
            group: group.into(),
            score_weight: default_score_weight(),
        }
    }

    pub fn with_score_weight(mut self, weight: f64) -> Self {
        self.score_weight = weight;
        self
    }
}

/// Configuration blob handed to a check by its scheduler
///
/// Checks copy the metadata into every result but never modify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    pub metadata: Metadata,
}

impl CheckConfig {
    pub fn new(metadata: Metadata) -> Self {
        Self { metadata }
    }
}
