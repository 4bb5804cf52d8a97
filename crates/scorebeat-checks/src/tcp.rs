//! TCP check - connect, send `Ping\n`, expect one line of known content

use crate::definition::{require_attributes, CheckDefinition};
use crate::probe::{self, Probe, ProbeError, ProbeStage, Protocol, DEFAULT_MAX_RESPONSE_BYTES};
use scorebeat_core::{Check, CheckConfig, CheckResult, Result, RunContext};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

/// Bytes written to the target once connected
pub const TCP_PROBE_PAYLOAD: &[u8] = b"Ping\n";

/// Check that a TCP service answers `Ping\n` with an expected line
#[derive(Debug, Clone)]
pub struct TcpCheck {
    config: CheckConfig,
    ip: String,
    port: String,
    content: String,
    max_response_bytes: usize,
}

impl TcpCheck {
    /// Create a TCP check; `ip`, `port` and `content` must all be non-empty
    pub fn new(
        config: CheckConfig,
        ip: impl Into<String>,
        port: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self> {
        let check = Self {
            config,
            ip: ip.into(),
            port: port.into(),
            content: content.into(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        };

        require_attributes(
            &check.config.metadata.id,
            &[
                ("ip", &check.ip),
                ("port", &check.port),
                ("content", &check.content),
            ],
        )?;

        Ok(check)
    }

    /// Build from a check definition's attributes
    pub fn from_definition(def: &CheckDefinition) -> Result<Self> {
        Self::new(
            CheckConfig::new(def.metadata()),
            def.attribute("ip"),
            def.attribute("port"),
            def.attribute("content"),
        )
    }

    pub fn with_max_response_bytes(mut self, max: usize) -> Self {
        self.max_response_bytes = max;
        self
    }

    async fn probe(&self, ctx: &RunContext) -> std::result::Result<(), ProbeError> {
        let probe = Probe::new(&self.ip, &self.port, Protocol::Tcp);
        let addr = probe.resolve(ctx).await?;

        let mut stream = probe
            .stage(ctx, ProbeStage::Dialing, TcpStream::connect(addr))
            .await?;

        probe
            .stage(ctx, ProbeStage::Sending, stream.write_all(TCP_PROBE_PAYLOAD))
            .await?;

        let mut reader = BufReader::new(stream);
        let line = probe
            .stage(
                ctx,
                ProbeStage::Receiving,
                probe::read_line(&mut reader, self.max_response_bytes),
            )
            .await?;

        probe.compare(&self.content, &line)
    }
}

#[async_trait::async_trait]
impl Check for TcpCheck {
    async fn run(&self, ctx: &RunContext) -> CheckResult {
        let result = CheckResult::new(self.config.metadata.clone());
        let outcome = self.probe(ctx).await;

        match &outcome {
            Ok(()) => debug!("TCP check {} passed", self.id()),
            Err(e) => debug!("TCP check {} failed while {}: {}", self.id(), e.stage(), e),
        }

        probe::finish(result, outcome)
    }

    fn config(&self) -> &CheckConfig {
        &self.config
    }

    fn set_config(&mut self, config: CheckConfig) {
        self.config = config;
    }
}
