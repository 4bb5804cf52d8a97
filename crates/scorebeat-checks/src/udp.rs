//! UDP check - send `<payload>\n` to a connected socket, expect one line back

use crate::definition::{require_attributes, CheckDefinition};
use crate::probe::{self, Probe, ProbeError, ProbeStage, Protocol, DEFAULT_MAX_RESPONSE_BYTES};
use scorebeat_core::{Check, CheckConfig, CheckResult, Result, RunContext};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::debug;

/// Check that a UDP service answers a payload with an expected line
#[derive(Debug, Clone)]
pub struct UdpCheck {
    config: CheckConfig,
    ip: String,
    port: String,
    payload: String,
    content: String,
    max_response_bytes: usize,
}

impl UdpCheck {
    /// Create a UDP check; every field must be non-empty
    pub fn new(
        config: CheckConfig,
        ip: impl Into<String>,
        port: impl Into<String>,
        payload: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self> {
        let check = Self {
            config,
            ip: ip.into(),
            port: port.into(),
            payload: payload.into(),
            content: content.into(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        };

        require_attributes(
            &check.config.metadata.id,
            &[
                ("ip", &check.ip),
                ("port", &check.port),
                ("payload", &check.payload),
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
            def.attribute("payload"),
            def.attribute("content"),
        )
    }

    pub fn with_max_response_bytes(mut self, max: usize) -> Self {
        self.max_response_bytes = max;
        self
    }

    async fn probe(&self, ctx: &RunContext) -> std::result::Result<(), ProbeError> {
        let probe = Probe::new(&self.ip, &self.port, Protocol::Udp);
        let addr = probe.resolve(ctx).await?;

        let socket = probe
            .stage(ctx, ProbeStage::Dialing, connect(addr))
            .await?;

        let message = format!("{}\n", self.payload);
        probe
            .stage(ctx, ProbeStage::Sending, socket.send(message.as_bytes()))
            .await?;

        let line = probe
            .stage(
                ctx,
                ProbeStage::Receiving,
                recv_line(&socket, self.max_response_bytes),
            )
            .await?;

        probe.compare(&self.content, &line)
    }
}

#[async_trait::async_trait]
impl Check for UdpCheck {
    async fn run(&self, ctx: &RunContext) -> CheckResult {
        let result = CheckResult::new(self.config.metadata.clone());
        let outcome = self.probe(ctx).await;

        match &outcome {
            Ok(()) => debug!("UDP check {} passed", self.id()),
            Err(e) => debug!("UDP check {} failed while {}: {}", self.id(), e.stage(), e),
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

/// Bind a wildcard socket of the peer's family and connect it to the peer
async fn connect(peer: SocketAddr) -> io::Result<UdpSocket> {
    let local: SocketAddr = if peer.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(local).await?;
    socket.connect(peer).await?;
    Ok(socket)
}

/// Receive datagrams until one carries a newline, returning the line without it
async fn recv_line(socket: &UdpSocket, max: usize) -> io::Result<Vec<u8>> {
    let mut line = Vec::new();
    let mut buf = vec![0u8; max];

    loop {
        let n = socket.recv(&mut buf).await?;

        if let Some(pos) = buf[..n].iter().position(|&b| b == b'\n') {
            line.extend_from_slice(&buf[..pos]);
            return Ok(line);
        }

        line.extend_from_slice(&buf[..n]);
        if line.len() >= max {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("no newline within {} bytes", max),
            ));
        }
    }
}
