//! Probe plumbing shared by the TCP and UDP checks
//!
//! A probe walks through fixed stages (resolve, dial, send, receive,
//! compare). Each I/O stage is bounded by the run context, and the first
//! failing stage ends the probe with a [`ProbeError`] naming that stage.

use scorebeat_core::{CheckResult, Interrupted, RunContext};
use std::fmt;
use std::future::Future;
use std::io;
use std::net::{Ipv6Addr, SocketAddr};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::net::lookup_host;
use tracing::trace;

/// Default cap on how many bytes a probe reads while waiting for a newline
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 4096;

/// Transport used by a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage a probe was in when it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    Resolving,
    Dialing,
    Sending,
    Receiving,
    Comparing,
}

impl ProbeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStage::Resolving => "resolving",
            ProbeStage::Dialing => "dialing",
            ProbeStage::Sending => "sending to",
            ProbeStage::Receiving => "receiving from",
            ProbeStage::Comparing => "comparing",
        }
    }
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a probe failed
///
/// These never escape a check run; they become the message of a failed
/// [`CheckResult`].
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Problem converting IP/port {target} to {protocol} address: {source}")]
    Resolution {
        target: String,
        protocol: Protocol,
        #[source]
        source: io::Error,
    },

    #[error("No {protocol} address found for {target}")]
    NoAddress { target: String, protocol: Protocol },

    #[error("Problem dialing to {target} with {protocol}: {source}")]
    Dial {
        target: String,
        protocol: Protocol,
        #[source]
        source: io::Error,
    },

    #[error("Problem sending message to {target} with {protocol}: {source}")]
    Write {
        target: String,
        protocol: Protocol,
        #[source]
        source: io::Error,
    },

    #[error("Problem receiving data from {target} via {protocol}: {source}")]
    Read {
        target: String,
        protocol: Protocol,
        #[source]
        source: io::Error,
    },

    #[error("Timed out {stage} {target} via {protocol}")]
    Timeout {
        stage: ProbeStage,
        target: String,
        protocol: Protocol,
    },

    #[error("Cancelled while {stage} {target} via {protocol}")]
    Cancelled {
        stage: ProbeStage,
        target: String,
        protocol: Protocol,
    },

    #[error("Incorrect data received from {target} via {protocol}. Expected {expected:?}, got {received:?}.")]
    ContentMismatch {
        target: String,
        protocol: Protocol,
        expected: String,
        received: String,
    },
}

impl ProbeError {
    /// Stage the probe failed in
    pub fn stage(&self) -> ProbeStage {
        match self {
            ProbeError::Resolution { .. } | ProbeError::NoAddress { .. } => ProbeStage::Resolving,
            ProbeError::Dial { .. } => ProbeStage::Dialing,
            ProbeError::Write { .. } => ProbeStage::Sending,
            ProbeError::Read { .. } => ProbeStage::Receiving,
            ProbeError::Timeout { stage, .. } | ProbeError::Cancelled { stage, .. } => *stage,
            ProbeError::ContentMismatch { .. } => ProbeStage::Comparing,
        }
    }

    fn io(stage: ProbeStage, target: String, protocol: Protocol, source: io::Error) -> Self {
        match stage {
            ProbeStage::Resolving => ProbeError::Resolution {
                target,
                protocol,
                source,
            },
            ProbeStage::Dialing => ProbeError::Dial {
                target,
                protocol,
                source,
            },
            ProbeStage::Sending => ProbeError::Write {
                target,
                protocol,
                source,
            },
            ProbeStage::Receiving | ProbeStage::Comparing => ProbeError::Read {
                target,
                protocol,
                source,
            },
        }
    }
}

/// One probe attempt against `ip:port`
pub(crate) struct Probe {
    target: String,
    protocol: Protocol,
}

impl Probe {
    pub(crate) fn new(ip: &str, port: &str, protocol: Protocol) -> Self {
        Self {
            target: join_host_port(ip, port),
            protocol,
        }
    }

    /// Run one I/O stage under the context's deadline and cancellation
    pub(crate) async fn stage<F, T>(
        &self,
        ctx: &RunContext,
        stage: ProbeStage,
        fut: F,
    ) -> Result<T, ProbeError>
    where
        F: Future<Output = io::Result<T>>,
    {
        trace!("{} {} via {}", stage, self.target, self.protocol);

        match ctx.bound(fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(ProbeError::io(
                stage,
                self.target.clone(),
                self.protocol,
                source,
            )),
            Err(Interrupted::DeadlineExceeded) => Err(ProbeError::Timeout {
                stage,
                target: self.target.clone(),
                protocol: self.protocol,
            }),
            Err(Interrupted::Cancelled) => Err(ProbeError::Cancelled {
                stage,
                target: self.target.clone(),
                protocol: self.protocol,
            }),
        }
    }

    /// Resolve the target to the first socket address it maps to
    pub(crate) async fn resolve(&self, ctx: &RunContext) -> Result<SocketAddr, ProbeError> {
        let mut addrs = self
            .stage(ctx, ProbeStage::Resolving, lookup_host(self.target.as_str()))
            .await?;

        addrs.next().ok_or_else(|| ProbeError::NoAddress {
            target: self.target.clone(),
            protocol: self.protocol,
        })
    }

    /// Compare a received line (without its newline) against the expected content
    pub(crate) fn compare(&self, expected: &str, line: &[u8]) -> Result<(), ProbeError> {
        trace!("{} {} via {}", ProbeStage::Comparing, self.target, self.protocol);

        if line == expected.as_bytes() {
            return Ok(());
        }

        Err(ProbeError::ContentMismatch {
            target: self.target.clone(),
            protocol: self.protocol,
            expected: expected.to_string(),
            received: String::from_utf8_lossy(line).to_string(),
        })
    }
}

/// Turn a probe outcome into the check result
pub(crate) fn finish(result: CheckResult, outcome: Result<(), ProbeError>) -> CheckResult {
    match outcome {
        Ok(()) => result.pass(),
        Err(err) => {
            let message = err.to_string();
            match err {
                ProbeError::ContentMismatch {
                    expected, received, ..
                } => result
                    .fail(message)
                    .with_detail("expected", expected)
                    .with_detail("received", received),
                _ => result.fail(message),
            }
        }
    }
}

/// Join host and port, bracketing IPv6 literals
pub fn join_host_port(ip: &str, port: &str) -> String {
    if ip.parse::<Ipv6Addr>().is_ok() {
        format!("[{}]:{}", ip, port)
    } else {
        format!("{}:{}", ip, port)
    }
}

/// Read one `\n`-terminated line, returning it without the newline
///
/// Fails if the peer closes first or if `max` bytes arrive without a newline.
pub(crate) async fn read_line<R>(reader: &mut R, max: usize) -> io::Result<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let n = reader.take(max as u64).read_until(b'\n', &mut line).await?;

    if line.last() == Some(&b'\n') {
        line.pop();
        return Ok(line);
    }

    if n >= max {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("no newline within {} bytes", max),
        ))
    } else {
        Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed before newline",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorebeat_core::Metadata;
    use std::time::Duration;

    #[test]
    fn test_join_host_port() {
        assert_eq!(join_host_port("10.0.0.5", "22"), "10.0.0.5:22");
        assert_eq!(join_host_port("::1", "53"), "[::1]:53");
        assert_eq!(join_host_port("web01.blue1", "80"), "web01.blue1:80");
    }

    #[tokio::test]
    async fn test_read_line_strips_newline() {
        let mut reader: &[u8] = b"pong\nleftover";
        let line = read_line(&mut reader, 64).await.unwrap();
        assert_eq!(line, b"pong");
    }

    #[tokio::test]
    async fn test_read_line_eof_without_newline() {
        let mut reader: &[u8] = b"pong";
        let err = read_line(&mut reader, 64).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_read_line_respects_limit() {
        let mut reader: &[u8] = b"aaaaaaaaaaaaaaaa\n";
        let err = read_line(&mut reader, 8).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_compare_is_byte_exact() {
        let probe = Probe::new("127.0.0.1", "9", Protocol::Tcp);
        assert!(probe.compare("pong", b"pong").is_ok());

        let err = probe.compare("pong", b"pong ").unwrap_err();
        assert_eq!(err.stage(), ProbeStage::Comparing);
        assert!(err.to_string().starts_with("Incorrect data received from 127.0.0.1:9 via TCP"));
    }

    #[test]
    fn test_finish_records_mismatch_details() {
        let probe = Probe::new("127.0.0.1", "9", Protocol::Udp);
        let result = CheckResult::new(Metadata::new("dns", "DNS", "udp", "blue1"));

        let result = finish(result, probe.compare("pong", b"ping"));
        assert!(!result.passed);
        assert_eq!(result.details.get("expected").map(String::as_str), Some("pong"));
        assert_eq!(result.details.get("received").map(String::as_str), Some("ping"));
    }

    #[tokio::test]
    async fn test_stage_timeout_names_stage() {
        let probe = Probe::new("127.0.0.1", "9", Protocol::Tcp);
        let ctx = RunContext::new(Duration::from_millis(20));

        let err = probe
            .stage(&ctx, ProbeStage::Dialing, async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, io::Error>(())
            })
            .await
            .unwrap_err();

        assert_eq!(err.stage(), ProbeStage::Dialing);
        assert_eq!(err.to_string(), "Timed out dialing 127.0.0.1:9 via TCP");
    }

    #[tokio::test]
    async fn test_resolve_invalid_port() {
        let probe = Probe::new("127.0.0.1", "notaport", Protocol::Tcp);
        let ctx = RunContext::new(Duration::from_secs(2));

        let err = probe.resolve(&ctx).await.unwrap_err();
        assert_eq!(err.stage(), ProbeStage::Resolving);
        assert!(err.to_string().starts_with("Problem converting IP/port 127.0.0.1:notaport"));
    }
}
