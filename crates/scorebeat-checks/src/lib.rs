//! scorebeat Checks - Network checks, check definitions, registry and loader
//!
//! This crate provides:
//! - `TcpCheck` / `UdpCheck`: connect, send a probe line, expect a known reply
//! - `CheckDefinition`: persisted description of a check, validated on build
//! - `CheckRegistry`: Index of all configured checks
//! - Check loader that reads definitions from a directory of YAML files

pub mod definition;
pub mod loader;
pub mod probe;
pub mod registry;
pub mod tcp;
pub mod udp;

pub use definition::CheckDefinition;
pub use loader::load_checks_from_dir;
pub use probe::{ProbeError, ProbeStage, Protocol};
pub use registry::CheckRegistry;
pub use tcp::TcpCheck;
pub use udp::UdpCheck;
