//! scorebeat Common - Shared utilities: logging and configuration
//!
//! This crate provides common functionality used by the scorebeat binary.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigBuilder};
pub use logging::init_logging;
