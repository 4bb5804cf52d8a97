//! scorebeat Core - Foundation types, traits, and error handling
//!
//! This crate provides the core abstractions used throughout scorebeat:
//! - `Check`: The trait that all network checks implement
//! - `CheckConfig` / `Metadata`: Identity of a check, owned by its scheduler
//! - `CheckResult`: The outcome of one check run
//! - `RunContext`: Deadline and cancellation for a run

pub mod check;
pub mod context;
pub mod error;
pub mod result;

// Re-export commonly used types at crate root
pub use check::{Check, CheckConfig, Metadata};
pub use context::{Interrupted, RunContext};
pub use error::{Error, Result};
pub use result::CheckResult;
