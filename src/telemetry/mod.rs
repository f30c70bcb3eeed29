//! Telemetry
//!
//! Subscriber setup for the crate's `tracing` output.

pub mod logging;

pub use logging::{LogFormat, LogLevel, LoggingConfig};
