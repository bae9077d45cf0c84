//! Telemetry: structured logging for the generator and synchronizer.
//!
//! Everything in the core crate reports through `tracing`; this module installs
//! the subscriber that turns those events into pretty, compact or JSON output.

pub mod logging;

pub use logging::{init_logging, redact_database_url, LogFormat, LoggingConfig};
