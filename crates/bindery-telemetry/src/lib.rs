//! Structured logging for Bindery services.
//!
//! Bindery logs through [`tracing`]. This crate owns the subscriber setup
//! for a process and the field names every Bindery crate logs with.
//!
//! - [`init_logging`] installs a JSON or pretty `tracing-subscriber` formatter
//! - [`fields`] lists the standard structured field names
//! - [`capture::LogCapture`] records events in memory for tests
//!
//! # Example
//!
//! ```rust,ignore
//! use bindery_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! tracing::info!(request_id = %id, "Request started");
//! ```

#![warn(missing_docs)]

pub mod capture;
pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
