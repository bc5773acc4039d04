//! Telemetry setup errors.

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;

/// Why logging could not be installed.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The level is not a valid filter directive.
    #[error("invalid log filter '{directive}': {source}")]
    InvalidFilter {
        /// The rejected directive.
        directive: String,
        /// Parser failure.
        #[source]
        source: ParseError,
    },

    /// Another global subscriber was installed first.
    #[error("cannot install logging: {0}")]
    AlreadyInstalled(#[from] TryInitError),
}
