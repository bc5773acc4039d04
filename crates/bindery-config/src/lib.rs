//! Typed configuration for Bindery services.
//!
//! Configuration is layered: defaults, then an optional TOML or JSON file,
//! then `BINDERY__SECTION__KEY` environment variables. Every section rejects
//! unknown fields.
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! max_body_bytes = 1048576
//!
//! [presentation]
//! development = false
//! pretty_user_agents = ["curl/"]
//!
//! [identity]
//! scheme = "session"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

mod config;
mod error;
mod loader;
mod schema;

pub use config::{BinderyConfig, BinderyConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{
    IdentityConfig, LogFormat, LoggingConfig, PresentationConfig, ServerConfig,
    DEFAULT_MAX_BODY_BYTES,
};
