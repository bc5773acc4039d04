//! The root configuration type and its builder.

use std::net::SocketAddr;

use bindery_telemetry::create_env_filter;
use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, IdentityConfig, LogFormat, LoggingConfig, PresentationConfig, ServerConfig,
};

/// Complete Bindery configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use bindery_config::BinderyConfig;
///
/// let config = BinderyConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(!config.presentation.development);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct BinderyConfig {
    /// Server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Response presentation settings.
    #[serde(default)]
    pub presentation: PresentationConfig,

    /// Identity resolution settings.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BinderyConfig {
    /// Creates a configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use bindery_config::{BinderyConfig, ServerConfig};
    ///
    /// let config = BinderyConfig::builder()
    ///     .server(ServerConfig {
    ///         http_addr: "127.0.0.1:3000".to_string(),
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    /// ```
    #[must_use]
    pub fn builder() -> BinderyConfigBuilder {
        BinderyConfigBuilder::new()
    }

    /// Checks values that deserialization alone cannot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the listen address does not
    /// parse, the body limit is zero, or the log level is not a valid filter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid(
                "server.http_addr",
                format!("'{}' is not a socket address", self.server.http_addr),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid("logging.level", e.to_string()))?;

        Ok(())
    }

    /// Local development preset: indented responses and readable debug logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                http_addr: "127.0.0.1:8080".to_string(),
                shutdown_timeout_secs: 5,
                ..Default::default()
            },
            presentation: PresentationConfig {
                development: true,
                ..Default::default()
            },
            identity: IdentityConfig::default(),
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ..Default::default()
            },
        }
    }

    /// Production preset: compact responses and JSON logs.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

/// Builder for [`BinderyConfig`].
#[derive(Debug, Clone, Default)]
pub struct BinderyConfigBuilder {
    config: BinderyConfig,
}

impl BinderyConfigBuilder {
    /// Starts from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server section.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Sets the presentation section.
    #[must_use]
    pub fn presentation(mut self, presentation: PresentationConfig) -> Self {
        self.config.presentation = presentation;
        self
    }

    /// Sets the identity section.
    #[must_use]
    pub fn identity(mut self, identity: IdentityConfig) -> Self {
        self.config.identity = identity;
        self
    }

    /// Sets the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> BinderyConfig {
        self.config
    }
}
