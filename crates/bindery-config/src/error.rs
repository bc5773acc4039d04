//! Errors from loading and validating configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a configuration could not be produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required config file does not exist.
    #[error("config file {} does not exist", .path.display())]
    Missing {
        /// The path that was tried.
        path: PathBuf,
    },

    /// A config file exists but could not be read.
    #[error("cannot read config file {}: {source}", .path.display())]
    Unreadable {
        /// The file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// The content is neither TOML nor JSON.
    #[error("unsupported config format '{0}', expected toml or json")]
    UnsupportedFormat(String),

    /// Malformed TOML, or a field no section knows.
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON, or a field no section knows.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.env` file exists but could not be loaded.
    #[error("cannot load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// An environment override names an unknown key or has a bad value.
    #[error("environment override {var}: {reason}")]
    Env {
        /// The variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A loaded value fails validation.
    #[error("{key}: {reason}")]
    Invalid {
        /// Dotted path of the setting, e.g. `server.http_addr`.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn env(var: &str, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}
