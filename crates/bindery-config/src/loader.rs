//! Layered configuration loading.

use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use bindery_core::IdentityScheme;

use crate::{BinderyConfig, ConfigError, LogFormat};

/// Default prefix for environment overrides.
pub const DEFAULT_ENV_PREFIX: &str = "BINDERY";

/// Loads a [`BinderyConfig`] from layered sources.
///
/// Later layers override earlier ones:
/// 1. Built-in defaults or a preset
/// 2. A TOML or JSON file
/// 3. Environment variables named `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use bindery_config::ConfigLoader;
///
/// # fn main() -> Result<(), bindery_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("bindery.toml")?
///     .with_env_prefix("BINDERY")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: BinderyConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader starting from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to the default configuration.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = BinderyConfig::default();
        self
    }

    /// Starts from the development preset.
    ///
    /// ```
    /// use bindery_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert!(config.presentation.development);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = BinderyConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = BinderyConfig::production();
        self
    }

    /// Loads a file, choosing the format from its extension.
    ///
    /// The file replaces the current configuration; sections it omits take
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, malformed,
    /// or contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::Missing {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        self.with_string(&content, format)
    }

    /// Loads a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in `"toml"` or `"json"` format.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use bindery_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[presentation]\ndevelopment = true\n", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(config.presentation.development);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_ascii_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        Ok(self)
    }

    /// Enables environment overrides with the given prefix.
    ///
    /// With prefix `BINDERY`, `BINDERY__SERVER__HTTP_ADDR=0.0.0.0:9000`
    /// overrides `server.http_addr`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads a `.env` file into the process environment if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if a `.env` file exists but cannot be
    /// parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Err(e) if !e.not_found() => Err(e.into()),
            _ => Ok(self),
        }
    }

    /// Applies environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be applied or validation
    /// fails.
    pub fn load(mut self) -> Result<BinderyConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            let mut overrides: Vec<(String, String)> = env::vars()
                .filter(|(name, _)| name.starts_with(&marker))
                .collect();
            overrides.sort();

            for (name, value) in &overrides {
                self.apply_override(&prefix, name, value)?;
            }
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> BinderyConfig {
        self.config
    }

    fn apply_override(&mut self, prefix: &str, name: &str, value: &str) -> Result<(), ConfigError> {
        let path = name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env(name, "missing prefix"))?;
        let (section, field) = path
            .split_once("__")
            .ok_or_else(|| ConfigError::env(name, "expected SECTION__KEY"))?;

        let config = &mut self.config;
        match (section, field) {
            ("SERVER", "HTTP_ADDR") => config.server.http_addr = value.to_string(),
            ("SERVER", "SHUTDOWN_TIMEOUT_SECS") => {
                config.server.shutdown_timeout_secs = parse_number(name, value)?;
            }
            ("SERVER", "MAX_BODY_BYTES") => {
                config.server.max_body_bytes = parse_number(name, value)?;
            }
            ("PRESENTATION", "DEVELOPMENT") => {
                config.presentation.development = parse_flag(name, value)?;
            }
            ("PRESENTATION", "PRETTY_USER_AGENTS") => {
                config.presentation.pretty_user_agents = value
                    .split(',')
                    .map(str::trim)
                    .filter(|agent| !agent.is_empty())
                    .map(String::from)
                    .collect();
            }
            ("IDENTITY", "SCHEME") => {
                config.identity.scheme = value
                    .parse::<IdentityScheme>()
                    .map_err(|reason| ConfigError::env(name, reason))?;
            }
            ("LOGGING", "ENABLED") => config.logging.enabled = parse_flag(name, value)?,
            ("LOGGING", "LEVEL") => config.logging.level = value.to_string(),
            ("LOGGING", "FORMAT") => {
                config.logging.format = match value.to_ascii_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => return Err(ConfigError::env(name, "expected 'json' or 'pretty'")),
                };
            }
            _ => return Err(ConfigError::env(name, "unknown setting")),
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env(name, format!("'{value}' is not a valid number")))
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env(name, format!("'{value}' is not a boolean"))),
    }
}
