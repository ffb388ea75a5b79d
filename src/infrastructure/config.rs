//! Application Configuration
//!
//! Loads configuration from defaults, files and environment variables.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::domain::models::access_policy::AccessPolicy;

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Fallback `EnvFilter` directive when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub access: AccessPolicy,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be parsed or a value has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "default".into());

        with_defaults(Config::builder())?
            // Base config file, if present
            .add_source(File::with_name("config/default").required(false))
            // Merge environment-specific config if it exists
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Override with environment variables (e.g., APP__ACCESS__ALL_RESOURCES_WILDCARD)
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a TOML document layered over the defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the document is not valid TOML or has wrong types.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        with_defaults(Config::builder())?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    builder
        .set_default("access.all_resources_wildcard", false)?
        .set_default("logging.filter", "network_workspaces=info")?
        .set_default("logging.json", false)
}
