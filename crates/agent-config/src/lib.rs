//! Configuration management.
//!
//! A required TOML file layered with `STOCK_AGENT_`-prefixed environment
//! variables, `__` separating nested keys
//! (`STOCK_AGENT_TRADING__DRY_RUN=true`).

mod settings;

pub use settings::{
    AlpacaSettings, AppConfig, AppSettings, BrokerKind, DataSettings, EmailSecrets,
    LoggingConfig, NotifyChannel, NotifySettings, ReportSettings, RuntimeSettings, SourceKind,
    TwilioSecrets,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Environment variable {0} is not set")]
    MissingSecret(String),
}

/// Load configuration from file and environment.
pub fn load_config(path: &Path) -> Result<AppConfig, SettingsError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("STOCK_AGENT")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("app.tickers")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}

/// Load and validate.
pub fn load_validated(path: &Path) -> Result<AppConfig, SettingsError> {
    let config = load_config(path)?;
    config.validate()?;
    Ok(config)
}
