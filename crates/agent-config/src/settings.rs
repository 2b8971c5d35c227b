//! Configuration structures.

use std::path::PathBuf;

use agent_core::types::Timeframe;
use agent_features::FeatureConfig;
use agent_model::ForestConfig;
use agent_monitor::LogRotation;
use agent_pipeline::{CycleConfig, ReportMode};
use agent_risk::TradingConfig;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::SettingsError;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub alpaca: AlpacaSettings,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub model: ForestConfig,
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub notify: NotifySettings,
    #[serde(default)]
    pub runtime: RuntimeSettings,
}

impl AppConfig {
    /// Reject settings no cycle could run with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.app.tickers.is_empty() {
            return Err(SettingsError::Invalid("app.tickers must not be empty".into()));
        }
        if let Some(t) = self.app.tickers.iter().find(|t| t.trim().is_empty()) {
            return Err(SettingsError::Invalid(format!("blank ticker {:?}", t)));
        }
        self.features
            .validate()
            .map_err(|e| SettingsError::Invalid(format!("features: {}", e)))?;
        self.model
            .validate()
            .map_err(|e| SettingsError::Invalid(format!("model: {}", e)))?;
        self.trading
            .validate()
            .map_err(|e| SettingsError::Invalid(format!("trading: {}", e)))?;
        if self.data.lookback_days == 0 {
            return Err(SettingsError::Invalid("data.lookback_days must be at least 1".into()));
        }
        if self.runtime.external_timeout_secs == 0 {
            return Err(SettingsError::Invalid(
                "runtime.external_timeout_secs must be at least 1".into(),
            ));
        }
        if self.notify.enabled
            && self.notify.channel == NotifyChannel::Email
            && self.notify.email_to.trim().is_empty()
        {
            return Err(SettingsError::Invalid(
                "notify.email_to is required for email delivery".into(),
            ));
        }
        if self.runtime.paper_cash < Decimal::ZERO {
            return Err(SettingsError::Invalid("runtime.paper_cash must not be negative".into()));
        }
        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(SettingsError::Invalid(format!(
                "logging.format must be pretty or json, got {}",
                other
            ))),
        }
    }

    /// Settings for one trading cycle.
    pub fn cycle_config(&self) -> CycleConfig {
        CycleConfig {
            timeframe: self.data.timeframe,
            lookback_days: self.data.lookback_days,
            end_date: self.data.end_date,
            features: self.features.clone(),
            model: self.model.clone(),
            trading: self.trading.clone(),
            report_mode: self.report.mode,
            report_subject: self.report.subject.clone(),
            external_timeout_secs: self.runtime.external_timeout_secs,
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        toml::to_string_pretty(self).map_err(|e| SettingsError::Invalid(e.to_string()))
    }
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
    /// Tickers processed by each cycle, in order
    pub tickers: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "stock-agent".to_string(),
            environment: "development".to_string(),
            tickers: vec!["AAPL".to_string(), "MSFT".to_string(), "GOOGL".to_string()],
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Also write JSON lines to this file
    pub file: Option<PathBuf>,
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
            rotation: LogRotation::Never,
        }
    }
}

/// Alpaca API configuration. Credentials are named by environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlpacaSettings {
    pub api_key_env: String,
    pub api_secret_env: String,
    pub paper: bool,
    /// Trading API override; the paper or live endpoint otherwise
    pub base_url: Option<String>,
    pub data_url: String,
    pub feed: String,
}

impl Default for AlpacaSettings {
    fn default() -> Self {
        Self {
            api_key_env: "ALPACA_API_KEY".to_string(),
            api_secret_env: "ALPACA_API_SECRET".to_string(),
            paper: true,
            base_url: None,
            data_url: "https://data.alpaca.markets".to_string(),
            feed: "iex".to_string(),
        }
    }
}

impl AlpacaSettings {
    /// Key and secret from the configured environment variables.
    pub fn credentials(&self) -> Result<(String, String), SettingsError> {
        Ok((secret(&self.api_key_env)?, secret(&self.api_secret_env)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Csv,
    Alpaca,
    Http,
}

/// Market data settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub source: SourceKind,
    /// CSV file or directory of per-ticker files
    pub csv_path: PathBuf,
    /// Endpoint answering `?ticker=SYMBOL` with JSON bar records
    pub http_url: String,
    pub timeframe: Timeframe,
    /// Calendar days of history per ticker
    pub lookback_days: u32,
    /// Last day of the lookback window; today when unset
    pub end_date: Option<NaiveDate>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            source: SourceKind::Csv,
            csv_path: PathBuf::from("data"),
            http_url: "https://ai-stock-agent.netlify.app/.netlify/functions/fetch_stock_data"
                .to_string(),
            timeframe: Timeframe::Daily,
            lookback_days: 365,
            end_date: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub mode: ReportMode,
    pub subject: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            mode: ReportMode::PerTicker,
            subject: "Daily Trading Report".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyChannel {
    #[default]
    Log,
    Sms,
    Email,
}

/// Report delivery. Twilio and SMTP credentials are named by environment
/// variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    pub enabled: bool,
    pub channel: NotifyChannel,
    pub twilio_account_sid_env: String,
    pub twilio_auth_token_env: String,
    pub twilio_from_env: String,
    pub twilio_to_env: String,
    pub smtp_server_env: String,
    pub smtp_port_env: String,
    /// Sender address, also the SMTP login
    pub email_address_env: String,
    pub email_password_env: String,
    /// Report recipient
    pub email_to: String,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            channel: NotifyChannel::Log,
            twilio_account_sid_env: "TWILIO_ACCOUNT_SID".to_string(),
            twilio_auth_token_env: "TWILIO_AUTH_TOKEN".to_string(),
            twilio_from_env: "TWILIO_PHONE_NUMBER".to_string(),
            twilio_to_env: "RECIPIENT_PHONE_NUMBER".to_string(),
            smtp_server_env: "SMTP_SERVER".to_string(),
            smtp_port_env: "SMTP_PORT".to_string(),
            email_address_env: "EMAIL_ADDRESS".to_string(),
            email_password_env: "EMAIL_PASSWORD".to_string(),
            email_to: String::new(),
        }
    }
}

/// Twilio values read from the environment.
#[derive(Debug, Clone)]
pub struct TwilioSecrets {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub to_number: String,
}

/// SMTP values read from the environment.
#[derive(Debug, Clone)]
pub struct EmailSecrets {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub address: String,
    pub password: String,
}

impl NotifySettings {
    pub fn twilio_secrets(&self) -> Result<TwilioSecrets, SettingsError> {
        Ok(TwilioSecrets {
            account_sid: secret(&self.twilio_account_sid_env)?,
            auth_token: secret(&self.twilio_auth_token_env)?,
            from_number: secret(&self.twilio_from_env)?,
            to_number: secret(&self.twilio_to_env)?,
        })
    }

    pub fn email_secrets(&self) -> Result<EmailSecrets, SettingsError> {
        let port = secret(&self.smtp_port_env)?;
        let smtp_port = port.trim().parse().map_err(|_| {
            SettingsError::Invalid(format!(
                "{} is not a port number: {}",
                self.smtp_port_env, port
            ))
        })?;
        Ok(EmailSecrets {
            smtp_server: secret(&self.smtp_server_env)?,
            smtp_port,
            address: secret(&self.email_address_env)?,
            password: secret(&self.email_password_env)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerKind {
    #[default]
    Paper,
    Alpaca,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub broker: BrokerKind,
    /// Starting cash of the in-memory paper broker
    pub paper_cash: Decimal,
    pub external_timeout_secs: u64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            broker: BrokerKind::Paper,
            paper_cash: dec!(100000),
            external_timeout_secs: 30,
        }
    }
}

fn secret(var: &str) -> Result<String, SettingsError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SettingsError::MissingSecret(var.to_string())),
    }
}
