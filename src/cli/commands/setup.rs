//! Shared composition of configuration and collaborators.

use std::path::Path;
use std::sync::Arc;

use agent_broker::{AlpacaBroker, AlpacaConfig, PaperBroker};
use agent_config::{load_config, AppConfig, BrokerKind, NotifyChannel, SourceKind};
use agent_core::traits::{Broker, DataSource, Notifier};
use agent_data::{AlpacaDataConfig, AlpacaDataSource, CsvDataSource, HttpJsonSource};
use agent_monitor::{EmailConfig, EmailNotifier, LogNotifier, TwilioConfig, TwilioSmsNotifier};
use agent_pipeline::{CycleReport, TickerOutcome, TradingCycle};
use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{BrokerArg, CycleArgs, OutputFormat, SourceArg};

/// Load the file, apply command-line overrides and validate.
pub fn load(config_path: &Path, args: &CycleArgs) -> Result<AppConfig> {
    let mut config = load_config(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    if let Some(path) = &args.data {
        config.data.source = SourceKind::Csv;
        config.data.csv_path = path.clone();
    }
    if let Some(source) = args.source {
        config.data.source = match source {
            SourceArg::Csv => SourceKind::Csv,
            SourceArg::Alpaca => SourceKind::Alpaca,
            SourceArg::Http => SourceKind::Http,
        };
    }
    if !args.symbols.is_empty() {
        config.app.tickers = args.symbols.clone();
    }
    if let Some(date) = args.end_date {
        config.data.end_date = Some(date);
    }

    Ok(config)
}

pub fn apply_broker(config: &mut AppConfig, broker: Option<BrokerArg>) {
    if let Some(broker) = broker {
        config.runtime.broker = match broker {
            BrokerArg::Paper => BrokerKind::Paper,
            BrokerArg::Alpaca => BrokerKind::Alpaca,
        };
    }
}

/// Uppercased tickers, first occurrence kept.
pub fn tickers(config: &AppConfig) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for ticker in &config.app.tickers {
        let ticker = ticker.trim().to_uppercase();
        if !ticker.is_empty() && !out.contains(&ticker) {
            out.push(ticker);
        }
    }
    out
}

pub fn data_source(config: &AppConfig) -> Result<Arc<dyn DataSource>> {
    let source: Arc<dyn DataSource> = match config.data.source {
        SourceKind::Csv => Arc::new(
            CsvDataSource::new(config.data.csv_path.clone())
                .context("Provide a CSV file or directory with --data (e.g. --data ./data)")?,
        ),
        SourceKind::Alpaca => {
            let (key, secret) = config.alpaca.credentials()?;
            let data_config = AlpacaDataConfig::new(key, secret)
                .with_data_url(&config.alpaca.data_url)
                .with_feed(&config.alpaca.feed);
            Arc::new(AlpacaDataSource::new(data_config)?)
        }
        SourceKind::Http => Arc::new(HttpJsonSource::new(&config.data.http_url)?),
    };
    info!(source = source.name(), "Using data source");
    Ok(source)
}

pub fn broker(config: &AppConfig) -> Result<Arc<dyn Broker>> {
    let broker: Arc<dyn Broker> = match config.runtime.broker {
        BrokerKind::Paper => Arc::new(PaperBroker::new(config.runtime.paper_cash)),
        BrokerKind::Alpaca => {
            let (key, secret) = config.alpaca.credentials()?;
            let mut alpaca = AlpacaConfig::new(key, secret, config.alpaca.paper);
            if let Some(url) = &config.alpaca.base_url {
                alpaca = alpaca.with_base_url(url);
            }
            Arc::new(AlpacaBroker::new(alpaca)?)
        }
    };
    info!(broker = broker.name(), "Using broker");
    Ok(broker)
}

pub fn notifier(config: &AppConfig) -> Result<Option<Arc<dyn Notifier>>> {
    if !config.notify.enabled {
        return Ok(None);
    }
    let notifier: Arc<dyn Notifier> = match config.notify.channel {
        NotifyChannel::Log => Arc::new(LogNotifier),
        NotifyChannel::Sms => {
            let secrets = config.notify.twilio_secrets()?;
            Arc::new(TwilioSmsNotifier::new(TwilioConfig::new(
                secrets.account_sid,
                secrets.auth_token,
                secrets.from_number,
                secrets.to_number,
            ))?)
        }
        NotifyChannel::Email => {
            let secrets = config.notify.email_secrets()?;
            Arc::new(EmailNotifier::new(EmailConfig::new(
                secrets.smtp_server,
                secrets.smtp_port,
                secrets.address,
                secrets.password,
                config.notify.email_to.clone(),
            ))?)
        }
    };
    Ok(Some(notifier))
}

/// Validate, then wire every collaborator into a cycle.
pub fn cycle(config: &AppConfig) -> Result<TradingCycle> {
    config.validate()?;
    let cycle = TradingCycle::new(
        config.cycle_config(),
        data_source(config)?,
        broker(config)?,
        notifier(config)?,
    )?;
    Ok(cycle)
}

pub fn print_report(report: &CycleReport, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => print!("{}", report.report_text),
    }
    Ok(())
}

pub fn print_outcomes(outcomes: &[TickerOutcome]) {
    for outcome in outcomes {
        println!("{}", outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickers_normalized() {
        let mut config = AppConfig::default();
        config.app.tickers = vec![" aapl".into(), "MSFT".into(), "AAPL".into(), "".into()];
        assert_eq!(tickers(&config), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_log_notifier_when_enabled() {
        let mut config = AppConfig::default();
        assert!(notifier(&config).unwrap().is_none());
        config.notify.enabled = true;
        let notifier = notifier(&config).unwrap().unwrap();
        assert_eq!(notifier.name(), "log");
    }

    #[test]
    fn test_paper_broker_by_default() {
        let broker = broker(&AppConfig::default()).unwrap();
        assert_eq!(broker.name(), "Paper Broker");
    }
}
