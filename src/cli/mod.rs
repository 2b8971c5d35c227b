//! CLI definitions.

pub mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stock-agent")]
#[command(author, version, about = "ML-driven stock trading assistant")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level (overrides logging.level)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one trading cycle: fetch, train, trade, report
    Run(RunArgs),
    /// Print the latest BUY/SELL signal per ticker without trading
    Signals(SignalsArgs),
    /// Fetch bars and print the profit/loss report
    Report(ReportArgs),
    /// Validate configuration
    ValidateConfig,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Csv,
    Alpaca,
    Http,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BrokerArg {
    Paper,
    Alpaca,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Options shared by every cycle command.
#[derive(clap::Args)]
pub struct CycleArgs {
    /// Tickers to process (comma-separated; app.tickers when omitted)
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Market data source
    #[arg(long)]
    pub source: Option<SourceArg>,

    /// CSV file or directory (implies --source csv)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Last day of the lookback window, YYYY-MM-DD (today when omitted)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(clap::Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub cycle: CycleArgs,

    /// Reconcile but do not submit orders
    #[arg(long)]
    pub dry_run: bool,

    /// Send the report through the configured channel
    #[arg(long)]
    pub notify: bool,

    /// Brokerage to trade against
    #[arg(long)]
    pub broker: Option<BrokerArg>,
}

#[derive(clap::Args)]
pub struct SignalsArgs {
    #[command(flatten)]
    pub cycle: CycleArgs,
}

#[derive(clap::Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub cycle: CycleArgs,

    /// Send the report through the configured channel
    #[arg(long)]
    pub notify: bool,
}
