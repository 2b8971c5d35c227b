//! Stock agent CLI application.

mod cli;

use agent_config::load_config;
use agent_monitor::setup_logging;
use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging settings come from the file when it loads; flags win
    let logging = load_config(&cli.config).map(|c| c.logging).unwrap_or_default();
    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or(logging.level);
    let json = cli.json_logs || logging.format == "json";
    let _log_guard = setup_logging(&level, json, logging.file.as_deref(), logging.rotation)?;

    match cli.command {
        Commands::Run(args) => cli::commands::run::run(args, &cli.config).await,
        Commands::Signals(args) => cli::commands::signals::run(args, &cli.config).await,
        Commands::Report(args) => cli::commands::report::run(args, &cli.config).await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config).await,
    }
}
