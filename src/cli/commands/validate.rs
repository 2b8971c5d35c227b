//! Validate configuration command.

use agent_config::load_config;
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    };
    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Err(e.into());
    }

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Tickers: {}", config.app.tickers.join(", "));
    println!("Log level: {}", config.logging.level);
    println!("Data source: {:?}", config.data.source);
    println!("Broker: {:?}", config.runtime.broker);
    println!("Alpaca paper mode: {}", config.alpaca.paper);
    println!(
        "Windows: SMA {}/{}, RSI {}",
        config.features.short_window,
        config.features.long_window,
        config
            .features
            .rsi_period
            .map_or_else(|| "off".to_string(), |p| p.to_string())
    );
    println!("Trees: {} (seed {})", config.model.n_trees, config.model.seed);
    println!("Allocation: {}", config.trading.allocation_fraction);
    println!(
        "Day-trade rule: {} trades / {} days under {}",
        config.trading.max_day_trades,
        config.trading.day_trade_window_days,
        config.trading.pdt_equity_threshold
    );
    println!("Dry run: {}", config.trading.dry_run);
    println!("Report mode: {}", config.report.mode);

    Ok(())
}
