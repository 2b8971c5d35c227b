//! Run command: one full trading cycle.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use super::setup;
use crate::cli::RunArgs;

pub async fn run(args: RunArgs, config_path: &Path) -> Result<()> {
    let mut config = setup::load(config_path, &args.cycle)?;
    setup::apply_broker(&mut config, args.broker);
    if args.dry_run {
        config.trading.dry_run = true;
    }
    if args.notify {
        config.notify.enabled = true;
    }

    let tickers = setup::tickers(&config);
    info!(
        tickers = ?tickers,
        dry_run = config.trading.dry_run,
        "Starting run"
    );

    let cycle = setup::cycle(&config)?;
    let report = cycle.run(&tickers).await;
    setup::print_report(&report, args.cycle.output)
}
