//! Report command: fetch and summarize profit/loss.

use anyhow::Result;
use std::path::Path;

use super::setup;
use crate::cli::ReportArgs;

pub async fn run(args: ReportArgs, config_path: &Path) -> Result<()> {
    let mut config = setup::load(config_path, &args.cycle)?;
    if args.notify {
        config.notify.enabled = true;
    }

    let cycle = setup::cycle(&config)?;
    let report = cycle.report(&setup::tickers(&config)).await;
    setup::print_report(&report, args.cycle.output)
}
