//! Signals command: train and predict, no orders.

use anyhow::Result;
use std::path::Path;

use super::setup;
use crate::cli::{OutputFormat, SignalsArgs};

pub async fn run(args: SignalsArgs, config_path: &Path) -> Result<()> {
    let mut config = setup::load(config_path, &args.cycle)?;
    // never delivered
    config.notify.enabled = false;

    let cycle = setup::cycle(&config)?;
    let report = cycle.signals(&setup::tickers(&config)).await;

    match args.cycle.output {
        OutputFormat::Json => setup::print_report(&report, OutputFormat::Json),
        OutputFormat::Text => {
            setup::print_outcomes(&report.outcomes);
            Ok(())
        }
    }
}
