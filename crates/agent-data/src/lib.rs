//! Market data sources for the stock agent.
//!
//! Every source implements [`agent_core::traits::DataSource`] and returns
//! bars ordered oldest to newest without duplicate timestamps.

mod alpaca;
mod csv_source;
mod http_json;
mod timestamp;

pub use alpaca::{AlpacaDataConfig, AlpacaDataSource};
pub use csv_source::CsvDataSource;
pub use http_json::HttpJsonSource;

use agent_core::types::{Bar, BarSeries, Timeframe};
use chrono::{DateTime, Utc};

/// Sort, drop duplicate timestamps and keep bars within `[start, end]`.
pub(crate) fn normalize(
    symbol: &str,
    timeframe: Timeframe,
    bars: Vec<Bar>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<Bar> {
    let (start, end) = (start.timestamp_millis(), end.timestamp_millis());
    BarSeries::from_bars(symbol, timeframe, bars)
        .into_bars()
        .into_iter()
        .filter(|b| b.timestamp >= start && b.timestamp <= end)
        .collect()
}
