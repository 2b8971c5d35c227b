//! CSV data source.

use std::path::{Path, PathBuf};

use agent_core::error::DataError;
use agent_core::traits::DataSource;
use agent_core::types::{Bar, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::debug;

use crate::normalize;
use crate::timestamp::parse_timestamp;

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(
        alias = "Date",
        alias = "date",
        alias = "Datetime",
        alias = "datetime",
        alias = "timestamp",
        alias = "Timestamp"
    )]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close", default)]
    close: Option<f64>,
    #[serde(rename = "Adj Close", alias = "adj_close", default)]
    adj_close: Option<f64>,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// Historical bars from CSV files.
///
/// The path is either one file (served for any symbol) or a directory
/// holding `{SYMBOL}.csv`, `{symbol}.csv` or `{SYMBOL}_daily.csv`.
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, DataError> {
        let path = path.into();
        if !path.exists() {
            return Err(DataError::Internal(format!(
                "CSV path does not exist: {}",
                path.display()
            )));
        }
        Ok(Self { path })
    }

    /// File holding bars for `symbol`.
    pub fn resolve(&self, symbol: &str) -> Result<PathBuf, DataError> {
        if self.path.is_file() {
            return Ok(self.path.clone());
        }

        let candidates = [
            format!("{}.csv", symbol.to_uppercase()),
            format!("{}.csv", symbol.to_lowercase()),
            format!("{}_daily.csv", symbol.to_uppercase()),
        ];
        candidates
            .iter()
            .map(|name| self.path.join(name))
            .find(|p| p.is_file())
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))
    }

    /// Every bar in the symbol's file, oldest first.
    pub fn load_all(&self, symbol: &str) -> Result<Vec<Bar>, DataError> {
        let path = self.resolve(symbol)?;
        let mut bars = Self::load_from_path(&path)?;
        bars.sort_by_key(|b| b.timestamp);
        debug!(symbol, path = %path.display(), bars = bars.len(), "Loaded CSV bars");
        Ok(bars)
    }

    fn load_from_path(path: &Path) -> Result<Vec<Bar>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let mut bars = Vec::new();

        for (line, result) in reader.deserialize().enumerate() {
            let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
            let close = record.close.or(record.adj_close).ok_or_else(|| {
                DataError::ParseError(format!("row {}: missing close", line + 1))
            })?;
            let timestamp = parse_timestamp(&record.date)?;

            bars.push(Bar::new(
                timestamp,
                record.open,
                record.high,
                record.low,
                close,
                record.volume,
            ));
        }

        Ok(bars)
    }
}

#[async_trait]
impl DataSource for CsvDataSource {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError> {
        let bars = self.load_all(symbol)?;
        Ok(normalize(symbol, timeframe, bars, start, end))
    }

    fn name(&self) -> &str {
        "CSV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    const YAHOO: &str = "Date,Open,High,Low,Close,Adj Close,Volume\n\
        2024-01-03,11,12,10,11.5,11.4,1200\n\
        2024-01-02,10,11,9,10.5,10.4,1000\n\
        2024-01-04,12,13,11,12.5,12.4,1300\n\
        2024-01-04,99,99,99,99,99,9\n";

    fn dir_with(name: &str, contents: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(name), contents).unwrap();
        dir
    }

    fn range() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_directory_lookup_sorted_and_deduped() {
        let dir = dir_with("AAPL.csv", YAHOO);
        let source = CsvDataSource::new(dir.path()).unwrap();
        let (start, end) = range();

        let bars = source
            .get_historical_bars("aapl", Timeframe::Daily, start, end)
            .await
            .unwrap();

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![10.5, 11.5, 12.5]);
        assert_eq!(bars[0].volume, 1000.0);
    }

    #[tokio::test]
    async fn test_range_filter() {
        let dir = dir_with("MSFT_daily.csv", YAHOO);
        let source = CsvDataSource::new(dir.path()).unwrap();

        let start = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 3, 23, 0, 0).unwrap();
        let bars = source
            .get_historical_bars("MSFT", Timeframe::Daily, start, end)
            .await
            .unwrap();

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 11.5);
    }

    #[test]
    fn test_adj_close_fallback_and_lowercase_headers() {
        let dir = dir_with(
            "spy.csv",
            "timestamp,open,high,low,Adj Close,volume\n1704153600,1,2,0.5,1.5,10\n",
        );
        let source = CsvDataSource::new(dir.path()).unwrap();
        let bars = source.load_all("SPY").unwrap();

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 1.5);
        assert_eq!(bars[0].timestamp, 1_704_153_600_000);
    }

    #[test]
    fn test_single_file_serves_any_symbol() {
        let dir = dir_with("prices.csv", YAHOO);
        let source = CsvDataSource::new(dir.path().join("prices.csv")).unwrap();
        assert_eq!(source.load_all("ANY").unwrap().len(), 4);
    }

    #[test]
    fn test_missing_symbol() {
        let dir = dir_with("AAPL.csv", YAHOO);
        let source = CsvDataSource::new(dir.path()).unwrap();
        assert!(matches!(
            source.load_all("TSLA"),
            Err(DataError::SymbolNotFound(s)) if s == "TSLA"
        ));
        assert!(CsvDataSource::new(dir.path().join("nope")).is_err());
    }
}
