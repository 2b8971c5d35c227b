//! Generic HTTP JSON bar source.

use agent_core::error::DataError;
use agent_core::traits::DataSource;
use agent_core::types::{Bar, BarSeries, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::normalize;
use crate::timestamp::parse_timestamp;

#[derive(Debug, Deserialize)]
struct HttpRecord {
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
    #[serde(
        alias = "Datetime",
        alias = "Date",
        alias = "date",
        alias = "timestamp",
        default
    )]
    datetime: Option<Value>,
}

/// Bars from `GET {base_url}?ticker=SYMBOL` returning a JSON array of
/// OHLCV records.
///
/// When any record lacks a timestamp, every record is indexed by its
/// position instead and the date range is not applied.
pub struct HttpJsonSource {
    base_url: String,
    client: Client,
}

impl HttpJsonSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = Client::builder()
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn decode(records: Vec<HttpRecord>) -> Result<(Vec<Bar>, bool), DataError> {
        let indexed = records.iter().any(|r| r.datetime.is_none());

        let bars = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                let timestamp = if indexed {
                    i as i64
                } else {
                    record_timestamp(r.datetime.as_ref())?
                };
                Ok(Bar::new(timestamp, r.open, r.high, r.low, r.close, r.volume))
            })
            .collect::<Result<Vec<_>, DataError>>()?;

        Ok((bars, indexed))
    }
}

fn record_timestamp(value: Option<&Value>) -> Result<i64, DataError> {
    match value {
        Some(Value::String(s)) => parse_timestamp(s),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|ts| {
                if ts > 10_000_000_000 {
                    Some(ts)
                } else {
                    ts.checked_mul(1000)
                }
            })
            .ok_or_else(|| DataError::ParseError(format!("bad timestamp: {}", n))),
        other => Err(DataError::ParseError(format!("bad timestamp: {:?}", other))),
    }
}

#[async_trait]
impl DataSource for HttpJsonSource {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("ticker", symbol)])
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(DataError::ConnectionError(format!("{}: {}", status, text)));
        }

        let records: Vec<HttpRecord> = resp
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;
        let (bars, indexed) = Self::decode(records)?;
        debug!(symbol, bars = bars.len(), indexed, "Fetched HTTP JSON bars");

        if indexed {
            Ok(BarSeries::from_bars(symbol, timeframe, bars).into_bars())
        } else {
            Ok(normalize(symbol, timeframe, bars, start, end))
        }
    }

    fn name(&self) -> &str {
        "HTTP JSON"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(body: &str) -> (Vec<Bar>, bool) {
        let records: Vec<HttpRecord> = serde_json::from_str(body).unwrap();
        HttpJsonSource::decode(records).unwrap()
    }

    #[test]
    fn test_records_with_dates() {
        let (bars, indexed) = decode(
            r#"[
                {"Datetime": "2024-01-02", "Open": 1, "High": 2, "Low": 0.5, "Close": 1.5, "Volume": 100},
                {"Datetime": "2024-01-03", "Open": 1.5, "High": 2.5, "Low": 1, "Close": 2, "Volume": 120}
            ]"#,
        );
        assert!(!indexed);
        assert_eq!(bars[0].timestamp, 1_704_153_600_000);
        assert_eq!(bars[1].close, 2.0);
    }

    #[test]
    fn test_numeric_timestamps() {
        let (bars, _) = decode(r#"[{"timestamp": 1704153600, "Open": 1, "High": 1, "Low": 1, "Close": 1}]"#);
        assert_eq!(bars[0].timestamp, 1_704_153_600_000);
        assert_eq!(bars[0].volume, 0.0);
    }

    #[test]
    fn test_out_of_range_numeric_timestamp() {
        let value = serde_json::json!(i64::MIN);
        assert!(matches!(
            record_timestamp(Some(&value)),
            Err(DataError::ParseError(_))
        ));
        assert_eq!(record_timestamp(Some(&serde_json::json!(-86_400))).unwrap(), -86_400_000);
    }

    #[test]
    fn test_missing_timestamps_are_indexed() {
        let (bars, indexed) = decode(
            r#"[
                {"Open": 1, "High": 1, "Low": 1, "Close": 10, "Volume": 5},
                {"Date": "2024-01-03", "Open": 1, "High": 1, "Low": 1, "Close": 11, "Volume": 5}
            ]"#,
        );
        assert!(indexed);
        let stamps: Vec<i64> = bars.iter().map(|b| b.timestamp).collect();
        assert_eq!(stamps, vec![0, 1]);
    }

    #[test]
    fn test_bad_timestamp() {
        let records: Vec<HttpRecord> =
            serde_json::from_str(r#"[{"Date": "soon", "Open": 1, "High": 1, "Low": 1, "Close": 1}]"#)
                .unwrap();
        assert!(HttpJsonSource::decode(records).is_err());
    }
}
