//! Alpaca market data REST source.

use agent_core::error::DataError;
use agent_core::traits::DataSource;
use agent_core::types::{Bar, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::normalize;

const PAGE_LIMIT: usize = 10_000;

/// Credentials and endpoint for the market data API.
#[derive(Debug, Clone)]
pub struct AlpacaDataConfig {
    pub api_key: String,
    pub api_secret: String,
    pub data_url: String,
    /// `iex` (free) or `sip`
    pub feed: String,
}

impl AlpacaDataConfig {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            data_url: "https://data.alpaca.markets".to_string(),
            feed: "iex".to_string(),
        }
    }

    pub fn with_data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = url.into();
        self
    }

    pub fn with_feed(mut self, feed: impl Into<String>) -> Self {
        self.feed = feed.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct AlpacaBar {
    t: String,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
}

#[derive(Debug, Deserialize)]
struct AlpacaBarsResponse {
    #[serde(default)]
    bars: Option<Vec<AlpacaBar>>,
    next_page_token: Option<String>,
}

/// Historical bars from `/v2/stocks/{symbol}/bars`.
pub struct AlpacaDataSource {
    config: AlpacaDataConfig,
    client: Client,
}

impl AlpacaDataSource {
    pub fn new(config: AlpacaDataConfig) -> Result<Self, DataError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "APCA-API-KEY-ID",
            header::HeaderValue::from_str(&config.api_key)
                .map_err(|e| DataError::Internal(e.to_string()))?,
        );
        headers.insert(
            "APCA-API-SECRET-KEY",
            header::HeaderValue::from_str(&config.api_secret)
                .map_err(|e| DataError::Internal(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        Ok(Self { config, client })
    }

    async fn fetch_page(
        &self,
        symbol: &str,
        params: &[(&str, String)],
    ) -> Result<AlpacaBarsResponse, DataError> {
        let url = format!("{}/v2/stocks/{}/bars", self.config.data_url, symbol);

        let resp = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        match resp.status() {
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                return Err(DataError::SymbolNotFound(symbol.to_string()));
            }
            status if !status.is_success() => {
                let text = resp.text().await.unwrap_or_default();
                return Err(DataError::ConnectionError(format!("{}: {}", status, text)));
            }
            _ => {}
        }

        resp.json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl DataSource for AlpacaDataSource {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError> {
        let base = vec![
            ("timeframe", timeframe.alpaca_code().to_string()),
            ("start", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("end", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("feed", self.config.feed.clone()),
            ("adjustment", "raw".to_string()),
            ("limit", PAGE_LIMIT.to_string()),
        ];

        let mut bars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = base.clone();
            if let Some(token) = &page_token {
                params.push(("page_token", token.clone()));
            }

            let page = self.fetch_page(symbol, &params).await?;
            for b in page.bars.unwrap_or_default() {
                match DateTime::parse_from_rfc3339(&b.t) {
                    Ok(ts) => bars.push(Bar::new(ts.timestamp_millis(), b.o, b.h, b.l, b.c, b.v)),
                    Err(e) => warn!(symbol, timestamp = %b.t, error = %e, "Skipping bar with bad timestamp"),
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(symbol, bars = bars.len(), "Fetched Alpaca bars");
        Ok(normalize(symbol, timeframe, bars, start, end))
    }

    fn name(&self) -> &str {
        "Alpaca"
    }
}
