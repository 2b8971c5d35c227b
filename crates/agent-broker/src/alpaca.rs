//! Alpaca broker integration for paper and live trading.

use agent_core::error::BrokerError;
use agent_core::traits::Broker;
use agent_core::types::{
    Account, Order, OrderRequest, OrderStatus, OrderType, Position, Side, TimeInForce,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, Response, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Alpaca API configuration.
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    pub api_key: String,
    pub api_secret: String,
    pub paper: bool,
    /// Overrides the paper/live trading endpoint
    pub base_url: Option<String>,
}

impl AlpacaConfig {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>, paper: bool) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            paper,
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn base_url(&self) -> &str {
        match &self.base_url {
            Some(url) => url.as_str(),
            None if self.paper => "https://paper-api.alpaca.markets",
            None => "https://api.alpaca.markets",
        }
    }
}

#[derive(Debug, Deserialize)]
struct AlpacaAccount {
    cash: String,
    buying_power: String,
    equity: String,
    #[serde(default)]
    daytrade_count: i64,
}

#[derive(Debug, Deserialize)]
struct AlpacaPosition {
    symbol: String,
    qty: String,
    avg_entry_price: String,
    market_value: Option<String>,
    unrealized_pl: Option<String>,
    current_price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlpacaOrder {
    id: String,
    client_order_id: String,
    status: String,
    symbol: String,
    qty: Option<String>,
    #[serde(rename = "type")]
    order_type: String,
    side: String,
    time_in_force: String,
    filled_avg_price: Option<String>,
    created_at: String,
    submitted_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    symbol: &'a str,
    qty: String,
    side: &'static str,
    #[serde(rename = "type")]
    order_type: &'static str,
    time_in_force: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_order_id: Option<&'a str>,
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, BrokerError> {
    value
        .parse()
        .map_err(|_| BrokerError::ApiError(format!("invalid {}: {:?}", field, value)))
}

fn parse_optional_decimal(field: &str, value: Option<&String>) -> Result<Option<Decimal>, BrokerError> {
    value.map(|v| parse_decimal(field, v)).transpose()
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_account(account: AlpacaAccount) -> Result<Account, BrokerError> {
    Ok(Account {
        cash: parse_decimal("cash", &account.cash)?,
        buying_power: parse_decimal("buying_power", &account.buying_power)?,
        equity: parse_decimal("equity", &account.equity)?,
        day_trade_count: u32::try_from(account.daytrade_count.max(0)).unwrap_or(u32::MAX),
    })
}

fn parse_position(p: AlpacaPosition) -> Result<Position, BrokerError> {
    let quantity = parse_decimal("qty", &p.qty)?;
    let avg_entry_price = parse_decimal("avg_entry_price", &p.avg_entry_price)?;
    let mut position = Position::new(p.symbol, quantity, avg_entry_price);

    if let Some(price) = parse_optional_decimal("current_price", p.current_price.as_ref())? {
        position.update_price(price);
    }
    if let Some(value) = parse_optional_decimal("market_value", p.market_value.as_ref())? {
        position.market_value = value;
    }
    if let Some(pl) = parse_optional_decimal("unrealized_pl", p.unrealized_pl.as_ref())? {
        position.unrealized_pnl = pl;
    }
    Ok(position)
}

fn parse_order(order: AlpacaOrder) -> Result<Order, BrokerError> {
    let side = match order.side.as_str() {
        "buy" => Side::Buy,
        "sell" => Side::Sell,
        other => return Err(BrokerError::ApiError(format!("Unknown side: {}", other))),
    };
    let order_type = match order.order_type.as_str() {
        "limit" => OrderType::Limit,
        _ => OrderType::Market,
    };
    let time_in_force = match order.time_in_force.as_str() {
        "day" => TimeInForce::Day,
        _ => TimeInForce::GTC,
    };

    let submitted_at = order
        .submitted_at
        .as_deref()
        .and_then(parse_time)
        .or_else(|| parse_time(&order.created_at))
        .unwrap_or_else(Utc::now);

    Ok(Order {
        id: order.id,
        client_order_id: order.client_order_id,
        symbol: order.symbol,
        side,
        order_type,
        quantity: parse_optional_decimal("qty", order.qty.as_ref())?.unwrap_or(Decimal::ZERO),
        time_in_force,
        status: OrderStatus::from_wire(&order.status),
        filled_avg_price: parse_optional_decimal("filled_avg_price", order.filled_avg_price.as_ref())?,
        submitted_at,
    })
}

/// Turn a non-success response into a broker error.
async fn error_for(resp: Response) -> BrokerError {
    let status = resp.status();
    let retry_after = resp
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    let text = resp.text().await.unwrap_or_default();

    match status {
        StatusCode::TOO_MANY_REQUESTS => BrokerError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(60),
        },
        StatusCode::UNAUTHORIZED => BrokerError::Configuration(format!("{}: {}", status, text)),
        _ => BrokerError::ApiError(format!("{}: {}", status, text)),
    }
}

/// Alpaca broker client.
pub struct AlpacaBroker {
    config: AlpacaConfig,
    client: Client,
}

impl AlpacaBroker {
    /// Create a new Alpaca broker client.
    pub fn new(config: AlpacaConfig) -> Result<Self, BrokerError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "APCA-API-KEY-ID",
            header::HeaderValue::from_str(&config.api_key)
                .map_err(|e| BrokerError::Configuration(e.to_string()))?,
        );
        headers.insert(
            "APCA-API-SECRET-KEY",
            header::HeaderValue::from_str(&config.api_secret)
                .map_err(|e| BrokerError::Configuration(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl Broker for AlpacaBroker {
    async fn get_account(&self) -> Result<Account, BrokerError> {
        let url = format!("{}/v2/account", self.config.base_url());

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(error_for(resp).await);
        }

        let account: AlpacaAccount = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;
        parse_account(account)
    }

    async fn get_position(&self, symbol: &str) -> Result<Option<Position>, BrokerError> {
        let url = format!("{}/v2/positions/{}", self.config.base_url(), symbol);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(error_for(resp).await);
        }

        let p: AlpacaPosition = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;
        parse_position(p).map(Some)
    }

    async fn submit_order(&self, request: OrderRequest) -> Result<Order, BrokerError> {
        let url = format!("{}/v2/orders", self.config.base_url());

        let create_req = CreateOrderRequest {
            symbol: &request.symbol,
            qty: request.quantity.normalize().to_string(),
            side: request.side.as_str(),
            order_type: request.order_type.as_str(),
            time_in_force: request.time_in_force.as_str(),
            client_order_id: request.client_order_id.as_deref(),
        };

        debug!("Submitting order: {:?}", create_req);

        let resp = self
            .client
            .post(&url)
            .json(&create_req)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        match resp.status() {
            StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY => {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                return Err(BrokerError::OrderRejected(format!("{}: {}", status, text)));
            }
            status if !status.is_success() => return Err(error_for(resp).await),
            _ => {}
        }

        let order: AlpacaOrder = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;

        info!(
            id = %order.id,
            side = %order.side,
            qty = ?order.qty,
            symbol = %order.symbol,
            status = %order.status,
            "Order submitted"
        );
        parse_order(order)
    }

    fn name(&self) -> &str {
        if self.config.paper {
            "Alpaca Paper"
        } else {
            "Alpaca Live"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_base_url() {
        assert_eq!(
            AlpacaConfig::new("k", "s", true).base_url(),
            "https://paper-api.alpaca.markets"
        );
        assert_eq!(
            AlpacaConfig::new("k", "s", false).base_url(),
            "https://api.alpaca.markets"
        );
        assert_eq!(
            AlpacaConfig::new("k", "s", true)
                .with_base_url("http://127.0.0.1:8080")
                .base_url(),
            "http://127.0.0.1:8080"
        );
    }

    #[test]
    fn test_parse_account() {
        let raw: AlpacaAccount = serde_json::from_str(
            r#"{"id": "x", "cash": "10000.50", "buying_power": "20001", "equity": "12000",
                "daytrade_count": 3, "pattern_day_trader": false}"#,
        )
        .unwrap();
        let account = parse_account(raw).unwrap();

        assert_eq!(account.cash, dec!(10000.50));
        assert_eq!(account.equity, dec!(12000));
        assert_eq!(account.day_trade_count, 3);
    }

    #[test]
    fn test_parse_account_rejects_garbage() {
        let raw: AlpacaAccount = serde_json::from_str(
            r#"{"cash": "lots", "buying_power": "0", "equity": "0"}"#,
        )
        .unwrap();
        assert!(matches!(parse_account(raw), Err(BrokerError::ApiError(_))));
    }

    #[test]
    fn test_parse_position() {
        let raw: AlpacaPosition = serde_json::from_str(
            r#"{"asset_id": "a", "symbol": "AAPL", "qty": "15", "avg_entry_price": "100",
                "market_value": "1650", "unrealized_pl": "150", "current_price": "110", "side": "long"}"#,
        )
        .unwrap();
        let position = parse_position(raw).unwrap();

        assert_eq!(position.quantity, dec!(15));
        assert_eq!(position.current_price, dec!(110));
        assert_eq!(position.unrealized_pnl, dec!(150));
    }

    #[test]
    fn test_parse_order() {
        let raw: AlpacaOrder = serde_json::from_str(
            r#"{"id": "904837e3", "client_order_id": "cycle-AAPL", "status": "accepted",
                "symbol": "AAPL", "qty": "60", "filled_qty": "0", "type": "market", "side": "buy",
                "time_in_force": "gtc", "filled_avg_price": null,
                "created_at": "2024-01-15T14:30:00.123Z", "submitted_at": "2024-01-15T14:30:00.456Z"}"#,
        )
        .unwrap();
        let order = parse_order(raw).unwrap();

        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.quantity, dec!(60));
        assert_eq!(order.time_in_force, TimeInForce::GTC);
        assert_eq!(order.status, OrderStatus::Accepted);
        assert_eq!(order.submitted_at.timestamp_subsec_millis(), 456);
    }

    #[test]
    fn test_order_body_uses_request_tif() {
        let request = OrderRequest::market("MSFT", Side::Sell, dec!(12)).with_client_order_id("c1");
        let body = CreateOrderRequest {
            symbol: &request.symbol,
            qty: request.quantity.normalize().to_string(),
            side: request.side.as_str(),
            order_type: request.order_type.as_str(),
            time_in_force: request.time_in_force.as_str(),
            client_order_id: request.client_order_id.as_deref(),
        };
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["time_in_force"], "gtc");
        assert_eq!(json["type"], "market");
        assert_eq!(json["qty"], "12");
        assert_eq!(json["client_order_id"], "c1");
    }
}
