//! Broker trait definition.

use crate::error::BrokerError;
use crate::types::{Account, Order, OrderRequest, Position};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Trait for broker integrations.
///
/// The agent only reads account and position state and submits orders;
/// it never follows an order after submission.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Get cash, equity and day-trade count.
    async fn get_account(&self) -> Result<Account, BrokerError>;

    /// Get position for a specific symbol.
    ///
    /// # Returns
    /// The position if one exists, None when flat
    async fn get_position(&self, symbol: &str) -> Result<Option<Position>, BrokerError>;

    /// Submit a new order.
    ///
    /// # Returns
    /// The broker's acknowledgement of the order
    async fn submit_order(&self, request: OrderRequest) -> Result<Order, BrokerError>;

    /// Latest observed price for a symbol.
    ///
    /// Brokers that price fills locally use it; remote brokers ignore it.
    async fn mark_price(&self, _symbol: &str, _price: Decimal) {}

    /// Get the broker name.
    fn name(&self) -> &str;
}
