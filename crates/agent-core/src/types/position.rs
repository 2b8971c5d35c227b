//! Position and account types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Side;

/// A position in a single security, as reported by the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Symbol
    pub symbol: String,
    /// Number of shares (positive for long, negative for short)
    pub quantity: Decimal,
    /// Average entry price
    pub avg_entry_price: Decimal,
    /// Current market price
    pub current_price: Decimal,
    /// Market value (quantity * current_price)
    pub market_value: Decimal,
    /// Unrealized profit/loss
    pub unrealized_pnl: Decimal,
}

impl Position {
    /// Create a new position marked at its entry price.
    pub fn new(symbol: impl Into<String>, quantity: Decimal, avg_entry_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            avg_entry_price,
            current_price: avg_entry_price,
            market_value: quantity * avg_entry_price,
            unrealized_pnl: Decimal::ZERO,
        }
    }

    /// Check if this is a long position.
    pub fn is_long(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    /// Check if the position is flat (no shares).
    pub fn is_flat(&self) -> bool {
        self.quantity == Decimal::ZERO
    }

    /// Update the current market price and recalculate values.
    pub fn update_price(&mut self, price: Decimal) {
        self.current_price = price;
        self.market_value = self.quantity * price;
        self.unrealized_pnl = self.market_value - self.quantity * self.avg_entry_price;
    }

    /// Apply a fill to a long-only position.
    pub fn apply_fill(&mut self, side: Side, quantity: Decimal, price: Decimal) {
        match side {
            Side::Buy => {
                let total_cost = self.quantity * self.avg_entry_price + quantity * price;
                self.quantity += quantity;
                if self.quantity != Decimal::ZERO {
                    self.avg_entry_price = total_cost / self.quantity;
                }
            }
            Side::Sell => {
                self.quantity -= quantity;
            }
        }
        self.update_price(price);
    }
}

/// Account snapshot from the broker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Account {
    /// Available cash
    pub cash: Decimal,
    /// Buying power (may be different from cash due to margin)
    pub buying_power: Decimal,
    /// Total equity (cash + market value of positions)
    pub equity: Decimal,
    /// Day trades counted by the broker in its rolling window
    pub day_trade_count: u32,
}

impl Account {
    /// Create a cash-only account.
    pub fn new(cash: Decimal) -> Self {
        Self {
            cash,
            buying_power: cash,
            equity: cash,
            day_trade_count: 0,
        }
    }

    pub fn with_day_trades(mut self, count: u32) -> Self {
        self.day_trade_count = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_position_fills() {
        let mut position = Position::new("AAPL", Decimal::ZERO, Decimal::ZERO);
        assert!(position.is_flat());

        position.apply_fill(Side::Buy, dec!(10), dec!(100));
        position.apply_fill(Side::Buy, dec!(10), dec!(110));
        assert_eq!(position.quantity, dec!(20));
        assert_eq!(position.avg_entry_price, dec!(105));
        assert_eq!(position.unrealized_pnl, dec!(100));

        position.apply_fill(Side::Sell, dec!(20), dec!(120));
        assert!(position.is_flat());
        assert!(!position.is_long());
    }

    #[test]
    fn test_account_new() {
        let account = Account::new(dec!(10000)).with_day_trades(2);
        assert_eq!(account.equity, dec!(10000));
        assert_eq!(account.buying_power, dec!(10000));
        assert_eq!(account.day_trade_count, 2);
    }
}
