//! In-memory paper broker.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use agent_core::error::BrokerError;
use agent_core::traits::Broker;
use agent_core::types::{Account, Order, OrderRequest, OrderStatus, OrderType, Position, Side};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct PaperState {
    cash: Decimal,
    positions: HashMap<String, Position>,
    marks: HashMap<String, Decimal>,
    orders: Vec<Order>,
    day_trade_count: u32,
}

/// Paper broker filling market orders immediately at the last marked price.
///
/// Long only: a SELL larger than the held quantity is rejected.
#[derive(Clone)]
pub struct PaperBroker {
    state: Arc<Mutex<PaperState>>,
    slippage_pct: Decimal,
}

impl PaperBroker {
    /// Create a paper account holding only cash.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            state: Arc::new(Mutex::new(PaperState {
                cash: initial_cash,
                ..Default::default()
            })),
            slippage_pct: Decimal::ZERO,
        }
    }

    /// Set slippage percentage applied against the trader on every fill.
    pub fn with_slippage(mut self, slippage_pct: Decimal) -> Self {
        self.slippage_pct = slippage_pct;
        self
    }

    /// Report this many day trades in the account.
    pub fn with_day_trades(self, count: u32) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.day_trade_count = count;
        }
        self
    }

    /// Seed a position, marked at its entry price.
    pub fn with_position(self, symbol: &str, quantity: Decimal, price: Decimal) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.marks.insert(symbol.to_string(), price);
            state
                .positions
                .insert(symbol.to_string(), Position::new(symbol, quantity, price));
        }
        self
    }

    /// Every order accepted so far, oldest first.
    pub fn orders(&self) -> Result<Vec<Order>, BrokerError> {
        Ok(self.lock()?.orders.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, PaperState>, BrokerError> {
        self.state
            .lock()
            .map_err(|_| BrokerError::ApiError("paper broker state poisoned".into()))
    }

    fn fill_price(&self, side: Side, mark: Decimal) -> Decimal {
        match side {
            Side::Buy => mark * (dec!(1) + self.slippage_pct / dec!(100)),
            Side::Sell => mark * (dec!(1) - self.slippage_pct / dec!(100)),
        }
    }
}

#[async_trait]
impl Broker for PaperBroker {
    async fn get_account(&self) -> Result<Account, BrokerError> {
        let state = self.lock()?;
        let market_value: Decimal = state.positions.values().map(|p| p.market_value).sum();
        Ok(Account {
            cash: state.cash,
            buying_power: state.cash,
            equity: state.cash + market_value,
            day_trade_count: state.day_trade_count,
        })
    }

    async fn get_position(&self, symbol: &str) -> Result<Option<Position>, BrokerError> {
        Ok(self.lock()?.positions.get(symbol).cloned())
    }

    async fn submit_order(&self, request: OrderRequest) -> Result<Order, BrokerError> {
        if request.order_type != OrderType::Market {
            return Err(BrokerError::OrderRejected(
                "paper broker only fills market orders".into(),
            ));
        }
        if request.quantity <= Decimal::ZERO {
            return Err(BrokerError::OrderRejected(format!(
                "quantity must be positive, got {}",
                request.quantity
            )));
        }

        let mut state = self.lock()?;
        let mark = *state.marks.get(&request.symbol).ok_or_else(|| {
            BrokerError::OrderRejected(format!("no price for {}", request.symbol))
        })?;
        let price = self.fill_price(request.side, mark);
        let value = price * request.quantity;

        match request.side {
            Side::Buy => {
                if value > state.cash {
                    return Err(BrokerError::InsufficientFunds {
                        required: value,
                        available: state.cash,
                    });
                }
                state.cash -= value;
            }
            Side::Sell => {
                let held = state
                    .positions
                    .get(&request.symbol)
                    .map(|p| p.quantity)
                    .unwrap_or(Decimal::ZERO);
                if request.quantity > held {
                    return Err(BrokerError::OrderRejected(format!(
                        "cannot sell {} {}, holding {}",
                        request.quantity, request.symbol, held
                    )));
                }
                state.cash += value;
            }
        }

        let position = state
            .positions
            .entry(request.symbol.clone())
            .or_insert_with(|| Position::new(request.symbol.clone(), Decimal::ZERO, Decimal::ZERO));
        position.apply_fill(request.side, request.quantity, price);
        if position.is_flat() {
            state.positions.remove(&request.symbol);
        }

        let mut order = Order::from_request(&request);
        order.status = OrderStatus::Filled;
        order.filled_avg_price = Some(price);
        state.orders.push(order.clone());

        debug!(
            symbol = %order.symbol,
            side = %order.side,
            quantity = %order.quantity,
            %price,
            "Paper order filled"
        );
        Ok(order)
    }

    async fn mark_price(&self, symbol: &str, price: Decimal) {
        match self.state.lock() {
            Ok(mut state) => {
                state.marks.insert(symbol.to_string(), price);
                if let Some(position) = state.positions.get_mut(symbol) {
                    position.update_price(price);
                }
            }
            Err(_) => warn!(symbol, "Paper broker state poisoned; price not marked"),
        }
    }

    fn name(&self) -> &str {
        "Paper Broker"
    }
}
