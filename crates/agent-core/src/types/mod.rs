//! Core data types for the stock agent.

mod feature;
mod ohlcv;
mod order;
mod position;
mod signal;
mod timeframe;

pub use feature::{Direction, FeatureRow};
pub use ohlcv::{Bar, BarSeries, SymbolBar};
pub use order::{Order, OrderRequest, OrderStatus, OrderType, Side, TimeInForce};
pub use position::{Account, Position};
pub use signal::{Signal, SignalType};
pub use timeframe::Timeframe;
