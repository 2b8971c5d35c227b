//! Trade gating for the stock agent.
//!
//! Provides the pattern-day-trader eligibility rule, cash allocation sizing,
//! and the reconciler that turns signals into orders.

mod config;
mod eligibility;
mod reconciler;
mod sizer;

pub use config::TradingConfig;
pub use eligibility::{count_in_window, DayTradeRule, Eligibility};
pub use reconciler::{TradeDecision, TradeReconciler};
pub use sizer::AllocationSizer;
