//! Daily trading cycle.
//!
//! [`TradingCycle`] fetches bars for each ticker, trains a fresh classifier,
//! reconciles the latest signal against the brokerage and finishes with the
//! plain-text profit/loss report built by [`Reporter`].

mod engine;
mod outcome;
mod report;

pub use engine::{CycleConfig, CycleMode, CycleReport, TradingCycle};
pub use outcome::{Stage, TickerOutcome, TrainingRecord};
pub use report::{ReportMode, Reporter, NO_DATA_REPORT};
