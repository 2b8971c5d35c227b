//! Technical indicators used for feature engineering.
//!
//! - Simple moving average over closes
//! - Relative Strength Index with Wilder smoothing

pub mod momentum;
pub mod moving_average;

pub use momentum::Rsi;
pub use moving_average::Sma;
