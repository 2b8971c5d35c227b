//! Core types and traits for the stock agent.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, SymbolBar, BarSeries)
//! - Engineered features and direction labels
//! - Order, position and account types
//! - Trading signals
//! - Traits for data sources, brokers, notifiers, classifiers and indicators

pub mod types;
pub mod traits;
pub mod error;

pub use error::{AgentError, AgentResult};
pub use types::*;
pub use traits::*;
