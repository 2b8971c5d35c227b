//! Brokerage integrations.
//!
//! [`AlpacaBroker`] talks to the Alpaca trading REST API (paper or live);
//! [`PaperBroker`] keeps an in-memory account and fills market orders
//! immediately at the last marked price.

mod alpaca;
mod paper;

pub use alpaca::{AlpacaBroker, AlpacaConfig};
pub use paper::PaperBroker;
