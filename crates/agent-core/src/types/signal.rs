//! Trading signals.

use serde::{Deserialize, Serialize};

use super::{Direction, Side};

/// Action requested for a ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    Buy,
    Sell,
    /// Never produced by the classifier; synthesized when no position change is warranted
    Hold,
}

impl SignalType {
    /// Order side for actionable signals.
    pub fn side(&self) -> Option<Side> {
        match self {
            SignalType::Buy => Some(Side::Buy),
            SignalType::Sell => Some(Side::Sell),
            SignalType::Hold => None,
        }
    }
}

impl From<Direction> for SignalType {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => SignalType::Buy,
            Direction::Down => SignalType::Sell,
        }
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalType::Buy => write!(f, "BUY"),
            SignalType::Sell => write!(f, "SELL"),
            SignalType::Hold => write!(f, "HOLD"),
        }
    }
}

/// A signal for one ticker at one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub signal_type: SignalType,
    /// Timestamp of the feature row the signal was derived from (Unix ms)
    pub timestamp: i64,
    /// Close price of that row
    pub price: f64,
    /// Probability of an up move assigned by the classifier
    pub confidence: f64,
}

impl Signal {
    pub fn new(symbol: impl Into<String>, signal_type: SignalType, timestamp: i64, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            signal_type,
            timestamp,
            price,
            confidence: 0.5,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn is_actionable(&self) -> bool {
        self.signal_type != SignalType::Hold
    }
}
