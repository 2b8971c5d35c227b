//! Per-ticker cycle outcomes.

use std::fmt;

use agent_core::traits::TrainingSummary;
use agent_core::types::{Side, Signal};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Step of the cycle at which a ticker was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetch,
    Features,
    Model,
    Broker,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Fetch => "fetch",
            Stage::Features => "features",
            Stage::Model => "model",
            Stage::Broker => "broker",
        };
        write!(f, "{}", s)
    }
}

/// What happened to one ticker during a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickerOutcome {
    /// Bars fetched for the report; no trading requested
    Fetched { symbol: String, bars: usize },
    /// Signal computed; no trading requested
    Signalled { symbol: String, signal: Signal },
    /// Order accepted by the broker
    Submitted {
        symbol: String,
        signal: Signal,
        side: Side,
        quantity: Decimal,
        order_id: String,
        client_order_id: String,
    },
    /// Order built but not sent
    DryRun {
        symbol: String,
        signal: Signal,
        side: Side,
        quantity: Decimal,
    },
    Held {
        symbol: String,
        signal: Signal,
        reason: String,
    },
    /// Day-trade rule blocked the order
    Ineligible {
        symbol: String,
        signal: Signal,
        reason: String,
    },
    Failed {
        symbol: String,
        stage: Stage,
        error: String,
    },
}

impl TickerOutcome {
    pub fn failed(symbol: &str, stage: Stage, error: impl fmt::Display) -> Self {
        TickerOutcome::Failed {
            symbol: symbol.to_string(),
            stage,
            error: error.to_string(),
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            TickerOutcome::Fetched { symbol, .. }
            | TickerOutcome::Signalled { symbol, .. }
            | TickerOutcome::Submitted { symbol, .. }
            | TickerOutcome::DryRun { symbol, .. }
            | TickerOutcome::Held { symbol, .. }
            | TickerOutcome::Ineligible { symbol, .. }
            | TickerOutcome::Failed { symbol, .. } => symbol,
        }
    }

    pub fn signal(&self) -> Option<&Signal> {
        match self {
            TickerOutcome::Signalled { signal, .. }
            | TickerOutcome::Submitted { signal, .. }
            | TickerOutcome::DryRun { signal, .. }
            | TickerOutcome::Held { signal, .. }
            | TickerOutcome::Ineligible { signal, .. } => Some(signal),
            TickerOutcome::Fetched { .. } | TickerOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TickerOutcome::Failed { .. })
    }
}

impl fmt::Display for TickerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickerOutcome::Fetched { symbol, bars } => write!(f, "{}: {} bars", symbol, bars),
            TickerOutcome::Signalled { symbol, signal } => write!(
                f,
                "{}: {} (p_up {:.2})",
                symbol, signal.signal_type, signal.confidence
            ),
            TickerOutcome::Submitted {
                symbol,
                side,
                quantity,
                order_id,
                ..
            } => write!(f, "{}: {} {} submitted ({})", symbol, side, quantity, order_id),
            TickerOutcome::DryRun {
                symbol,
                side,
                quantity,
                ..
            } => write!(f, "{}: {} {} (dry run)", symbol, side, quantity),
            TickerOutcome::Held { symbol, reason, .. } => write!(f, "{}: HOLD ({})", symbol, reason),
            TickerOutcome::Ineligible { symbol, reason, .. } => {
                write!(f, "{}: rejected ({})", symbol, reason)
            }
            TickerOutcome::Failed {
                symbol,
                stage,
                error,
            } => write!(f, "{}: failed at {}: {}", symbol, stage, error),
        }
    }
}

/// Training result for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub symbol: String,
    pub summary: TrainingSummary,
    /// Share of Up labels in the training set
    pub up_ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::types::SignalType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_lines() {
        let signal = Signal::new("AAPL", SignalType::Buy, 0, 50.0).with_confidence(0.7);
        let outcome = TickerOutcome::DryRun {
            symbol: "AAPL".into(),
            signal: signal.clone(),
            side: Side::Buy,
            quantity: dec!(60),
        };
        assert_eq!(outcome.to_string(), "AAPL: BUY 60 (dry run)");
        assert_eq!(outcome.signal(), Some(&signal));

        let failed = TickerOutcome::failed("MSFT", Stage::Fetch, "no data");
        assert_eq!(failed.to_string(), "MSFT: failed at fetch: no data");
        assert!(failed.is_failure());
        assert_eq!(failed.symbol(), "MSFT");
    }

    #[test]
    fn test_serializes_tagged() {
        let failed = TickerOutcome::failed("MSFT", Stage::Model, "untrained");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["stage"], "model");
    }
}
