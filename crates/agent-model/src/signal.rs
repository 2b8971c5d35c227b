//! Classifier predictions to BUY/SELL signals.

use agent_core::error::ModelError;
use agent_core::traits::Classifier;
use agent_core::types::{Direction, FeatureRow, Signal, SignalType};

/// Maps predicted directions to signals: `Up` is BUY, `Down` is SELL.
///
/// HOLD is never emitted here.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalGenerator;

impl SignalGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Signal for the most recent feature row.
    pub fn latest(
        &self,
        classifier: &dyn Classifier,
        symbol: &str,
        rows: &[FeatureRow],
    ) -> Result<Signal, ModelError> {
        let last = rows.last().ok_or(ModelError::InsufficientData {
            required: 1,
            available: 0,
        })?;

        let mut signals = self.all(classifier, symbol, std::slice::from_ref(last))?;
        signals.pop().ok_or(ModelError::InsufficientData {
            required: 1,
            available: 0,
        })
    }

    /// One signal per row, in row order.
    pub fn all(
        &self,
        classifier: &dyn Classifier,
        symbol: &str,
        rows: &[FeatureRow],
    ) -> Result<Vec<Signal>, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let probabilities = classifier.predict_proba(rows)?;
        Ok(rows
            .iter()
            .zip(probabilities)
            .map(|(row, p)| {
                let direction = Direction::from_class(u8::from(p > 0.5));
                Signal::new(symbol, SignalType::from(direction), row.timestamp, row.close)
                    .with_confidence(p)
            })
            .collect())
    }
}
