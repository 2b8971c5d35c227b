//! Rolling-statistic features over a single ticker's bars.

use agent_core::error::FeatureError;
use agent_core::types::{Bar, FeatureRow};
use agent_indicators::{Rsi, Sma};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lookback windows for feature engineering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Short moving-average window (S)
    pub short_window: usize,
    /// Long moving-average window (L), must exceed S
    pub long_window: usize,
    /// RSI period; RSI is left out of the feature vector when unset
    pub rsi_period: Option<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            short_window: 10,
            long_window: 50,
            rsi_period: None,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.short_window == 0 {
            return Err(FeatureError::InvalidWindow(
                "short window must be at least 1".into(),
            ));
        }
        if self.short_window >= self.long_window {
            return Err(FeatureError::InvalidWindow(format!(
                "short window {} must be less than long window {}",
                self.short_window, self.long_window
            )));
        }
        if self.rsi_period == Some(0) {
            return Err(FeatureError::InvalidWindow(
                "RSI period must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Smallest bar index that can carry a feature row.
    pub fn first_index(&self) -> usize {
        let mut first = (self.long_window - 1).max(1);
        if let Some(period) = self.rsi_period {
            first = first.max(period);
        }
        first
    }
}

/// Builds feature rows from ordered bars.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    config: FeatureConfig,
    short: Sma,
    long: Sma,
    rsi: Option<Rsi>,
}

impl FeatureBuilder {
    pub fn new(config: FeatureConfig) -> Result<Self, FeatureError> {
        config.validate()?;
        Ok(Self {
            short: Sma::new(config.short_window),
            long: Sma::new(config.long_window),
            rsi: config.rsi_period.map(Rsi::new),
            config,
        })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// One row per bar index whose windows are all fully populated.
    ///
    /// Indices before the long window fills are dropped, as are indices whose
    /// volume change is undefined (zero or missing previous volume).
    pub fn build(&self, bars: &[Bar]) -> Vec<FeatureRow> {
        let first = self.config.first_index();
        if bars.len() < self.config.long_window || bars.len() <= first {
            return Vec::new();
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let short = self.short.aligned(&closes);
        let long = self.long.aligned(&closes);
        let rsi = self.rsi.as_ref().map(|r| r.aligned(&closes));

        let mut rows = Vec::with_capacity(bars.len() - first);
        let mut undefined_volume = 0usize;

        for i in first..bars.len() {
            let (Some(sma_short), Some(sma_long)) = (short[i], long[i]) else {
                continue;
            };

            let rsi_value = match &rsi {
                Some(values) => match values[i] {
                    Some(v) => Some(v),
                    None => continue,
                },
                None => None,
            };

            let prev_volume = bars[i - 1].volume;
            let volume_change = (bars[i].volume - prev_volume) / prev_volume;
            if !volume_change.is_finite() {
                undefined_volume += 1;
                continue;
            }

            rows.push(FeatureRow {
                index: i,
                timestamp: bars[i].timestamp,
                close: bars[i].close,
                sma_short,
                sma_long,
                volume_change,
                rsi: rsi_value,
            });
        }

        if undefined_volume > 0 {
            debug!(
                dropped = undefined_volume,
                "Dropped feature rows with undefined volume change"
            );
        }

        rows
    }
}
