//! Engineered features and direction labels.

use serde::{Deserialize, Serialize};

/// Binary price direction, used both as training label and predicted class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Class 0: close did not rise
    Down,
    /// Class 1: close strictly rose
    Up,
}

impl Direction {
    /// Direction of a move from `previous` to `current` close.
    pub fn between(previous: f64, current: f64) -> Self {
        if current > previous {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    /// Numeric class (1 = up, 0 = down).
    pub fn class(&self) -> u8 {
        match self {
            Direction::Down => 0,
            Direction::Up => 1,
        }
    }

    pub fn from_class(class: u8) -> Self {
        if class == 0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }
}

/// Features for one ticker at one bar index.
///
/// Only built where every lookback window is fully populated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Index of the source bar within its series
    pub index: usize,
    /// Timestamp of the source bar (Unix ms)
    pub timestamp: i64,
    /// Close of the source bar
    pub close: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    pub volume_change: f64,
    pub rsi: Option<f64>,
}

impl FeatureRow {
    /// Number of values in the numeric vector of this row.
    pub fn width(&self) -> usize {
        if self.rsi.is_some() {
            4
        } else {
            3
        }
    }

    /// Numeric feature vector fed to classifiers.
    pub fn values(&self) -> Vec<f64> {
        let mut values = vec![self.sma_short, self.sma_long, self.volume_change];
        if let Some(rsi) = self.rsi {
            values.push(rsi);
        }
        values
    }

    /// Names matching `values()`.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = vec!["sma_short", "sma_long", "volume_change"];
        if self.rsi.is_some() {
            names.push("rsi");
        }
        names
    }
}
