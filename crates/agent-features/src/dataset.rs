//! Supervised training set assembly.

use agent_core::types::{Bar, Direction, FeatureRow};

use crate::{label_directions, FeatureBuilder};

/// Feature rows paired with the direction of the following period.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub features: Vec<FeatureRow>,
    pub labels: Vec<Direction>,
}

impl TrainingSet {
    /// Pair each row at bar index `i` with the label at `i + 1`.
    ///
    /// The row of the last bar has no next period and is left out.
    pub fn align(rows: &[FeatureRow], labels: &[Option<Direction>]) -> Self {
        let mut set = TrainingSet::default();
        for row in rows {
            if let Some(Some(label)) = labels.get(row.index + 1) {
                set.features.push(*row);
                set.labels.push(*label);
            }
        }
        set
    }

    /// Build features and labels from bars in one pass.
    ///
    /// Also returns every feature row, including the unlabelled latest one,
    /// for inference.
    pub fn from_bars(builder: &FeatureBuilder, bars: &[Bar]) -> (Self, Vec<FeatureRow>) {
        let rows = builder.build(bars);
        let labels = label_directions(bars);
        (Self::align(&rows, &labels), rows)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Fraction of `Up` labels.
    pub fn up_ratio(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        let ups = self.labels.iter().filter(|l| **l == Direction::Up).count();
        ups as f64 / self.labels.len() as f64
    }
}
