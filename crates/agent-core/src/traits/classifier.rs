//! Classifier trait definition.

use crate::error::ModelError;
use crate::types::{Direction, FeatureRow};
use serde::{Deserialize, Serialize};

/// Outcome of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Rows the model was fit on
    pub train_rows: usize,
    /// Rows held out for validation
    pub validation_rows: usize,
    /// Accuracy on the held-out rows (None when nothing was held out)
    pub validation_accuracy: Option<f64>,
}

/// Binary direction classifier over fixed-width feature rows.
///
/// Implementations must be deterministic: a model trained with a given seed
/// on given data always predicts the same classes for the same rows.
pub trait Classifier: Send + Sync {
    /// Fit the model. `labels[i]` is the target for `features[i]`.
    fn train(
        &mut self,
        features: &[FeatureRow],
        labels: &[Direction],
    ) -> Result<TrainingSummary, ModelError>;

    /// Predict a class per row.
    fn predict(&self, features: &[FeatureRow]) -> Result<Vec<Direction>, ModelError>;

    /// Probability of `Direction::Up` per row.
    fn predict_proba(&self, features: &[FeatureRow]) -> Result<Vec<f64>, ModelError>;

    fn is_trained(&self) -> bool;

    fn name(&self) -> &str;
}
