//! Random forest direction classifier.

use agent_core::error::ModelError;
use agent_core::traits::{Classifier, TrainingSummary};
use agent_core::types::{Direction, FeatureRow};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decision_tree::{DecisionTree, TreeConfig};

/// Random forest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (ceil of sqrt of total if None)
    pub max_features: Option<usize>,
    /// Random seed for the split, bootstraps and feature subsampling
    pub seed: u64,
    /// Fewest aligned rows accepted for training
    pub min_training_rows: usize,
    /// Share of rows held out for validation accuracy
    pub validation_fraction: f64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            seed: 42,
            min_training_rows: 30,
            validation_fraction: 0.2,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_trees == 0 {
            return Err(ModelError::InvalidConfig("n_trees must be at least 1".into()));
        }
        if self.max_depth == 0 {
            return Err(ModelError::InvalidConfig("max_depth must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&self.validation_fraction) {
            return Err(ModelError::InvalidConfig(format!(
                "validation_fraction must be in [0, 1), got {}",
                self.validation_fraction
            )));
        }
        if self.max_features == Some(0) {
            return Err(ModelError::InvalidConfig("max_features must be at least 1".into()));
        }
        Ok(())
    }
}

/// Bagged CART trees voting on the next-period direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForestClassifier {
    pub fn new(config: ForestConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        })
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn fit_trees(&mut self, matrix: &[Vec<f64>], classes: &[u8], train_idx: &[usize]) {
        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (self.n_features as f64).sqrt().ceil() as usize)
            .clamp(1, self.n_features);

        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: Some(max_features),
        };

        self.trees = (0..self.config.n_trees)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(i as u64));
                let bootstrap: Vec<usize> = (0..train_idx.len())
                    .map(|_| train_idx[rng.gen_range(0..train_idx.len())])
                    .collect();

                let mut tree = DecisionTree::new(tree_config.clone());
                tree.fit(matrix, classes, &bootstrap, &mut rng);
                tree
            })
            .collect();
    }

    fn check_rows(&self, features: &[FeatureRow]) -> Result<(), ModelError> {
        if !self.is_trained() {
            return Err(ModelError::UntrainedModel);
        }
        for row in features {
            if row.width() != self.n_features {
                return Err(ModelError::FeatureWidth {
                    expected: self.n_features,
                    actual: row.width(),
                });
            }
        }
        Ok(())
    }

    fn vote(&self, sample: &[f64]) -> f64 {
        let up_votes = self
            .trees
            .iter()
            .filter(|tree| tree.predict_one(sample) == 1)
            .count();
        up_votes as f64 / self.trees.len() as f64
    }
}

impl Classifier for RandomForestClassifier {
    fn train(
        &mut self,
        features: &[FeatureRow],
        labels: &[Direction],
    ) -> Result<TrainingSummary, ModelError> {
        if features.len() != labels.len() {
            return Err(ModelError::LengthMismatch {
                features: features.len(),
                labels: labels.len(),
            });
        }
        let required = self.config.min_training_rows.max(1);
        if features.len() < required {
            return Err(ModelError::InsufficientData {
                required,
                available: features.len(),
            });
        }

        let width = features[0].width();
        if let Some(row) = features.iter().find(|r| r.width() != width) {
            return Err(ModelError::FeatureWidth {
                expected: width,
                actual: row.width(),
            });
        }

        let matrix: Vec<Vec<f64>> = features.iter().map(FeatureRow::values).collect();
        let classes: Vec<u8> = labels.iter().map(Direction::class).collect();

        let mut order: Vec<usize> = (0..features.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(self.config.seed));

        let mut validation_rows = (features.len() as f64 * self.config.validation_fraction) as usize;
        if validation_rows >= features.len() {
            validation_rows = 0;
        }
        let (validation_idx, train_idx) = order.split_at(validation_rows);

        self.n_features = width;
        self.fit_trees(&matrix, &classes, train_idx);

        let validation_accuracy = if validation_idx.is_empty() {
            None
        } else {
            let correct = validation_idx
                .iter()
                .filter(|&&i| u8::from(self.vote(&matrix[i]) > 0.5) == classes[i])
                .count();
            Some(correct as f64 / validation_idx.len() as f64)
        };

        debug!(
            trees = self.trees.len(),
            train_rows = train_idx.len(),
            validation_rows,
            ?validation_accuracy,
            "Random forest trained"
        );

        Ok(TrainingSummary {
            train_rows: train_idx.len(),
            validation_rows,
            validation_accuracy,
        })
    }

    fn predict(&self, features: &[FeatureRow]) -> Result<Vec<Direction>, ModelError> {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| Direction::from_class(u8::from(p > 0.5)))
            .collect())
    }

    fn predict_proba(&self, features: &[FeatureRow]) -> Result<Vec<f64>, ModelError> {
        self.check_rows(features)?;
        Ok(features.iter().map(|row| self.vote(&row.values())).collect())
    }

    fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }

    fn name(&self) -> &str {
        "RandomForest"
    }
}
