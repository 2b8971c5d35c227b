//! CART decision tree for binary classification.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Decision tree configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth of tree
    pub max_depth: usize,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Maximum features to consider for split (None = all)
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        /// Fraction of up samples reaching this leaf
        up_probability: f64,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Binary classification tree using Gini impurity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<Node>,
}

impl DecisionTree {
    /// Create a new decision tree with config
    pub fn new(config: TreeConfig) -> Self {
        Self { config, root: None }
    }

    /// Fit on the rows selected by `indices`.
    ///
    /// `features[i]` must all have the same width; `labels[i]` is 0 or 1.
    /// Feature subsampling draws from `rng`, so equal seeds give equal trees.
    pub fn fit(&mut self, features: &[Vec<f64>], labels: &[u8], indices: &[usize], rng: &mut StdRng) {
        self.root = Some(self.build(features, labels, indices, 0, rng));
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    /// Probability of class 1 for one sample (0.5 if unfitted).
    pub fn predict_proba_one(&self, sample: &[f64]) -> f64 {
        let mut node = match &self.root {
            Some(node) => node,
            None => return 0.5,
        };

        loop {
            match node {
                Node::Leaf { up_probability, .. } => return *up_probability,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Predicted class for one sample.
    pub fn predict_one(&self, sample: &[f64]) -> u8 {
        u8::from(self.predict_proba_one(sample) > 0.5)
    }

    pub fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map(depth).unwrap_or(0)
    }

    fn build(
        &self,
        features: &[Vec<f64>],
        labels: &[u8],
        indices: &[usize],
        depth: usize,
        rng: &mut StdRng,
    ) -> Node {
        let n = indices.len();
        let ups = indices.iter().filter(|&&i| labels[i] == 1).count();
        let impurity = gini(ups, n);

        if depth >= self.config.max_depth || n < self.config.min_samples_split || impurity < 1e-12 {
            return leaf(ups, n);
        }

        let Some(split) = self.best_split(features, labels, indices, impurity, rng) else {
            return leaf(ups, n);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| features[i][split.feature] <= split.threshold);

        let left = self.build(features, labels, &left_idx, depth + 1, rng);
        let right = self.build(features, labels, &right_idx, depth + 1, rng);

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Sweep each candidate feature in sorted order, tracking class counts
    /// on the left side, and keep the midpoint threshold with the best gain.
    fn best_split(
        &self,
        features: &[Vec<f64>],
        labels: &[u8],
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let n_features = features[indices[0]].len();
        let max_features = self
            .config
            .max_features
            .unwrap_or(n_features)
            .clamp(1, n_features);

        let mut candidates: Vec<usize> = (0..n_features).collect();
        candidates.shuffle(rng);
        candidates.truncate(max_features);
        // evaluation order must not depend on the shuffle for tie-breaking
        candidates.sort_unstable();

        let n = indices.len();
        let total_ups = indices.iter().filter(|&&i| labels[i] == 1).count();
        let min_leaf = self.config.min_samples_leaf.max(1);
        let mut best: Option<SplitCandidate> = None;

        for feature in candidates {
            let mut sorted = indices.to_vec();
            sorted.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

            let mut left_ups = 0usize;
            for k in 0..n - 1 {
                if labels[sorted[k]] == 1 {
                    left_ups += 1;
                }
                let left_n = k + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                let current = features[sorted[k]][feature];
                let next = features[sorted[k + 1]][feature];
                if current >= next {
                    continue;
                }

                let weighted = (left_n as f64 * gini(left_ups, left_n)
                    + right_n as f64 * gini(total_ups - left_ups, right_n))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if gain > best.as_ref().map(|b| b.gain).unwrap_or(0.0) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (current + next) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

fn leaf(ups: usize, n: usize) -> Node {
    let up_probability = if n == 0 { 0.5 } else { ups as f64 / n as f64 };
    Node::Leaf {
        up_probability,
        samples: n,
    }
}

fn gini(ups: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = ups as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_learns_threshold() {
        let features: Vec<Vec<f64>> = (0..100).map(|i| vec![i as f64 / 10.0]).collect();
        let labels: Vec<u8> = (0..100).map(|i| u8::from(i >= 50)).collect();
        let indices: Vec<usize> = (0..100).collect();

        let mut tree = DecisionTree::new(TreeConfig::default());
        tree.fit(&features, &labels, &indices, &mut StdRng::seed_from_u64(42));

        assert!(tree.is_fitted());
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.predict_one(&[1.0]), 0);
        assert_eq!(tree.predict_one(&[9.0]), 1);
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let labels = vec![1, 1, 1];
        let mut tree = DecisionTree::new(TreeConfig {
            min_samples_split: 2,
            ..Default::default()
        });
        tree.fit(&features, &labels, &[0, 1, 2], &mut StdRng::seed_from_u64(1));

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_proba_one(&[0.0]), 1.0);
    }

    #[test]
    fn test_unfitted_is_neutral() {
        let tree = DecisionTree::new(TreeConfig::default());
        assert_eq!(tree.predict_proba_one(&[1.0, 2.0]), 0.5);
        assert_eq!(tree.predict_one(&[1.0, 2.0]), 0);
    }
}
