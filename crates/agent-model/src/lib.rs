//! Direction classifier and signal generation.
//!
//! The classifier is a seeded random forest of CART trees. The
//! [`SignalGenerator`] turns its predictions into BUY/SELL signals.

mod decision_tree;
mod random_forest;
mod signal;

pub use decision_tree::{DecisionTree, TreeConfig};
pub use random_forest::{ForestConfig, RandomForestClassifier};
pub use signal::SignalGenerator;
