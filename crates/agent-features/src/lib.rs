//! Feature engineering for the direction classifier.
//!
//! Bars are turned into [`FeatureRow`](agent_core::FeatureRow)s by the
//! [`FeatureBuilder`], labelled by [`label_directions`], and joined into a
//! training set by [`TrainingSet::align`].

mod builder;
mod dataset;
mod labeler;

pub use builder::{FeatureBuilder, FeatureConfig};
pub use dataset::TrainingSet;
pub use labeler::label_directions;
