//! Core traits for the stock agent.

mod broker;
mod classifier;
mod data_source;
mod indicator;
mod notifier;

pub use broker::Broker;
pub use classifier::{Classifier, TrainingSummary};
pub use data_source::DataSource;
pub use indicator::Indicator;
pub use notifier::Notifier;
