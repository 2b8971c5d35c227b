//! CLI command implementations.

pub mod report;
pub mod run;
pub mod setup;
pub mod signals;
pub mod validate;
