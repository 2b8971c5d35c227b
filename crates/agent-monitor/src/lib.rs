//! Logging setup and report notification channels.

mod logging;
mod notify;

pub use logging::{setup_logging, LogRotation};
pub use notify::{EmailConfig, EmailNotifier, LogNotifier, TwilioConfig, TwilioSmsNotifier};
