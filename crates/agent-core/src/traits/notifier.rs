//! Notification channel trait.

use crate::error::NotifyError;
use async_trait::async_trait;

/// A channel accepting a plain-text report body.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message.
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;

    /// Get the channel name.
    fn name(&self) -> &str;
}
