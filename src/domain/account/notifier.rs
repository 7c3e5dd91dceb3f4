//! Activation message delivery

use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Delivery failures reported by a notifier
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Failed to build activation message: {0}")]
    Message(String),

    #[error("Failed to deliver activation message: {0}")]
    Delivery(String),
}

/// Sends the activation message for a freshly registered account
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ActivationNotifier: Send + Sync + Debug {
    /// Deliver `token` to `email`
    async fn send_activation(&self, email: &str, token: &str) -> Result<(), NotificationError>;
}
