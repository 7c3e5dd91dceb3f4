//! Development notifier that writes the activation link to the log

use async_trait::async_trait;
use tracing::info;

use crate::domain::account::{ActivationNotifier, NotificationError};

use super::activation_link;

/// Notifier for local development: never fails, never sends mail
#[derive(Debug, Clone)]
pub struct LogNotifier {
    activation_url: String,
}

impl LogNotifier {
    pub fn new(activation_url: impl Into<String>) -> Self {
        Self {
            activation_url: activation_url.into(),
        }
    }
}

#[async_trait]
impl ActivationNotifier for LogNotifier {
    async fn send_activation(&self, email: &str, token: &str) -> Result<(), NotificationError> {
        let link = activation_link(&self.activation_url, token);

        info!(to = %email, activation_link = %link, "Activation email (log notifier)");

        Ok(())
    }
}
