//! Recording notifier for tests

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::account::{ActivationNotifier, NotificationError};

/// A captured activation message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentActivation {
    pub email: String,
    pub token: String,
}

/// Notifier that captures messages instead of sending them
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentActivation>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a notifier whose deliveries always fail
    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            should_fail: Arc::new(Mutex::new(true)),
        }
    }

    pub async fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock().await = fail;
    }

    pub async fn sent(&self) -> Vec<SentActivation> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl ActivationNotifier for RecordingNotifier {
    async fn send_activation(&self, email: &str, token: &str) -> Result<(), NotificationError> {
        if *self.should_fail.lock().await {
            return Err(NotificationError::Delivery(
                "Mock notifier configured to fail".to_string(),
            ));
        }

        self.sent.lock().await.push(SentActivation {
            email: email.to_string(),
            token: token.to_string(),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_messages() {
        let notifier = RecordingNotifier::new();

        notifier.send_activation("a@b.co", "t1").await.unwrap();

        assert_eq!(
            notifier.sent().await,
            vec![SentActivation {
                email: "a@b.co".to_string(),
                token: "t1".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_failing_records_nothing() {
        let notifier = RecordingNotifier::failing();

        assert!(notifier.send_activation("a@b.co", "t1").await.is_err());
        assert_eq!(notifier.sent_count().await, 0);

        notifier.set_should_fail(false).await;
        assert!(notifier.send_activation("a@b.co", "t1").await.is_ok());
    }
}
