//! SMTP activation notifier using lettre

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::fmt;

use crate::domain::account::{ActivationNotifier, NotificationError};
use crate::domain::DomainError;

use super::activation_link;

/// SMTP notifier configuration
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub use_tls: bool,
    /// Front-end activation page; the token is appended as the last path segment
    pub activation_url: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("use_tls", &self.use_tls)
            .field("activation_url", &self.activation_url)
            .finish()
    }
}

/// Delivers activation messages over SMTP
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: SmtpConfig,
    from: Mailbox,
}

impl fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SmtpNotifier {
    /// Create a new SMTP notifier
    pub fn new(config: SmtpConfig) -> Result<Self, DomainError> {
        let from = parse_mailbox(&format!("{} <{}>", config.from_name, config.from_email))
            .map_err(|e| DomainError::configuration(format!("Invalid sender address: {}", e)))?;

        let transport = if config.use_tls {
            let creds = Credentials::new(config.username.clone(), config.password.clone());
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| {
                    DomainError::configuration(format!("Failed to create SMTP relay: {}", e))
                })?
                .credentials(creds)
                .port(config.port)
                .build()
        } else if !config.username.is_empty() {
            let creds = Credentials::new(config.username.clone(), config.password.clone());
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .credentials(creds)
                .port(config.port)
                .build()
        } else {
            // Local catch-all servers such as Mailpit
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .build()
        };

        Ok(Self {
            transport,
            config,
            from,
        })
    }

    fn build_message(&self, email: &str, token: &str) -> Result<Message, NotificationError> {
        let to = parse_mailbox(email)
            .map_err(|e| NotificationError::Message(format!("Invalid recipient: {}", e)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Account Activation")
            .header(ContentType::TEXT_PLAIN)
            .body(activation_body(&self.config.activation_url, token))
            .map_err(|e| NotificationError::Message(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, lettre::address::AddressError> {
    address.parse()
}

/// Plain-text body carrying the token and the activation page link
pub(crate) fn activation_body(activation_url: &str, token: &str) -> String {
    let link = activation_link(activation_url, token);

    format!(
        "Welcome!\n\n\
         Please open the following page to activate your account:\n\
         {link}\n\n\
         Activation token: {token}\n"
    )
}

#[async_trait]
impl ActivationNotifier for SmtpNotifier {
    async fn send_activation(&self, email: &str, token: &str) -> Result<(), NotificationError> {
        let message = self.build_message(email, token)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;

        tracing::info!(to = %email, "Activation email sent");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 1025,
            username: String::new(),
            password: "secret".to_string(),
            from_email: "noreply@example.com".to_string(),
            from_name: "Accounts".to_string(),
            use_tls: false,
            activation_url: "http://localhost:3000/activate/".to_string(),
        }
    }

    #[test]
    fn test_activation_body_contains_link_and_token() {
        let body = activation_body("http://localhost:3000/activate/", "abc123");

        assert!(body.contains("http://localhost:3000/activate/abc123\n"));
        assert!(body.contains("Activation token: abc123"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", config());

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_invalid_sender_rejected() {
        let mut config = config();
        config.from_email = "not an address".to_string();

        let result = SmtpNotifier::new(config);
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_invalid_recipient_fails_before_delivery() {
        let notifier = SmtpNotifier::new(config()).unwrap();

        let result = notifier.build_message("missing-at-sign", "abc123");
        assert!(matches!(result, Err(NotificationError::Message(_))));
    }

    #[tokio::test]
    async fn test_build_message() {
        let notifier = SmtpNotifier::new(config()).unwrap();

        let message = notifier.build_message("user1@mail.com", "abc123").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("To: user1@mail.com"));
        assert!(raw.contains("Subject: Account Activation"));
        assert!(raw.contains("abc123"));
    }
}
