//! Registration service: sign-up with double opt-in and account activation

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::account::{
    validate_email_format, validate_password, validate_username, Account, AccountField,
    AccountId, AccountRepository, AccountTransaction, AccountValidationError, ActivationNotifier,
    NewAccount, ValidationErrors, FIELD_ORDER,
};
use crate::domain::DomainError;

use super::password::PasswordHasher;
use super::token::ActivationTokenGenerator;

/// Sign-up payload; absent fields are `None`
#[derive(Debug, Clone, Default)]
pub struct RegistrationRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl RegistrationRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: Some(username.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }
}

/// Result of a registration attempt
#[derive(Debug)]
pub enum RegistrationOutcome {
    /// The account was stored as pending and the activation message went out
    Created(Account),
    /// The payload was rejected; nothing was stored
    ValidationFailed(ValidationErrors),
    /// The activation message could not be delivered; nothing was stored
    NotificationFailed,
}

/// Result of an activation attempt
#[derive(Debug)]
pub enum ActivationOutcome {
    Activated(Account),
    InvalidToken,
}

/// Registration service
#[derive(Debug)]
pub struct RegistrationService<R, H, N>
where
    R: AccountRepository,
    H: PasswordHasher,
    N: ActivationNotifier,
{
    repository: Arc<R>,
    hasher: Arc<H>,
    notifier: Arc<N>,
    tokens: ActivationTokenGenerator,
}

impl<R, H, N> RegistrationService<R, H, N>
where
    R: AccountRepository,
    H: PasswordHasher,
    N: ActivationNotifier,
{
    /// Create a new registration service
    pub fn new(repository: Arc<R>, hasher: Arc<H>, notifier: Arc<N>) -> Self {
        Self {
            repository,
            hasher,
            notifier,
            tokens: ActivationTokenGenerator::default(),
        }
    }

    /// Use a custom token generator
    pub fn with_token_generator(mut self, tokens: ActivationTokenGenerator) -> Self {
        self.tokens = tokens;
        self
    }

    /// Validate every field in order, one message per failing field.
    ///
    /// The uniqueness lookup only runs for a well-formed email.
    pub async fn validate(
        &self,
        request: &RegistrationRequest,
    ) -> Result<ValidationErrors, DomainError> {
        let mut errors = ValidationErrors::new();

        for field in FIELD_ORDER {
            let result = match field {
                AccountField::Username => validate_username(request.username.as_deref()),
                AccountField::Email => self.validate_email(request.email.as_deref()).await?,
                AccountField::Password => validate_password(request.password.as_deref()),
            };

            if let Err(e) = result {
                errors.push(e);
            }
        }

        Ok(errors)
    }

    async fn validate_email(
        &self,
        email: Option<&str>,
    ) -> Result<Result<(), AccountValidationError>, DomainError> {
        if let Err(e) = validate_email_format(email) {
            return Ok(Err(e));
        }

        match email {
            Some(email) if self.repository.email_exists(email).await? => {
                Ok(Err(AccountValidationError::EmailAlreadyInUse))
            }
            _ => Ok(Ok(())),
        }
    }

    /// Register a new inactive account and send its activation message.
    ///
    /// The account is inserted inside a transaction that only commits once the
    /// notifier reports success; any notifier failure rolls the insert back.
    pub async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationOutcome, DomainError> {
        let errors = self.validate(&request).await?;
        if !errors.is_empty() {
            return Ok(RegistrationOutcome::ValidationFailed(errors));
        }

        let (Some(username), Some(email), Some(password)) =
            (request.username, request.email, request.password)
        else {
            return Err(DomainError::internal("Validated request is missing a field"));
        };

        let password_hash = self.hasher.hash(&password)?;
        let token = self.tokens.generate();

        let mut tx = self.repository.begin().await?;

        let inserted = tx
            .insert(NewAccount::new(&username, &email, password_hash, &token))
            .await;

        let account = match inserted {
            Ok(account) => account,
            Err(e) if e.is_conflict() => {
                // Lost a race against a concurrent sign-up for the same email
                finish_rollback(tx).await?;
                return Ok(RegistrationOutcome::ValidationFailed(
                    AccountValidationError::EmailAlreadyInUse.into(),
                ));
            }
            Err(e) => {
                finish_rollback(tx).await?;
                return Err(e);
            }
        };

        if let Err(e) = self.notifier.send_activation(&email, &token).await {
            warn!(email = %email, error = %e, "Activation notification failed, rolling back");
            finish_rollback(tx).await?;
            return Ok(RegistrationOutcome::NotificationFailed);
        }

        tx.commit().await?;

        info!(account_id = %account.id(), username = %account.username(), "Account registered");

        Ok(RegistrationOutcome::Created(account))
    }

    /// Activate the pending account holding `token`
    pub async fn activate(&self, token: &str) -> Result<ActivationOutcome, DomainError> {
        match self.repository.consume_activation_token(token).await? {
            Some(account) => {
                info!(account_id = %account.id(), "Account activated");
                Ok(ActivationOutcome::Activated(account))
            }
            None => Ok(ActivationOutcome::InvalidToken),
        }
    }

    /// Get an account by ID
    pub async fn get(&self, id: AccountId) -> Result<Option<Account>, DomainError> {
        self.repository.get(id).await
    }

    /// Count committed accounts
    pub async fn count(&self) -> Result<usize, DomainError> {
        self.repository.count().await
    }
}

async fn finish_rollback(tx: Box<dyn AccountTransaction>) -> Result<(), DomainError> {
    tx.rollback().await.map_err(|e| {
        error!(error = %e, "Failed to roll back registration");
        DomainError::internal(format!("Failed to roll back registration: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{MockActivationNotifier, NotificationError};
    use crate::infrastructure::account::password::Argon2Hasher;
    use crate::infrastructure::account::repository::InMemoryAccountRepository;
    use crate::infrastructure::notification::mock::RecordingNotifier;

    fn hasher() -> Arc<Argon2Hasher> {
        Arc::new(Argon2Hasher::with_params(1024, 1, 1).unwrap())
    }

    fn create_service(
        notifier: RecordingNotifier,
    ) -> (
        RegistrationService<InMemoryAccountRepository, Argon2Hasher, RecordingNotifier>,
        Arc<InMemoryAccountRepository>,
    ) {
        let repository = Arc::new(InMemoryAccountRepository::new());
        let service = RegistrationService::new(repository.clone(), hasher(), Arc::new(notifier));
        (service, repository)
    }

    fn valid_request() -> RegistrationRequest {
        RegistrationRequest::new("user1", "user1@mail.com", "P4ssword")
    }

    fn created(outcome: RegistrationOutcome) -> Account {
        match outcome {
            RegistrationOutcome::Created(account) => account,
            other => panic!("expected Created, got {:?}", other),
        }
    }

    fn validation_errors(outcome: RegistrationOutcome) -> ValidationErrors {
        match outcome {
            RegistrationOutcome::ValidationFailed(errors) => errors,
            other => panic!("expected ValidationFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_creates_pending_account() {
        let notifier = RecordingNotifier::new();
        let (service, repository) = create_service(notifier.clone());

        let account = created(service.register(valid_request()).await.unwrap());

        assert_eq!(account.username(), "user1");
        assert_eq!(account.email(), "user1@mail.com");
        assert!(account.is_inactive());

        let stored = repository.snapshot().unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].is_inactive());
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let (service, repository) = create_service(RecordingNotifier::new());

        service.register(valid_request()).await.unwrap();

        let stored = &repository.snapshot().unwrap()[0];
        assert_ne!(stored.password_hash(), "P4ssword");
        assert!(stored.password_hash().starts_with("$argon2"));
        assert!(hasher().verify("P4ssword", stored.password_hash()));
    }

    #[tokio::test]
    async fn test_register_sends_stored_token() {
        let notifier = RecordingNotifier::new();
        let (service, repository) = create_service(notifier.clone());

        service.register(valid_request()).await.unwrap();

        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].email, "user1@mail.com");

        let stored = &repository.snapshot().unwrap()[0];
        assert_eq!(stored.activation_token(), Some(sent[0].token.as_str()));
        assert_eq!(sent[0].token.len(), 16);
    }

    #[tokio::test]
    async fn test_register_notification_failure_stores_nothing() {
        let (service, repository) = create_service(RecordingNotifier::failing());

        let outcome = service.register(valid_request()).await.unwrap();

        assert!(matches!(outcome, RegistrationOutcome::NotificationFailed));
        assert_eq!(repository.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_after_notification_failure_email_is_free() {
        let notifier = RecordingNotifier::failing();
        let (service, _) = create_service(notifier.clone());

        service.register(valid_request()).await.unwrap();
        notifier.set_should_fail(false).await;

        created(service.register(valid_request()).await.unwrap());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (service, repository) = create_service(RecordingNotifier::new());

        service.register(valid_request()).await.unwrap();
        let errors = validation_errors(service.register(valid_request()).await.unwrap());

        assert_eq!(
            errors.get(AccountField::Email),
            Some(AccountValidationError::EmailAlreadyInUse)
        );
        assert_eq!(repository.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_loses_race_for_email() {
        let notifier = RecordingNotifier::new();
        let (service, repository) = create_service(notifier.clone());

        // Another sign-up holds the email in a transaction that has not committed yet
        let mut other = repository.begin().await.unwrap();
        other
            .insert(NewAccount::new("other", "user1@mail.com", "hash", "othertoken"))
            .await
            .unwrap();

        let errors = validation_errors(service.register(valid_request()).await.unwrap());

        assert_eq!(
            errors.get(AccountField::Email),
            Some(AccountValidationError::EmailAlreadyInUse)
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(notifier.sent_count().await, 0);

        drop(other);
        assert_eq!(repository.count().await.unwrap(), 0);
        created(service.register(valid_request()).await.unwrap());
    }

    #[tokio::test]
    async fn test_register_email_match_is_case_sensitive() {
        let (service, _) = create_service(RecordingNotifier::new());

        service.register(valid_request()).await.unwrap();
        let outcome = service
            .register(RegistrationRequest::new("user2", "User1@mail.com", "P4ssword"))
            .await
            .unwrap();

        created(outcome);
    }

    #[tokio::test]
    async fn test_register_reports_errors_in_field_order() {
        let (service, repository) = create_service(RecordingNotifier::new());

        let errors =
            validation_errors(service.register(RegistrationRequest::default()).await.unwrap());

        assert_eq!(
            errors.fields(),
            vec![
                AccountField::Username,
                AccountField::Email,
                AccountField::Password
            ]
        );
        assert_eq!(
            errors.get(AccountField::Username),
            Some(AccountValidationError::UsernameRequired)
        );
        assert_eq!(
            errors.get(AccountField::Email),
            Some(AccountValidationError::EmailRequired)
        );
        assert_eq!(
            errors.get(AccountField::Password),
            Some(AccountValidationError::PasswordRequired)
        );
        assert_eq!(repository.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_reports_only_failing_fields() {
        let (service, _) = create_service(RecordingNotifier::new());

        let request = RegistrationRequest::new("usr", "user1@mail.com", "lowercase");
        let errors = validation_errors(service.register(request).await.unwrap());

        assert_eq!(
            errors.fields(),
            vec![AccountField::Username, AccountField::Password]
        );
        assert_eq!(
            errors.get(AccountField::Password),
            Some(AccountValidationError::PasswordTooWeak)
        );
    }

    #[tokio::test]
    async fn test_register_invalid_email_format() {
        let (service, _) = create_service(RecordingNotifier::new());

        let request = RegistrationRequest {
            email: Some("mail.com".to_string()),
            ..valid_request()
        };
        let errors = validation_errors(service.register(request).await.unwrap());

        assert_eq!(
            errors.get(AccountField::Email),
            Some(AccountValidationError::EmailInvalidFormat)
        );
    }

    #[tokio::test]
    async fn test_validation_failure_does_not_notify() {
        let mut notifier = MockActivationNotifier::new();
        notifier.expect_send_activation().never();

        let repository = Arc::new(InMemoryAccountRepository::new());
        let service = RegistrationService::new(repository, hasher(), Arc::new(notifier));

        let request = RegistrationRequest {
            password: None,
            ..valid_request()
        };
        let outcome = service.register(request).await.unwrap();

        assert!(matches!(outcome, RegistrationOutcome::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_account_invisible_while_notifying() {
        let repository = Arc::new(InMemoryAccountRepository::new());
        let observer = repository.clone();

        let mut notifier = MockActivationNotifier::new();
        notifier
            .expect_send_activation()
            .times(1)
            .returning(move |_, _| {
                assert!(observer.snapshot().unwrap().is_empty());
                Err(NotificationError::Delivery("smtp down".to_string()))
            });

        let service = RegistrationService::new(repository.clone(), hasher(), Arc::new(notifier));
        let outcome = service.register(valid_request()).await.unwrap();

        assert!(matches!(outcome, RegistrationOutcome::NotificationFailed));
        assert!(repository.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_custom_token_length() {
        let notifier = RecordingNotifier::new();
        let (service, _) = create_service(notifier.clone());
        let service = service.with_token_generator(ActivationTokenGenerator::new(32));

        service.register(valid_request()).await.unwrap();

        assert_eq!(notifier.sent().await[0].token.len(), 32);
    }

    #[tokio::test]
    async fn test_activate_with_valid_token() {
        let notifier = RecordingNotifier::new();
        let (service, repository) = create_service(notifier.clone());

        service.register(valid_request()).await.unwrap();
        let token = notifier.sent().await[0].token.clone();

        let outcome = service.activate(&token).await.unwrap();

        match outcome {
            ActivationOutcome::Activated(account) => {
                assert!(!account.is_inactive());
                assert!(account.activation_token().is_none());
            }
            ActivationOutcome::InvalidToken => panic!("expected activation"),
        }

        let stored = &repository.snapshot().unwrap()[0];
        assert!(!stored.is_inactive());
        assert!(stored.activation_token().is_none());
    }

    #[tokio::test]
    async fn test_activate_token_is_single_use() {
        let notifier = RecordingNotifier::new();
        let (service, _) = create_service(notifier.clone());

        service.register(valid_request()).await.unwrap();
        let token = notifier.sent().await[0].token.clone();

        assert!(matches!(
            service.activate(&token).await.unwrap(),
            ActivationOutcome::Activated(_)
        ));
        assert!(matches!(
            service.activate(&token).await.unwrap(),
            ActivationOutcome::InvalidToken
        ));
    }

    #[tokio::test]
    async fn test_activate_unknown_token() {
        let (service, repository) = create_service(RecordingNotifier::new());

        service.register(valid_request()).await.unwrap();

        let outcome = service.activate("this-token-does-not-exist").await.unwrap();

        assert!(matches!(outcome, ActivationOutcome::InvalidToken));
        assert!(repository.snapshot().unwrap()[0].is_inactive());
    }

    #[tokio::test]
    async fn test_get_and_count() {
        let (service, _) = create_service(RecordingNotifier::new());

        let account = created(service.register(valid_request()).await.unwrap());

        assert_eq!(service.count().await.unwrap(), 1);
        assert_eq!(
            service.get(account.id()).await.unwrap().unwrap().email(),
            "user1@mail.com"
        );
        assert!(service.get(AccountId::new(999)).await.unwrap().is_none());
    }
}
