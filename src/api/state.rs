//! Application state for shared services

use std::sync::Arc;

use crate::domain::account::{AccountRepository, ActivationNotifier};
use crate::domain::DomainError;
use crate::infrastructure::account::{
    ActivationOutcome, PasswordHasher, RegistrationOutcome, RegistrationRequest,
    RegistrationService,
};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub registration_service: Arc<dyn RegistrationServiceTrait>,
}

impl AppState {
    pub fn new(registration_service: Arc<dyn RegistrationServiceTrait>) -> Self {
        Self {
            registration_service,
        }
    }
}

/// Trait for registration service operations
#[async_trait::async_trait]
pub trait RegistrationServiceTrait: Send + Sync {
    async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationOutcome, DomainError>;
    async fn activate(&self, token: &str) -> Result<ActivationOutcome, DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
}

#[async_trait::async_trait]
impl<R, H, N> RegistrationServiceTrait for RegistrationService<R, H, N>
where
    R: AccountRepository + 'static,
    H: PasswordHasher + 'static,
    N: ActivationNotifier + 'static,
{
    async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationOutcome, DomainError> {
        RegistrationService::register(self, request).await
    }

    async fn activate(&self, token: &str) -> Result<ActivationOutcome, DomainError> {
        RegistrationService::activate(self, token).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        RegistrationService::count(self).await
    }
}
