//! Account domain
//!
//! This module provides domain types and traits for account registration and
//! activation, including the account entity, payload validation, the store
//! traits and the activation notifier.

mod entity;
mod notifier;
mod repository;
mod validation;

pub use entity::{Account, AccountId, AccountStatus, NewAccount};
pub use notifier::{ActivationNotifier, NotificationError};
pub use repository::{AccountRepository, AccountTransaction};
pub use validation::{
    validate_email_format, validate_password, validate_username, AccountField,
    AccountValidationError, ValidationErrors, FIELD_ORDER, MAX_USERNAME_LENGTH,
    MIN_PASSWORD_LENGTH, MIN_USERNAME_LENGTH,
};

#[cfg(test)]
pub use notifier::MockActivationNotifier;
