//! Account infrastructure module
//!
//! This module provides implementations for account registration: password
//! hashing with Argon2, activation token generation, the in-memory and
//! PostgreSQL stores, and the registration service.

mod password;
mod postgres_repository;
mod repository;
mod service;
mod token;

pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresAccountRepository;
pub use repository::InMemoryAccountRepository;
pub use service::{
    ActivationOutcome, RegistrationOutcome, RegistrationRequest, RegistrationService,
};
pub use token::{ActivationTokenGenerator, DEFAULT_TOKEN_LENGTH};
