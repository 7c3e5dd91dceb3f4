//! Domain layer - Core business logic and entities

pub mod account;
pub mod error;

pub use error::DomainError;
