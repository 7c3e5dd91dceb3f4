//! Account store traits

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{Account, AccountId, NewAccount};
use crate::domain::DomainError;

/// Repository trait for account storage
#[async_trait]
pub trait AccountRepository: Send + Sync + Debug {
    /// Get a committed account by its id
    async fn get(&self, id: AccountId) -> Result<Option<Account>, DomainError>;

    /// Exact, case-sensitive lookup by email
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DomainError>;

    /// Open a write transaction
    async fn begin(&self) -> Result<Box<dyn AccountTransaction>, DomainError>;

    /// Activate the pending account holding `token` and clear the token.
    ///
    /// The match and the write happen as one step, so a token can be consumed
    /// at most once even under concurrent calls. Returns `None` when no pending
    /// account holds the token.
    async fn consume_activation_token(&self, token: &str) -> Result<Option<Account>, DomainError>;

    /// Count committed accounts
    async fn count(&self) -> Result<usize, DomainError>;

    /// Check if an email is already registered
    async fn email_exists(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.find_by_email(email).await?.is_some())
    }
}

/// A unit of work against the account store
///
/// Rows inserted through the transaction stay invisible to every read until
/// `commit` returns. Dropping an unfinished transaction rolls it back.
#[async_trait]
pub trait AccountTransaction: Send {
    /// Insert a pending account.
    ///
    /// Fails with `DomainError::Conflict` when the email is already taken,
    /// including by another open transaction.
    async fn insert(&mut self, account: NewAccount) -> Result<Account, DomainError>;

    /// Make every write of this transaction durable and visible
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    /// Discard every write of this transaction
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}
