//! In-memory account repository implementation

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::account::{
    Account, AccountId, AccountRepository, AccountTransaction, NewAccount,
};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct StoreState {
    accounts: BTreeMap<AccountId, Account>,
    /// Emails held by open transactions
    reserved_emails: HashSet<String>,
    last_id: i64,
}

impl StoreState {
    fn email_taken(&self, email: &str) -> bool {
        self.reserved_emails.contains(email) || self.accounts.values().any(|a| a.email() == email)
    }
}

/// In-memory implementation of AccountRepository
///
/// Transactions reserve the email on insert and only publish the row on
/// commit, which gives the same isolation and uniqueness a relational store
/// would give through a unique index.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountRepository {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryAccountRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, DomainError> {
        lock_state(&self.state)
    }

    /// Insert and commit an account in one step
    pub async fn insert_committed(&self, account: NewAccount) -> Result<Account, DomainError> {
        let mut tx = self.begin().await?;
        let account = tx.insert(account).await?;
        tx.commit().await?;
        Ok(account)
    }

    /// All committed accounts ordered by id
    pub fn snapshot(&self) -> Result<Vec<Account>, DomainError> {
        Ok(self.lock()?.accounts.values().cloned().collect())
    }
}

fn lock_state(state: &Mutex<StoreState>) -> Result<MutexGuard<'_, StoreState>, DomainError> {
    state
        .lock()
        .map_err(|_| DomainError::storage("Account store lock poisoned"))
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn get(&self, id: AccountId) -> Result<Option<Account>, DomainError> {
        Ok(self.lock()?.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        let state = self.lock()?;
        Ok(state.accounts.values().find(|a| a.email() == email).cloned())
    }

    async fn begin(&self) -> Result<Box<dyn AccountTransaction>, DomainError> {
        Ok(Box::new(InMemoryTransaction {
            state: Arc::clone(&self.state),
            staged: Vec::new(),
            finished: false,
        }))
    }

    async fn consume_activation_token(&self, token: &str) -> Result<Option<Account>, DomainError> {
        let mut state = self.lock()?;

        let account = state
            .accounts
            .values_mut()
            .find(|a| a.activation_token() == Some(token));

        match account {
            Some(account) => {
                account.activate(token);
                Ok(Some(account.clone()))
            }
            None => Ok(None),
        }
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.lock()?.accounts.len())
    }
}

/// Open transaction against the in-memory store
#[derive(Debug)]
struct InMemoryTransaction {
    state: Arc<Mutex<StoreState>>,
    staged: Vec<Account>,
    finished: bool,
}

impl InMemoryTransaction {
    fn release(&mut self) -> Result<(), DomainError> {
        let mut state = lock_state(&self.state)?;

        for account in self.staged.drain(..) {
            state.reserved_emails.remove(account.email());
        }

        self.finished = true;
        Ok(())
    }
}

#[async_trait]
impl AccountTransaction for InMemoryTransaction {
    async fn insert(&mut self, account: NewAccount) -> Result<Account, DomainError> {
        let mut state = lock_state(&self.state)?;

        if state.email_taken(&account.email) {
            return Err(DomainError::conflict(format!(
                "Email '{}' already exists",
                account.email
            )));
        }

        state.last_id += 1;
        let id = AccountId::new(state.last_id);
        state.reserved_emails.insert(account.email.clone());

        let account = account.into_account(id);
        self.staged.push(account.clone());

        Ok(account)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), DomainError> {
        let mut state = lock_state(&self.state)?;

        for account in self.staged.drain(..) {
            state.reserved_emails.remove(account.email());
            state.accounts.insert(account.id(), account);
        }

        drop(state);
        self.finished = true;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), DomainError> {
        self.release()
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.release();
        }
    }
}
