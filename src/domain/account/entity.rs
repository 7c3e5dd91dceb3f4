//! Account entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i64);

impl AccountId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of an account
///
/// A pending account always holds its activation token and an active account
/// never does, so the two can not drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AccountStatus {
    /// Registered, waiting for the activation token to come back
    Pending { activation_token: String },
    /// Activation token consumed
    Active,
}

/// An account that has not been written to the store yet
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub activation_token: String,
}

impl NewAccount {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        activation_token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            activation_token: activation_token.into(),
        }
    }

    /// Materialize the row once the store has assigned an id
    pub fn into_account(self, id: AccountId) -> Account {
        let now = Utc::now();

        Account {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            status: AccountStatus::Pending {
                activation_token: self.activation_token,
            },
            created_at: now,
            updated_at: now,
        }
    }
}

/// Registered user account
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    id: AccountId,
    username: String,
    email: String,
    /// Argon2 PHC string - never exposed in serialization
    #[serde(skip_serializing)]
    password_hash: String,
    #[serde(skip_serializing)]
    status: AccountStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    /// Rebuild an account from stored columns
    pub fn restore(
        id: AccountId,
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        status: AccountStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn status(&self) -> &AccountStatus {
        &self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_inactive(&self) -> bool {
        matches!(self.status, AccountStatus::Pending { .. })
    }

    pub fn activation_token(&self) -> Option<&str> {
        match &self.status {
            AccountStatus::Pending { activation_token } => Some(activation_token),
            AccountStatus::Active => None,
        }
    }

    /// Consume the activation token if it matches.
    ///
    /// Returns false and leaves the account untouched on a mismatch or when the
    /// account is already active.
    pub fn activate(&mut self, token: &str) -> bool {
        if self.activation_token() != Some(token) {
            return false;
        }

        self.status = AccountStatus::Active;
        self.updated_at = Utc::now();
        true
    }
}
