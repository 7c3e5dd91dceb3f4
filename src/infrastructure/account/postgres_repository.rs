//! PostgreSQL account repository implementation

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, Row, Transaction};

use crate::domain::account::{
    Account, AccountId, AccountRepository, AccountStatus, AccountTransaction, NewAccount,
};
use crate::domain::DomainError;

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password_hash, inactive, activation_token, created_at, updated_at";

/// PostgreSQL implementation of AccountRepository
#[derive(Debug, Clone)]
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        condition: &str,
        value: &str,
        context: &str,
    ) -> Result<Option<Account>, DomainError> {
        let sql = format!("SELECT {} FROM accounts WHERE {}", ACCOUNT_COLUMNS, condition);

        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to {}: {}", context, e)))?;

        row.as_ref().map(row_to_account).transpose()
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn get(&self, id: AccountId) -> Result<Option<Account>, DomainError> {
        let sql = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get account: {}", e)))?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DomainError> {
        self.fetch_one_where("email = $1", email, "get account by email")
            .await
    }

    async fn begin(&self) -> Result<Box<dyn AccountTransaction>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to open transaction: {}", e)))?;

        Ok(Box::new(PostgresAccountTransaction { tx }))
    }

    async fn consume_activation_token(&self, token: &str) -> Result<Option<Account>, DomainError> {
        let sql = format!(
            r#"
            UPDATE accounts
            SET inactive = FALSE, activation_token = NULL, updated_at = NOW()
            WHERE activation_token = $1 AND inactive
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to activate account: {}", e)))?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count accounts: {}", e)))?;

        Ok(count as usize)
    }
}

/// Open PostgreSQL transaction
///
/// sqlx rolls the transaction back when it is dropped without a commit.
struct PostgresAccountTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AccountTransaction for PostgresAccountTransaction {
    async fn insert(&mut self, account: NewAccount) -> Result<Account, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO accounts (username, email, password_hash, inactive, activation_token)
            VALUES ($1, $2, $3, TRUE, $4)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&account.username)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.activation_token)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| classify_insert_error(&e.to_string(), &account.email))?;

        row_to_account(&row)
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit transaction: {}", e)))
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to roll back transaction: {}", e)))
    }
}

fn classify_insert_error(message: &str, email: &str) -> DomainError {
    let unique_violation = message.contains("duplicate key") || message.contains("unique constraint");

    if unique_violation && message.contains("email") {
        DomainError::conflict(format!("Email '{}' already exists", email))
    } else {
        DomainError::storage(format!("Failed to create account: {}", message))
    }
}

fn row_to_account(row: &PgRow) -> Result<Account, DomainError> {
    let id: i64 = get_column(row, "id")?;
    let username: String = get_column(row, "username")?;
    let email: String = get_column(row, "email")?;
    let password_hash: String = get_column(row, "password_hash")?;
    let inactive: bool = get_column(row, "inactive")?;
    let activation_token: Option<String> = get_column(row, "activation_token")?;
    let created_at: chrono::DateTime<chrono::Utc> = get_column(row, "created_at")?;
    let updated_at: chrono::DateTime<chrono::Utc> = get_column(row, "updated_at")?;

    let status = status_from_columns(inactive, activation_token).ok_or_else(|| {
        DomainError::storage(format!(
            "Account '{}' is inactive without an activation token",
            id
        ))
    })?;

    Ok(Account::restore(
        AccountId::new(id),
        username,
        email,
        password_hash,
        status,
        created_at,
        updated_at,
    ))
}

fn get_column<'r, T>(row: &'r PgRow, column: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| DomainError::storage(format!("Invalid '{}' column: {}", column, e)))
}

/// An active row keeps no token; a stale one left by hand is ignored
fn status_from_columns(inactive: bool, activation_token: Option<String>) -> Option<AccountStatus> {
    match (inactive, activation_token) {
        (true, Some(activation_token)) => Some(AccountStatus::Pending { activation_token }),
        (true, None) => None,
        (false, _) => Some(AccountStatus::Active),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_columns() {
        assert_eq!(
            status_from_columns(true, Some("abc".to_string())),
            Some(AccountStatus::Pending {
                activation_token: "abc".to_string()
            })
        );
        assert_eq!(status_from_columns(false, None), Some(AccountStatus::Active));
        assert_eq!(
            status_from_columns(false, Some("stale".to_string())),
            Some(AccountStatus::Active)
        );
        assert_eq!(status_from_columns(true, None), None);
    }

    #[test]
    fn test_classify_unique_violation() {
        let error = classify_insert_error(
            r#"duplicate key value violates unique constraint "accounts_email_key""#,
            "user1@mail.com",
        );
        assert!(error.is_conflict());
    }

    #[test]
    fn test_classify_token_collision_is_not_email_conflict() {
        let error = classify_insert_error(
            r#"duplicate key value violates unique constraint "idx_accounts_activation_token""#,
            "user1@mail.com",
        );
        assert!(matches!(error, DomainError::Storage { .. }));
    }

    #[test]
    fn test_classify_other_error() {
        let error = classify_insert_error("connection reset by peer", "user1@mail.com");
        assert!(matches!(error, DomainError::Storage { .. }));
    }
}
