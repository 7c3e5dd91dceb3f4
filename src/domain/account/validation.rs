//! Registration payload validation
//!
//! Each field is checked on its own and stops at its first failing rule. The
//! messages are part of the public API and must not change.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

/// Fields of a registration payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountField {
    Username,
    Email,
    Password,
}

impl AccountField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::Password => "password",
        }
    }
}

impl std::fmt::Display for AccountField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order in which fields are validated and reported
pub const FIELD_ORDER: [AccountField; 3] = [
    AccountField::Username,
    AccountField::Email,
    AccountField::Password,
];

/// A single field rejection
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AccountValidationError {
    #[error("Username cannot be null")]
    UsernameRequired,

    #[error("Must have minimal of 4 characters and maximum of 32 characters")]
    UsernameLengthOutOfRange,

    #[error("Email cannot be null")]
    EmailRequired,

    #[error("Email is not valid")]
    EmailInvalidFormat,

    #[error("Email in use")]
    EmailAlreadyInUse,

    #[error("Password cannot be null")]
    PasswordRequired,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Password must have at least 1 uppercase, 1 lowercase and 1 number")]
    PasswordTooWeak,
}

impl AccountValidationError {
    /// The field this rejection is reported under
    pub fn field(&self) -> AccountField {
        match self {
            Self::UsernameRequired | Self::UsernameLengthOutOfRange => AccountField::Username,
            Self::EmailRequired | Self::EmailInvalidFormat | Self::EmailAlreadyInUse => {
                AccountField::Email
            }
            Self::PasswordRequired | Self::PasswordTooShort | Self::PasswordTooWeak => {
                AccountField::Password
            }
        }
    }
}

pub const MIN_USERNAME_LENGTH: usize = 4;
pub const MAX_USERNAME_LENGTH: usize = 32;
pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$",
    )
    .expect("email pattern is a valid regex")
});

/// Treats null, absent and empty values alike
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Validate a username
///
/// Rules:
/// - Required
/// - Between 4 and 32 characters inclusive
pub fn validate_username(username: Option<&str>) -> Result<(), AccountValidationError> {
    let username = present(username).ok_or(AccountValidationError::UsernameRequired)?;
    let length = username.chars().count();

    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&length) {
        return Err(AccountValidationError::UsernameLengthOutOfRange);
    }

    Ok(())
}

/// Validate the shape of an email address
///
/// Uniqueness is checked separately against the account store.
pub fn validate_email_format(email: Option<&str>) -> Result<(), AccountValidationError> {
    let email = present(email).ok_or(AccountValidationError::EmailRequired)?;

    if !EMAIL_PATTERN.is_match(email) {
        return Err(AccountValidationError::EmailInvalidFormat);
    }

    Ok(())
}

/// Validate a password
///
/// Rules:
/// - Required
/// - At least 6 characters
/// - At least one lowercase letter, one uppercase letter and one digit
pub fn validate_password(password: Option<&str>) -> Result<(), AccountValidationError> {
    let password = present(password).ok_or(AccountValidationError::PasswordRequired)?;

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AccountValidationError::PasswordTooShort);
    }

    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !(has_lower && has_upper && has_digit) {
        return Err(AccountValidationError::PasswordTooWeak);
    }

    Ok(())
}

/// Ordered field -> message mapping, at most one entry per field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<AccountValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from per-field results, keeping their order
    pub fn collect<I>(results: I) -> Self
    where
        I: IntoIterator<Item = Result<(), AccountValidationError>>,
    {
        let mut errors = Self::new();

        for result in results {
            if let Err(error) = result {
                errors.push(error);
            }
        }

        errors
    }

    /// Record a rejection; a field that already failed keeps its first message
    pub fn push(&mut self, error: AccountValidationError) {
        if self.get(error.field()).is_none() {
            self.errors.push(error);
        }
    }

    pub fn get(&self, field: AccountField) -> Option<AccountValidationError> {
        self.errors.iter().copied().find(|e| e.field() == field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn fields(&self) -> Vec<AccountField> {
        self.errors.iter().map(|e| e.field()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountValidationError> {
        self.errors.iter()
    }
}

impl From<AccountValidationError> for ValidationErrors {
    fn from(error: AccountValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl Serialize for ValidationErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;

        for error in &self.errors {
            map.serialize_entry(error.field().as_str(), &error.to_string())?;
        }

        map.end()
    }
}
