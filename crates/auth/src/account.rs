//! Registered accounts and registration rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pantry_core::UserId;

use crate::password::PasswordError;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 20;
pub const PASSWORD_MIN_CHARS: usize = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already registered")]
    EmailTaken,

    #[error("Username already registered")]
    UsernameTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// A stored account. `password_hash` is a PHC string, never the plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Registration input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    /// Validate and normalize (trimmed username, trimmed lowercase email).
    pub fn validate(self) -> Result<Self, AuthError> {
        let username = self.username.trim().to_string();
        let len = username.chars().count();
        if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
            return Err(AuthError::Validation(format!(
                "Username must be between {USERNAME_MIN_CHARS} and {USERNAME_MAX_CHARS} characters"
            )));
        }

        let email = normalize_email(&self.email);
        if !is_plausible_email(&email) {
            return Err(AuthError::Validation("Invalid email address".to_string()));
        }

        if self.password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(AuthError::Validation(format!(
                "Password must be at least {PASSWORD_MIN_CHARS} characters"
            )));
        }

        Ok(Self {
            username,
            email,
            password: self.password,
        })
    }
}

/// Emails are compared and stored trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}
