//! Account registration, login and lookup on top of `UserStore`.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use pantry_auth::{
    AuthError, Hs256Jwt, PasswordError, Registration, TokenError, UserAccount, hash_password,
    normalize_email, verify_password,
};
use pantry_core::UserId;

use crate::store::{StoreError, UniqueField, UserStore};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("password worker failed: {0}")]
    Worker(String),
}

impl From<PasswordError> for AccountError {
    fn from(err: PasswordError) -> Self {
        AccountError::Auth(AuthError::Password(err))
    }
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub account: UserAccount,
    pub access_token: String,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    jwt: Arc<Hs256Jwt>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, jwt: Arc<Hs256Jwt>) -> Self {
        Self { users, jwt }
    }

    pub async fn register(&self, registration: Registration) -> Result<UserAccount, AccountError> {
        let registration = registration.validate()?;

        if self.users.find_by_email(&registration.email).await?.is_some() {
            return Err(AuthError::EmailTaken.into());
        }

        let password = registration.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AccountError::Worker(e.to_string()))??;

        let account = UserAccount {
            id: UserId::new(),
            username: registration.username,
            email: registration.email,
            password_hash,
            created_at: Utc::now(),
        };

        let account = self.users.insert(account).await.map_err(|e| match e {
            StoreError::Duplicate(UniqueField::Email) => AccountError::Auth(AuthError::EmailTaken),
            StoreError::Duplicate(UniqueField::Username) => {
                AccountError::Auth(AuthError::UsernameTaken)
            }
            other => AccountError::Store(other),
        })?;

        tracing::info!(user_id = %account.id, "account registered");
        Ok(account)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AccountError> {
        let Some(account) = self.users.find_by_email(&normalize_email(email)).await? else {
            return Err(AuthError::InvalidCredentials.into());
        };

        let plain = password.to_string();
        let stored = account.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&plain, &stored))
            .await
            .map_err(|e| AccountError::Worker(e.to_string()))??;
        if !matches {
            return Err(AuthError::InvalidCredentials.into());
        }

        let access_token = self
            .jwt
            .issue(account.id, &account.email, &account.username, Utc::now())?;
        tracing::info!(user_id = %account.id, "login succeeded");

        Ok(Session {
            account,
            access_token,
        })
    }

    pub async fn get(&self, id: UserId) -> Result<Option<UserAccount>, AccountError> {
        Ok(self.users.get(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use pantry_auth::JwtValidator;

    use super::*;
    use crate::store::InMemoryUserStore;

    fn service() -> (AccountService, Arc<Hs256Jwt>) {
        let jwt = Arc::new(Hs256Jwt::new(b"test-secret", Duration::minutes(60)));
        (
            AccountService::new(Arc::new(InMemoryUserStore::new()), jwt.clone()),
            jwt,
        )
    }

    fn registration(username: &str, email: &str) -> Registration {
        Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login_issues_a_valid_token() {
        let (accounts, jwt) = service();
        let account = accounts
            .register(registration("tester", "Tester@Example.com"))
            .await
            .unwrap();
        assert_eq!(account.email, "tester@example.com");
        assert_ne!(account.password_hash, "password123");

        let session = accounts
            .login(" TESTER@example.com", "password123")
            .await
            .unwrap();
        let claims = jwt.validate(&session.access_token, Utc::now()).unwrap();
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.username, "tester");
    }

    #[tokio::test]
    async fn duplicate_email_and_username_are_reported() {
        let (accounts, _) = service();
        accounts.register(registration("tester", "a@example.com")).await.unwrap();

        assert!(matches!(
            accounts.register(registration("other", "a@example.com")).await,
            Err(AccountError::Auth(AuthError::EmailTaken))
        ));
        assert!(matches!(
            accounts.register(registration("tester", "b@example.com")).await,
            Err(AccountError::Auth(AuthError::UsernameTaken))
        ));
    }

    #[tokio::test]
    async fn bad_credentials_are_indistinguishable() {
        let (accounts, _) = service();
        accounts.register(registration("tester", "a@example.com")).await.unwrap();

        let wrong_password = accounts.login("a@example.com", "nope-nope").await.unwrap_err();
        let unknown_email = accounts.login("b@example.com", "password123").await.unwrap_err();
        assert_eq!(wrong_password.to_string(), "Invalid email or password");
        assert_eq!(unknown_email.to_string(), wrong_password.to_string());
    }
}
