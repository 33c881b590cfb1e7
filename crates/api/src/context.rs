use pantry_auth::AccessClaims;
use pantry_core::UserId;

/// The authenticated account behind a request.
///
/// Inserted by the auth middleware; every `/api` handler except register
/// and login can rely on it being present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerContext {
    user_id: UserId,
    email: String,
    username: String,
}

impl OwnerContext {
    pub fn new(user_id: UserId, email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            username: username.into(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl From<AccessClaims> for OwnerContext {
    fn from(claims: AccessClaims) -> Self {
        Self::new(claims.sub, claims.email, claims.username)
    }
}
