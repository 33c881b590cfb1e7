//! `pantry-auth`: account credentials and access tokens.
//!
//! Decoupled from HTTP and storage: callers persist accounts and carry tokens.

pub mod account;
pub mod claims;
pub mod password;
pub mod token;

pub use account::{AuthError, Registration, UserAccount, normalize_email};
pub use claims::{AccessClaims, TokenValidationError, validate_claims};
pub use password::{PasswordError, hash_password, verify_password};
pub use token::{Hs256Jwt, JwtValidator, TokenError};
