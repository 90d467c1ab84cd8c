//! Authentication and authorization failures.
//!
//! Token failures collapse into a single `InvalidOrExpiredToken` and login
//! failures into a single `InvalidCredentials`, so callers never learn whether
//! a username exists or a token was once valid.

use thiserror::Error;

use super::password::HashingError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Authorization header present but not `Bearer <token>`.
    #[error("invalid authorization header")]
    MalformedAuthHeader,

    /// Unknown, expired, or orphaned token.
    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    /// Action needs a logged-in user.
    #[error("authentication required")]
    Unauthenticated,

    /// Logged in, but not the owner of the resource.
    #[error("not authorized")]
    Forbidden,

    #[error("username already taken")]
    UsernameTaken,

    #[error("email already registered")]
    EmailTaken,

    /// The configured TTL pushes the expiry past the calendar range.
    #[error("token expiry out of range")]
    ExpiryOutOfRange,

    #[error("password hashing error: {0}")]
    Hashing(#[from] HashingError),

    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl AuthError {
    /// Failures caused by the server rather than the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::ExpiryOutOfRange | AuthError::Hashing(_) | AuthError::Store(_)
        )
    }
}
