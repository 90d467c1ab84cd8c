use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
};
use time::{Duration, OffsetDateTime};
use tracing::{debug, error, warn};

use crate::{
    auth::{
        errors::AuthError,
        identity::Identity,
        password::verify_dummy,
        repo::TokenStore,
        tokens::{hash_for_lookup, NewToken, Scope},
    },
    state::AppState,
    users::repo::UserStore,
};

/// Turns request credentials into an [`Identity`] and mints login tokens.
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    token_ttl: Duration,
}

impl FromRef<AppState> for Authenticator {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.tokens.clone(), state.config.token_ttl())
    }
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<dyn TokenStore>, token_ttl: Duration) -> Self {
        Self {
            users,
            tokens,
            token_ttl,
        }
    }

    /// Password login. Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<NewToken, AuthError> {
        let user = self.users.get_user_by_username(username).await.map_err(|e| {
            error!(error = %e, "get_user_by_username failed");
            AuthError::Store(e)
        })?;

        let Some(user) = user else {
            verify_dummy(password);
            warn!("login unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !user.password_hash.matches(password)? {
            warn!(user_id = user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = NewToken::issue(user.id, self.token_ttl, Scope::Auth).ok_or_else(|| {
            error!(ttl = ?self.token_ttl, "token expiry overflow");
            AuthError::ExpiryOutOfRange
        })?;
        self.tokens.save(&token).await.map_err(|e| {
            error!(error = %e, user_id = user.id, "token save failed");
            AuthError::Store(e)
        })?;

        debug!(user_id = user.id, expiry = %token.expiry, "auth token issued");
        Ok(token)
    }

    /// Resolve the `Authorization` header. A missing header is `Anonymous`,
    /// not an error.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let Some(token) = bearer_token(headers.get(AUTHORIZATION))? else {
            return Ok(Identity::Anonymous);
        };

        let hash = hash_for_lookup(token);
        let record = self
            .tokens
            .find_valid(&hash, Scope::Auth)
            .await
            .map_err(|e| {
                error!(error = %e, "token lookup failed");
                AuthError::Store(e)
            })?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        // Stores may still hold rows that have expired.
        if record.expiry <= OffsetDateTime::now_utc() {
            debug!(user_id = record.user_id, "expired token presented");
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let user = self
            .users
            .get_user_by_id(record.user_id)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = record.user_id, "get_user_by_id failed");
                AuthError::Store(e)
            })?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        Ok(Identity::User(user))
    }

    /// Revoke every auth token held by `user_id`.
    pub async fn logout_everywhere(&self, user_id: i64) -> Result<u64, AuthError> {
        let revoked = self
            .tokens
            .delete_all_for_user(user_id, Scope::Auth)
            .await
            .map_err(|e| {
                error!(error = %e, user_id, "token revoke failed");
                AuthError::Store(e)
            })?;
        debug!(user_id, revoked, "auth tokens revoked");
        Ok(revoked)
    }
}

/// Extract the token from `Bearer <token>`.
///
/// `Ok(None)` when the header is absent or empty. Anything else that is not
/// exactly the case-sensitive scheme, one space and a non-empty token is
/// `MalformedAuthHeader`, including `"Bearer "`.
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<Option<&str>, AuthError> {
    let Some(value) = header else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::MalformedAuthHeader)?;
    if value.is_empty() {
        return Ok(None);
    }

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(Some(token)),
        _ => Err(AuthError::MalformedAuthHeader),
    }
}
