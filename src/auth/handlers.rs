use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        authorize::require_user,
        dto::{CreateTokenRequest, CreateTokenResponse},
        middleware::CurrentIdentity,
        services::Authenticator,
    },
    error::Result,
    state::AppState,
};

pub fn token_routes() -> Router<AppState> {
    Router::new().route("/tokens/authentication", post(create_token))
}

/// Routes that need the auth middleware in front of them.
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/tokens/authentication", delete(revoke_tokens))
}

#[instrument(skip(auth, payload))]
pub async fn create_token(
    State(auth): State<Authenticator>,
    Json(payload): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<CreateTokenResponse>)> {
    let token = auth.login(&payload.username, &payload.password).await?;
    info!(user_id = token.user_id, "user logged in");
    Ok((StatusCode::CREATED, Json(CreateTokenResponse { auth_token: token })))
}

#[instrument(skip(auth, identity))]
pub async fn revoke_tokens(
    State(auth): State<Authenticator>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<StatusCode> {
    let user = require_user(&identity)?;
    let revoked = auth.logout_everywhere(user.id).await?;
    info!(user_id = user.id, revoked, "user logged out");
    Ok(StatusCode::NO_CONTENT)
}
