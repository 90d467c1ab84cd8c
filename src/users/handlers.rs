use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        authorize::require_user, errors::AuthError, middleware::CurrentIdentity,
        password::PasswordHash,
    },
    error::{AppError, Result},
    state::AppState,
    users::{
        dto::{RegisterUserRequest, UserResponse},
        repo::CreateUserError,
        repo_types::NewUser,
    },
};

pub fn register_routes() -> Router<AppState> {
    Router::new().route("/users", post(register_user))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate(req: &RegisterUserRequest) -> std::result::Result<(), &'static str> {
    if req.username.trim().is_empty() {
        return Err("username is required");
    }
    if req.email.is_empty() {
        return Err("email is required");
    }
    if !is_valid_email(&req.email) {
        return Err("invalid email format");
    }
    if req.password.is_empty() {
        return Err("password is required");
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register_user(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    payload.email = payload.email.trim().to_lowercase();

    if let Err(msg) = validate(&payload) {
        warn!(reason = msg, "invalid registration");
        return Err(AppError::Validation(msg.into()));
    }

    let mut password_hash = PasswordHash::default();
    password_hash.set(&payload.password).map_err(AuthError::from)?;

    let new_user = NewUser {
        username: payload.username,
        email: payload.email,
        password_hash,
        bio: payload.bio.filter(|b| !b.is_empty()),
    };

    let user = state.users.create_user(new_user).await.map_err(|e| match e {
        CreateUserError::UsernameTaken => {
            warn!("username already taken");
            AppError::from(AuthError::UsernameTaken)
        }
        CreateUserError::EmailTaken => {
            warn!("email already registered");
            AppError::from(AuthError::EmailTaken)
        }
        CreateUserError::Other(e) => {
            error!(error = %e, "create user failed");
            AppError::Internal(e)
        }
    })?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

#[instrument(skip(identity))]
pub async fn get_me(CurrentIdentity(identity): CurrentIdentity) -> Result<Json<UserResponse>> {
    let user = require_user(&identity)?.clone();
    Ok(Json(UserResponse { user }))
}
