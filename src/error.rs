//! Unified handler error.
//!
//! Every handler returns `Result<T, AppError>`. Responses use the JSON
//! envelope `{"error": "<message>"}`; server-side failures are logged with
//! full detail and reported to the client only as a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::errors::AuthError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// A handler asked for the request identity on a route the
    /// authentication middleware does not cover.
    #[error("request identity missing; route is not behind the auth middleware")]
    MissingIdentity,

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::MalformedAuthHeader
                | AuthError::InvalidOrExpiredToken
                | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
                AuthError::Forbidden => StatusCode::FORBIDDEN,
                AuthError::UsernameTaken | AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::ExpiryOutOfRange | AuthError::Hashing(_) | AuthError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MissingIdentity | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// What the client is allowed to see.
    pub fn public_message(&self) -> String {
        match self {
            Self::Auth(err) if err.is_internal() => "internal server error".to_string(),
            Self::Auth(err) => err.to_string(),
            Self::MissingIdentity | Self::Internal(_) => "internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
