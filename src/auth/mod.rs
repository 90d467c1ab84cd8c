use crate::state::AppState;
use axum::Router;

pub mod authorize;
mod dto;
pub mod errors;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod password;
pub mod repo;
pub mod services;
pub mod tokens;

/// Public login route.
pub fn router() -> Router<AppState> {
    handlers::token_routes()
}

/// Token routes that sit behind the auth middleware.
pub fn protected_router() -> Router<AppState> {
    handlers::session_routes()
}
