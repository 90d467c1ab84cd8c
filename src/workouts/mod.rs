mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;

/// Every workout route sits behind the auth middleware; reads accept
/// anonymous callers, writes check ownership.
pub fn router() -> Router<AppState> {
    handlers::workout_routes()
}
