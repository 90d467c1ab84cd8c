//! Per-request identity.
//!
//! `authenticate` runs once per request in the protected route group and
//! stores the resolved [`Identity`] in the request extensions. Handlers get it
//! back as an explicit `CurrentIdentity` argument.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::VARY, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::{identity::Identity, services::Authenticator};
use crate::error::AppError;

pub async fn authenticate(
    State(auth): State<Authenticator>,
    mut req: Request,
    next: Next,
) -> Response {
    let mut res = match auth.authenticate(req.headers()).await {
        Ok(identity) => {
            debug!(user_id = ?identity.user_id(), "request identity resolved");
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(e) => AppError::from(e).into_response(),
    };
    res.headers_mut()
        .append(VARY, HeaderValue::from_static("Authorization"));
    res
}

/// The identity resolved for this request.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or(AppError::MissingIdentity)
    }
}
