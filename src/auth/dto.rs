use serde::{Deserialize, Serialize};

use super::tokens::NewToken;

/// Request body for `POST /tokens/authentication`.
#[derive(Deserialize)]
pub struct CreateTokenRequest {
    pub username: String,
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct CreateTokenResponse {
    pub auth_token: NewToken,
}
