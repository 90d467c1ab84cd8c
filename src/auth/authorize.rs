//! Ownership checks for mutating operations.
//!
//! `owner_id` must be the persisted owner, read right before the mutation,
//! never a value taken from the request body.

use tracing::debug;

use super::{errors::AuthError, identity::Identity};
use crate::users::repo_types::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::Unauthenticated) => Err(AuthError::Unauthenticated),
            Decision::Deny(DenyReason::Forbidden) => Err(AuthError::Forbidden),
        }
    }
}

pub fn authorize(identity: &Identity, owner_id: i64) -> Decision {
    match identity {
        Identity::Anonymous => Decision::Deny(DenyReason::Unauthenticated),
        Identity::User(u) if u.id != owner_id => {
            debug!(user_id = u.id, owner_id, "ownership check denied");
            Decision::Deny(DenyReason::Forbidden)
        }
        Identity::User(_) => Decision::Allow,
    }
}

/// The logged-in user, or `Unauthenticated`.
pub fn require_user(identity: &Identity) -> Result<&User, AuthError> {
    identity.user().ok_or(AuthError::Unauthenticated)
}
