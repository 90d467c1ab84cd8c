use std::fmt;

use argon2::{
    password_hash::{self, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

lazy_static! {
    /// Hashed with the same parameters as real credentials, so checking a
    /// password against it costs one full argon2 run.
    static ref DUMMY_HASH: PasswordHash = {
        let mut hash = PasswordHash::default();
        if let Err(e) = hash.set("liftlog-placeholder-credential") {
            error!(error = %e, "dummy hash setup failed");
        }
        hash
    };
}

#[derive(Debug, Error)]
pub enum HashingError {
    #[error("argon2 hash error: {0}")]
    Hash(String),
    #[error("stored password hash is malformed: {0}")]
    Malformed(String),
    #[error("password hash was never set")]
    NotSet,
}

/// Stored password credential.
///
/// Holds the PHC string produced by argon2 (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`),
/// never the plaintext. The algorithm, version and params travel with the
/// string, so hashes created under older settings still verify.
#[derive(Clone, Default)]
pub struct PasswordHash {
    hash: Option<String>,
}

impl PasswordHash {
    pub fn from_stored(hash: String) -> Self {
        Self { hash: Some(hash) }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn set(&mut self, plain: &str) -> Result<(), HashingError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                HashingError::Hash(e.to_string())
            })?
            .to_string();
        self.hash = Some(hash);
        Ok(())
    }

    /// `Ok(false)` on a plain mismatch, `Err` only when the stored hash
    /// cannot be used at all.
    pub fn matches(&self, plain: &str) -> Result<bool, HashingError> {
        let stored = self.hash.as_deref().ok_or(HashingError::NotSet)?;
        let parsed = password_hash::PasswordHash::new(stored).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            HashingError::Malformed(e.to_string())
        })?;
        match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify_password error");
                Err(HashingError::Malformed(e.to_string()))
            }
        }
    }
}

/// Burn one argon2 verification for a login whose username does not exist,
/// so it takes as long as a wrong password for a real user.
pub fn verify_dummy(plain: &str) {
    let _ = DUMMY_HASH.matches(plain);
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.hash.is_some() { "<redacted>" } else { "<unset>" };
        f.debug_struct("PasswordHash").field("hash", &state).finish()
    }
}
