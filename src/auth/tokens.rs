use std::fmt;

use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

/// Random bytes behind every token plaintext (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Closed set of token scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Auth,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Auth => "authentication",
        }
    }
}

/// SHA-256 of a token plaintext. The only token form that is ever persisted.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenHash([u8; 32]);

impl TokenHash {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenHash({})", hex::encode(&self.0[..4]))
    }
}

/// Generate a fresh plaintext token and its lookup hash.
pub fn generate() -> (String, TokenHash) {
    let mut raw = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut raw);
    let plaintext = hex::encode(raw);
    let hash = hash_for_lookup(&plaintext);
    (plaintext, hash)
}

/// Deterministic digest used to find a presented token in the store.
///
/// Tokens already carry 256 bits of entropy, so a fast hash is enough here.
pub fn hash_for_lookup(plaintext: &str) -> TokenHash {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    TokenHash(hasher.finalize().into())
}

/// A token that has just been minted. The plaintext lives only here and in
/// the response sent back to whoever logged in.
#[derive(Clone, Serialize)]
pub struct NewToken {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub hash: TokenHash,
    #[serde(skip)]
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub expiry: OffsetDateTime,
    #[serde(skip)]
    pub scope: Scope,
}

impl NewToken {
    /// `None` when `now + ttl` falls outside the representable date range.
    pub fn issue(user_id: i64, ttl: Duration, scope: Scope) -> Option<Self> {
        let expiry = OffsetDateTime::now_utc().checked_add(ttl)?;
        let (plaintext, hash) = generate();
        Some(Self {
            plaintext,
            hash,
            user_id,
            expiry,
            scope,
        })
    }
}

impl fmt::Debug for NewToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewToken")
            .field("plaintext", &"<redacted>")
            .field("hash", &self.hash)
            .field("user_id", &self.user_id)
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish()
    }
}
