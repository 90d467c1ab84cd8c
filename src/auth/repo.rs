use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::auth::tokens::{NewToken, Scope, TokenHash};

/// What the store knows about a presented token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct TokenRecord {
    pub user_id: i64,
    pub expiry: OffsetDateTime,
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist hash, owner, scope and expiry. Never the plaintext.
    async fn save(&self, token: &NewToken) -> anyhow::Result<()>;

    /// `None` covers both "never issued" and "already purged". Callers still
    /// have to check `expiry` themselves.
    async fn find_valid(&self, hash: &TokenHash, scope: Scope)
        -> anyhow::Result<Option<TokenRecord>>;

    async fn delete_all_for_user(&self, user_id: i64, scope: Scope) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct PgTokenStore {
    db: PgPool,
}

impl PgTokenStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn save(&self, token: &NewToken) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tokens (hash, user_id, expiry, scope)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(token.hash.as_bytes())
        .bind(token.user_id)
        .bind(token.expiry)
        .bind(token.scope.as_str())
        .execute(&self.db)
        .await
        .context("insert token")?;
        Ok(())
    }

    async fn find_valid(
        &self,
        hash: &TokenHash,
        scope: Scope,
    ) -> anyhow::Result<Option<TokenRecord>> {
        let row = sqlx::query_as::<_, TokenRecord>(
            r#"
            SELECT user_id, expiry
              FROM tokens
             WHERE hash = $1 AND scope = $2 AND expiry > $3
            "#,
        )
        .bind(hash.as_bytes())
        .bind(scope.as_str())
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(&self.db)
        .await
        .context("find token")?;
        Ok(row)
    }

    async fn delete_all_for_user(&self, user_id: i64, scope: Scope) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            DELETE FROM tokens
             WHERE user_id = $1 AND scope = $2
            "#,
        )
        .bind(user_id)
        .bind(scope.as_str())
        .execute(&self.db)
        .await
        .context("delete tokens for user")?;
        Ok(res.rows_affected())
    }
}
