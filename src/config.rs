use std::net::SocketAddr;

use anyhow::{ensure, Context};
use serde::Deserialize;

/// One year. Longer-lived login tokens are refused at startup.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub request_timeout_secs: u64,
    pub token: TokenConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = env_or("APP_PORT", 8080);
        let db_max_connections = env_or("DB_MAX_CONNECTIONS", 10);
        let request_timeout_secs = env_or("REQUEST_TIMEOUT_SECS", 30);
        let token = TokenConfig {
            ttl_hours: env_or("TOKEN_TTL_HOURS", 24),
        };
        token.validate()?;
        Ok(Self {
            database_url,
            host,
            port,
            db_max_connections,
            request_timeout_secs,
            token,
        })
    }

    pub fn token_ttl(&self) -> time::Duration {
        time::Duration::hours(self.token.ttl_hours)
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid APP_HOST/APP_PORT {}:{}", self.host, self.port))
    }
}

impl TokenConfig {
    /// A TTL of zero or less would mint tokens that are already expired.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            (1..=MAX_TOKEN_TTL_HOURS).contains(&self.ttl_hours),
            "TOKEN_TTL_HOURS must be between 1 and {MAX_TOKEN_TTL_HOURS}, got {}",
            self.ttl_hours
        );
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
