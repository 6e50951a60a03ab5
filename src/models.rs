use anyhow::{bail, Context};
use jsonwebtoken::Algorithm;
use rand::Rng;
use std::env;
use tracing::warn;

use crate::auth::jwt::{
    parse_hmac_algorithm, validity_window, DEFAULT_EXPIRATION_HOURS, MAX_EXPIRATION_HOURS,
};

/// Where the token signing key came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    Environment,
    Generated,
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: Vec<u8>,
    pub jwt_secret_source: SecretSource,
    pub jwt_algorithm: Algorithm,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
    pub seed_demo_users: bool,
    pub cors_origins: Vec<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_secret_source", &self.jwt_secret_source)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("seed_demo_users", &self.seed_demo_users)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = match lookup("PORT") {
            Some(v) => v.parse().with_context(|| format!("Invalid PORT: {}", v))?,
            None => 8000,
        };

        let (jwt_secret, jwt_secret_source) = match lookup("JWT_SECRET") {
            Some(secret) if !secret.trim().is_empty() => {
                (secret.into_bytes(), SecretSource::Environment)
            }
            _ => {
                warn!("⚠️  JWT_SECRET not set - generated a per-process key, tokens will not survive restarts");
                let key: [u8; 32] = rand::thread_rng().gen();
                (key.to_vec(), SecretSource::Generated)
            }
        };

        let jwt_algorithm = match lookup("JWT_ALGORITHM") {
            Some(name) => parse_hmac_algorithm(&name)
                .with_context(|| format!("Unsupported JWT_ALGORITHM: {} (use HS256, HS384 or HS512)", name))?,
            None => Algorithm::HS256,
        };

        let jwt_expiration_hours = match lookup("JWT_EXPIRATION_HOURS") {
            Some(v) => v
                .parse::<i64>()
                .ok()
                .filter(|&h| validity_window(h).is_some())
                .with_context(|| {
                    format!(
                        "Invalid JWT_EXPIRATION_HOURS: {} (must be 1..={})",
                        v, MAX_EXPIRATION_HOURS
                    )
                })?,
            None => DEFAULT_EXPIRATION_HOURS,
        };

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("Invalid BCRYPT_COST: {}", v))?,
            None => bcrypt::DEFAULT_COST,
        };
        if !(4..=31).contains(&bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31, got {}", bcrypt_cost);
        }

        let seed_demo_users = lookup("SEED_DEMO_USERS")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
            .unwrap_or(true);

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            jwt_secret,
            jwt_secret_source,
            jwt_algorithm,
            jwt_expiration_hours,
            bcrypt_cost,
            seed_demo_users,
            cors_origins,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
