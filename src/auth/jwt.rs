//! JWT Token Handler
//! Mission: Issue and verify signed, time-bounded bearer tokens
//!
//! Tokens are stateless. Nothing is stored server-side, so a token stays
//! valid until `exp` passes or the process signing key changes. There is no
//! revocation path.

use crate::auth::{errors::AuthError, models::Claims};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;
use uuid::Uuid;

/// Default validity window for issued tokens.
pub const DEFAULT_EXPIRATION_HOURS: i64 = 24;

/// Longest accepted validity window (ten years).
pub const MAX_EXPIRATION_HOURS: i64 = 24 * 366 * 10;

/// JWT Handler for token operations
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    expiration_hours: i64,
}

impl JwtHandler {
    /// Create a new JWT handler with an HS256 secret key
    pub fn new(secret: &[u8]) -> Self {
        Self::with_settings(secret, Algorithm::HS256, DEFAULT_EXPIRATION_HOURS)
    }

    /// Create a handler with an explicit HMAC algorithm and validity window
    pub fn with_settings(secret: &[u8], algorithm: Algorithm, expiration_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            expiration_hours,
        }
    }

    /// Issue a token for `subject`, returning it with its lifetime in seconds
    pub fn issue(&self, subject: Uuid) -> Result<(String, i64)> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if it were minted at `issued_at`
    pub fn issue_at(&self, subject: Uuid, issued_at: DateTime<Utc>) -> Result<(String, i64)> {
        let window = validity_window(self.expiration_hours).with_context(|| {
            format!("Token lifetime out of range: {}h", self.expiration_hours)
        })?;
        let expiration = issued_at
            .checked_add_signed(window)
            .context("Invalid timestamp")?;

        let claims = Claims {
            sub: subject.to_string(),
            exp: expiration.timestamp(),
            iat: issued_at.timestamp(),
        };

        debug!(
            "Generating JWT for user {}, expires in {}h",
            subject, self.expiration_hours
        );

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .context("Failed to generate JWT")?;

        Ok((token, window.num_seconds()))
    }

    /// Verify a token and return the subject it names.
    ///
    /// Every decode failure is `InvalidToken`: bad signature, wrong
    /// algorithm, malformed payload, missing `sub`/`exp`, a past `exp`, or
    /// a subject that is not a user id.
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let decoded = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!("Rejected JWT: {}", e);
            AuthError::InvalidToken
        })?;

        let subject = Uuid::parse_str(&decoded.claims.sub).map_err(|_| {
            debug!("Rejected JWT: subject is not a user id");
            AuthError::InvalidToken
        })?;

        debug!("Validated JWT for user {}", subject);

        Ok(subject)
    }
}

/// Token lifetime for `hours`, or `None` outside `1..=MAX_EXPIRATION_HOURS`
pub fn validity_window(hours: i64) -> Option<Duration> {
    if !(1..=MAX_EXPIRATION_HOURS).contains(&hours) {
        return None;
    }
    Duration::try_hours(hours)
}

/// Parse an HMAC algorithm name from configuration.
pub fn parse_hmac_algorithm(name: &str) -> Option<Algorithm> {
    match name.trim().to_uppercase().as_str() {
        "HS256" => Some(Algorithm::HS256),
        "HS384" => Some(Algorithm::HS384),
        "HS512" => Some(Algorithm::HS512),
        _ => None,
    }
}
