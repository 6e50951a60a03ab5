//! Authentication Errors
//! Mission: One taxonomy for credential, token and permission failures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures raised by the credential store, token service and guard.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username already exists")]
    DuplicateUsername,

    #[error("password exceeds the bcrypt input limit")]
    PasswordTooLong,

    /// Unknown user and wrong password both map here.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("missing authorization token")]
    MissingToken,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("token subject no longer exists")]
    UnknownSubject,

    #[error("insufficient permissions")]
    Forbidden,

    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::DuplicateUsername | AuthError::PasswordTooLong => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::UnknownSubject => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Hashing(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AuthError::Hashing(_) | AuthError::Internal(_) => {
                error!("Auth internal failure: {}", self);
                "Internal server error".to_string()
            }
            AuthError::DuplicateUsername => "Username already exists".to_string(),
            AuthError::PasswordTooLong => "Password must be at most 72 bytes".to_string(),
            AuthError::InvalidCredentials => "Invalid username or password".to_string(),
            AuthError::MissingToken => "Missing authorization token".to_string(),
            AuthError::InvalidToken => "Invalid or expired token".to_string(),
            AuthError::UnknownSubject => "User not found".to_string(),
            AuthError::Forbidden => "Insufficient permissions".to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
