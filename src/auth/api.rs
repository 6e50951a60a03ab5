//! Authentication API Endpoints
//! Mission: Provide login, registration and identity endpoints

use crate::auth::{
    errors::AuthError,
    guard::AuthGuard,
    jwt::JwtHandler,
    middleware::CurrentUser,
    models::{LoginRequest, LoginResponse, RegisterRequest, UserResponse, UserSummary},
    user_store::UserStore,
};
use axum::{extract::State, Extension, Json};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<dyn UserStore>,
    pub jwt_handler: Arc<JwtHandler>,
    pub guard: AuthGuard,
}

impl AuthState {
    pub fn new(user_store: Arc<dyn UserStore>, jwt_handler: Arc<JwtHandler>) -> Self {
        let guard = AuthGuard::new(user_store.clone(), jwt_handler.clone());
        Self {
            user_store,
            jwt_handler,
            guard,
        }
    }
}

/// Login endpoint - POST /auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    info!("🔐 Login attempt: {}", payload.username);

    // bcrypt is CPU-bound; keep it off the async workers
    let store = state.user_store.clone();
    let username = payload.username.clone();
    let user = tokio::task::spawn_blocking(move || {
        store.verify_credentials(&payload.username, &payload.password)
    })
    .await
    .map_err(|e| AuthError::Internal(e.into()))?
    .map_err(|e| {
        if matches!(e, AuthError::InvalidCredentials) {
            warn!("❌ Failed login attempt: {}", username);
        }
        e
    })?;

    let (access_token, expires_in) = state.jwt_handler.issue(user.id)?;

    info!(
        "✅ Login successful: {} ({})",
        user.username,
        user.role.as_str()
    );

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer",
        expires_in,
        user: UserSummary::from_user(&user),
    }))
}

/// Registration endpoint - POST /auth/register
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    let store = state.user_store.clone();
    let user = tokio::task::spawn_blocking(move || store.create_user(payload.into()))
        .await
        .map_err(|e| AuthError::Internal(e.into()))?
        .map_err(|e| {
            if matches!(e, AuthError::DuplicateUsername) {
                warn!("Registration rejected: username taken");
            }
            e
        })?;

    info!(
        "✅ User registered: {} ({})",
        user.username,
        user.role.as_str()
    );

    Ok(Json(UserResponse::from_user(&user)))
}

/// Get current user info - GET /auth/me
pub async fn get_current_user(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<UserResponse> {
    Json(UserResponse::from_user(&user))
}
