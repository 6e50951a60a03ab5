//! Authentication Middleware
//! Mission: Protect API endpoints with bearer token resolution

use crate::auth::{errors::AuthError, guard::AuthGuard, models::User};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

/// Identity resolved by `auth_middleware`, available as `Extension<CurrentUser>`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Auth middleware that resolves `Authorization: Bearer <token>` to a user
pub async fn auth_middleware(
    State(guard): State<AuthGuard>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::MissingToken)?;

    let user = guard.resolve_identity(bearer.token())?;

    // Handlers downstream read the identity from request extensions
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
