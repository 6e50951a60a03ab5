//! Authentication Module
//! Mission: Secure API access with JWT tokens and owner/admin access control

pub mod api;
pub mod errors;
pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod user_store;

pub use api::AuthState;
pub use errors::AuthError;
pub use guard::{Action, AuthGuard, Decision, Owned};
pub use jwt::JwtHandler;
pub use middleware::{auth_middleware, CurrentUser};
pub use user_store::{MemoryUserStore, UserStore};
