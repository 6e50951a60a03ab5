//! ProManage Backend Library
//!
//! Project management API with JWT authentication and owner/admin access
//! control over in-memory stores.

pub mod api;
pub mod auth;
pub mod middleware;
pub mod models;
pub mod projects;

pub use api::{create_router, AppState};
pub use models::Config;
