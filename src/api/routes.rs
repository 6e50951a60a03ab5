use anyhow::Context;
use axum::{
    extract::{FromRef, State},
    http::HeaderValue,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::api::dashboard;
use crate::auth::{
    api as auth_api, auth_middleware, user_store::seed_demo_users, AuthState, JwtHandler,
    MemoryUserStore,
};
use crate::middleware::request_logging;
use crate::models::Config;
use crate::projects::{api as projects_api, MemoryProjectStore, ProjectState, ProjectStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub projects: Arc<dyn ProjectStore>,
}

impl AppState {
    pub fn new(auth: AuthState, projects: Arc<dyn ProjectStore>) -> Self {
        Self { auth, projects }
    }

    /// Build in-memory stores and the token handler from `config`
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let user_store = Arc::new(
            MemoryUserStore::new(config.bcrypt_cost).context("Failed to initialize user store")?,
        );

        if config.seed_demo_users {
            seed_demo_users(user_store.as_ref()).context("Failed to seed demo users")?;
        }

        let jwt_handler = Arc::new(JwtHandler::with_settings(
            &config.jwt_secret,
            config.jwt_algorithm,
            config.jwt_expiration_hours,
        ));

        Ok(Self::new(
            AuthState::new(user_store, jwt_handler),
            Arc::new(MemoryProjectStore::new()),
        ))
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for ProjectState {
    fn from_ref(state: &AppState) -> Self {
        ProjectState {
            store: state.projects.clone(),
            guard: state.auth.guard.clone(),
        }
    }
}

/// Create the API router
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    // Everything here requires a resolved bearer identity
    let protected_routes = Router::<AppState>::new()
        .route("/auth/me", get(auth_api::get_current_user))
        .route(
            "/projects",
            get(projects_api::list_projects).post(projects_api::create_project),
        )
        .route(
            "/projects/:id",
            get(projects_api::get_project)
                .put(projects_api::update_project)
                .delete(projects_api::delete_project),
        )
        .route("/dashboard/stats", get(dashboard::get_dashboard_stats))
        .route_layer(middleware::from_fn_with_state(
            state.auth.guard.clone(),
            auth_middleware,
        ));

    let public_routes = Router::<AppState>::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/auth/login", post(auth_api::login))
        .route("/auth/register", post(auth_api::register));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

// ===== Route Handlers =====

/// API info endpoint
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "ProManage API - Project Management System",
        version: env!("CARGO_PKG_VERSION"),
        health: "/health",
    })
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        users_count: state.auth.user_store.len(),
        projects_count: state.projects.len(),
    })
}

// ===== Request/Response Types =====

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
    version: &'static str,
    health: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
    version: &'static str,
    users_count: usize,
    projects_count: usize,
}
