//! Project API Endpoints
//! Mission: CRUD over projects, gated by owner/admin access rules

use crate::auth::{
    guard::{can_view, Action},
    models::User,
    AuthGuard, CurrentUser,
};
use crate::projects::{
    models::{Project, ProjectCreate, ProjectUpdate},
    store::{ProjectError, ProjectStore},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Shared project state
#[derive(Clone)]
pub struct ProjectState {
    pub store: Arc<dyn ProjectStore>,
    pub guard: AuthGuard,
}

/// Projects visible to `user`, oldest first
pub fn visible_projects(store: &dyn ProjectStore, user: &User) -> Vec<Project> {
    store
        .list()
        .into_iter()
        .filter(|p| can_view(user, p))
        .collect()
}

/// List projects - GET /projects
pub async fn list_projects(
    State(state): State<ProjectState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<Vec<Project>> {
    Json(visible_projects(state.store.as_ref(), &user))
}

/// Create project - POST /projects
pub async fn create_project(
    State(state): State<ProjectState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<ProjectCreate>,
) -> Result<Json<Project>, ProjectError> {
    let project = payload.into_project(user.id);
    state.guard.require(&user, Action::Create, &project)?;

    let project = state.store.insert(project);
    info!("📁 Project created: {} by {}", project.name, user.username);

    Ok(Json(project))
}

/// Get project - GET /projects/:id
pub async fn get_project(
    State(state): State<ProjectState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<String>,
) -> Result<Json<Project>, ProjectError> {
    let id = parse_project_id(&project_id)?;
    let project = state.store.get(&id).ok_or(ProjectError::NotFound)?;
    state.guard.require(&user, Action::Read, &project)?;

    Ok(Json(project))
}

/// Update project - PUT /projects/:id
pub async fn update_project(
    State(state): State<ProjectState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<String>,
    Json(payload): Json<ProjectUpdate>,
) -> Result<Json<Project>, ProjectError> {
    let id = parse_project_id(&project_id)?;
    let guard = &state.guard;

    let project = state.store.update(
        &id,
        &mut |current| Ok(guard.require(&user, Action::Update, current)?),
        &mut |current| payload.apply(current),
    )?;

    info!("✏️  Project updated: {} by {}", project.id, user.username);

    Ok(Json(project))
}

/// Delete project - DELETE /projects/:id
pub async fn delete_project(
    State(state): State<ProjectState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, ProjectError> {
    let id = parse_project_id(&project_id)?;
    let guard = &state.guard;

    let removed = state.store.remove(&id, &mut |current| {
        Ok(guard.require(&user, Action::Delete, current)?)
    })?;

    info!("🗑️  Project deleted: {} by {}", removed.id, user.username);

    Ok(Json(json!({ "message": "Project deleted successfully" })))
}

// Ids that are not UUIDs cannot name a stored project
fn parse_project_id(raw: &str) -> Result<Uuid, ProjectError> {
    Uuid::parse_str(raw).map_err(|_| ProjectError::NotFound)
}

impl IntoResponse for ProjectError {
    fn into_response(self) -> Response {
        match self {
            ProjectError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Project not found" })),
            )
                .into_response(),
            ProjectError::Auth(err) => err.into_response(),
        }
    }
}
