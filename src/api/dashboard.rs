//! Dashboard statistics over the caller's visible projects

use crate::auth::{models::User, CurrentUser};
use crate::projects::{api::visible_projects, Project, ProjectState, ProjectStatus, ProjectStore};
use axum::{extract::State, Extension, Json};
use serde::Serialize;

const RECENT_LIMIT: usize = 5;

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct StatusCount {
    pub active: usize,
    pub completed: usize,
    pub paused: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_projects: usize,
    pub total_budget: f64,
    pub status_count: StatusCount,
    pub recent_projects: Vec<Project>,
}

/// Aggregate totals for the projects `user` can see
pub fn compute_stats(store: &dyn ProjectStore, user: &User) -> DashboardStats {
    let projects = visible_projects(store, user);

    let mut status_count = StatusCount::default();
    for project in &projects {
        match project.status {
            ProjectStatus::Active => status_count.active += 1,
            ProjectStatus::Completed => status_count.completed += 1,
            ProjectStatus::Paused => status_count.paused += 1,
        }
    }

    let total_budget: f64 = projects.iter().map(|p| p.budget).sum();
    let total_projects = projects.len();
    let recent_projects = projects[total_projects.saturating_sub(RECENT_LIMIT)..].to_vec();

    DashboardStats {
        total_projects,
        total_budget,
        status_count,
        recent_projects,
    }
}

/// Dashboard stats - GET /dashboard/stats
pub async fn get_dashboard_stats(
    State(state): State<ProjectState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<DashboardStats> {
    Json(compute_stats(state.store.as_ref(), &user))
}
