//! Project Storage
//! Mission: Keyed project records with atomic read-modify-write

use crate::auth::AuthError;
use crate::projects::models::Project;
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Failures from project storage operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project not found")]
    NotFound,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Check run against the current record while the store lock is held
pub type Precondition<'a> = &'a mut dyn FnMut(&Project) -> Result<(), ProjectError>;

/// Project repository interface
pub trait ProjectStore: Send + Sync {
    fn insert(&self, project: Project) -> Project;

    fn get(&self, id: &Uuid) -> Option<Project>;

    /// All projects, oldest first
    fn list(&self) -> Vec<Project>;

    /// Run `check`, then `apply`, under one exclusive lock
    fn update(
        &self,
        id: &Uuid,
        check: Precondition<'_>,
        apply: &mut dyn FnMut(&mut Project),
    ) -> Result<Project, ProjectError>;

    /// Run `check`, then remove, under one exclusive lock
    fn remove(&self, id: &Uuid, check: Precondition<'_>) -> Result<Project, ProjectError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
struct Projects {
    // Insertion sequence alongside each record keeps listings in creation order
    records: HashMap<Uuid, (u64, Project)>,
    next_seq: u64,
}

/// Project storage backed by an in-process map
#[derive(Default)]
pub struct MemoryProjectStore {
    projects: RwLock<Projects>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for MemoryProjectStore {
    fn insert(&self, project: Project) -> Project {
        let mut projects = self.projects.write();
        let seq = projects.next_seq;
        projects.next_seq += 1;
        projects.records.insert(project.id, (seq, project.clone()));
        drop(projects);

        debug!("Stored project {} ({})", project.id, project.name);
        project
    }

    fn get(&self, id: &Uuid) -> Option<Project> {
        self.projects.read().records.get(id).map(|(_, p)| p.clone())
    }

    fn list(&self) -> Vec<Project> {
        let projects = self.projects.read();
        let mut ordered: Vec<&(u64, Project)> = projects.records.values().collect();
        ordered.sort_by_key(|(seq, _)| *seq);
        ordered.into_iter().map(|(_, p)| p.clone()).collect()
    }

    fn update(
        &self,
        id: &Uuid,
        check: Precondition<'_>,
        apply: &mut dyn FnMut(&mut Project),
    ) -> Result<Project, ProjectError> {
        let mut projects = self.projects.write();
        let (_, project) = projects
            .records
            .get_mut(id)
            .ok_or(ProjectError::NotFound)?;
        check(&*project)?;
        apply(project);
        Ok(project.clone())
    }

    fn remove(&self, id: &Uuid, check: Precondition<'_>) -> Result<Project, ProjectError> {
        let mut projects = self.projects.write();
        let (_, project) = projects.records.get(id).ok_or(ProjectError::NotFound)?;
        check(project)?;
        projects
            .records
            .remove(id)
            .map(|(_, p)| p)
            .ok_or(ProjectError::NotFound)
    }

    fn len(&self) -> usize {
        self.projects.read().records.len()
    }
}
