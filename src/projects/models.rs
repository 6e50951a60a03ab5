//! Project Models

use crate::auth::Owned;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Paused,
}

/// A project owned by the user that created it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub budget: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: ProjectStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Project {
    fn owner_id(&self) -> Uuid {
        self.created_by
    }
}

/// Create project request body
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectCreate {
    pub name: String,
    pub description: String,
    pub budget: f64,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ProjectStatus,
}

impl ProjectCreate {
    /// Build a new record owned by `owner`
    pub fn into_project(self, owner: Uuid) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            budget: self.budget,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status,
            created_by: owner,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update request body; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub budget: Option<f64>,
    pub start_date: Option<DateTime<Utc>>,
    /// `null` clears the end date, absence keeps it
    #[serde(default, deserialize_with = "explicit_null")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub status: Option<ProjectStatus>,
}

impl ProjectUpdate {
    /// Copy the provided fields onto `project` and bump `updated_at`
    pub fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(budget) = self.budget {
            project.budget = budget;
        }
        if let Some(start_date) = self.start_date {
            project.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            project.end_date = end_date;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        project.updated_at = Utc::now();
    }
}

fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
