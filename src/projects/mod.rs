//! Projects Module
//! Mission: Owned project records and their CRUD endpoints

pub mod api;
pub mod models;
pub mod store;

pub use api::ProjectState;
pub use models::{Project, ProjectCreate, ProjectStatus, ProjectUpdate};
pub use store::{MemoryProjectStore, ProjectError, ProjectStore};
