//! Project service (spec.md §4.5 C2): CRUD plus the cascading delete that
//! tears down a project's nodes, documents, and dictionary entries as one
//! logical unit.

use std::sync::Arc;

use studio_domain::identity::Identity;
use studio_domain::project::{validate_description, validate_name};
use studio_domain::Project;
use studio_error::StudioError;
use studio_store::project::{NewProject, ProjectStore, UpdateProject};

/// Orchestrates [`ProjectStore`] with name/description validation and the
/// cascading delete spelled out in spec.md §4.5.
pub struct ProjectService {
    projects: Arc<dyn ProjectStore>,
}

impl ProjectService {
    /// Build a service over the given store.
    #[must_use]
    pub fn new(projects: Arc<dyn ProjectStore>) -> Self {
        Self { projects }
    }

    /// All projects, optionally filtered by creator, ordered by `edited_at`
    /// descending.
    pub async fn list(&self, creator_id: Option<&str>) -> Result<Vec<Project>, StudioError> {
        self.projects.list(creator_id).await
    }

    /// Fetch a project by id.
    pub async fn get(&self, id: i64) -> Result<Project, StudioError> {
        self.projects.get(id).await
    }

    /// Create a new project. Fails with `Conflict` on a duplicate name.
    pub async fn create(
        &self,
        name: String,
        description: Option<String>,
        creator: Identity,
    ) -> Result<Project, StudioError> {
        validate_name(&name)?;
        validate_description(description.as_deref())?;
        self.projects
            .create(NewProject {
                name,
                description,
                creator,
            })
            .await
    }

    /// Update a project's name and/or description.
    pub async fn update(
        &self,
        id: i64,
        name: Option<String>,
        description: Option<Option<String>>,
        editor: Identity,
    ) -> Result<Project, StudioError> {
        if let Some(name) = &name {
            validate_name(name)?;
        }
        if let Some(Some(description)) = &description {
            validate_description(Some(description))?;
        }
        self.projects
            .update(
                id,
                UpdateProject {
                    name,
                    description,
                    editor,
                },
            )
            .await
    }

    /// Delete a project and everything it owns: function nodes' documents,
    /// all nodes, all dictionary entries, then the project row itself, as
    /// one logical unit via [`ProjectStore::delete_cascade`] (spec.md §4.5
    /// `delete`, steps 1-4).
    pub async fn delete(&self, id: i64) -> Result<(), StudioError> {
        self.projects.delete_cascade(id).await
    }
}
