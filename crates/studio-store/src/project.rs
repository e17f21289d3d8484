use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use studio_domain::Identity;
use studio_domain::Project;
use studio_error::StudioError;

use crate::pg_error::{internal, is_unique_violation};

/// Fields supplied by the caller when creating a project.
#[derive(Debug, Clone)]
pub struct NewProject {
    /// Display name, unique across the system.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Creator identity.
    pub creator: Identity,
}

/// Fields a caller may change on an existing project.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    /// New display name, if changing.
    pub name: Option<String>,
    /// New description, if changing. `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// Editor identity recording who made the change.
    pub editor: Identity,
}

/// Persistence contract for [`Project`] (spec.md §4.5, C2).
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// All projects, optionally filtered by creator, ordered by
    /// `edited_at` descending.
    async fn list(&self, creator_id: Option<&str>) -> Result<Vec<Project>, StudioError>;
    /// Fetch a project by id, or `None` if it doesn't exist.
    async fn get_optional(&self, id: i64) -> Result<Option<Project>, StudioError>;
    /// Fetch a project by id, failing with `NotFound` if absent.
    async fn get(&self, id: i64) -> Result<Project, StudioError> {
        self.get_optional(id)
            .await?
            .ok_or_else(|| StudioError::not_found(format!("project {id} not found")))
    }
    /// Create a new project. Fails with `Conflict` on a duplicate name.
    async fn create(&self, new_project: NewProject) -> Result<Project, StudioError>;
    /// Update name/description/editor. Fails with `Conflict` if the new name
    /// collides with another project's name.
    async fn update(&self, id: i64, update: UpdateProject) -> Result<Project, StudioError>;
    /// Delete a single project row. Callers are responsible for cascading to
    /// owned nodes, documents, and dictionary entries first
    /// (spec.md §4.5 `delete`).
    async fn delete(&self, id: i64) -> Result<(), StudioError>;
    /// Delete a project and everything it owns — its function nodes'
    /// `FunctionDocument`s, all nodes, all dictionary entries, and the
    /// project row itself — inside a single transaction, so a failure
    /// partway through never leaves a half-deleted project (spec.md §4.5
    /// `delete`: "within one logical unit; failures must not leave
    /// half-deleted projects"). Fails with `NotFound` if the project
    /// doesn't exist.
    async fn delete_cascade(&self, id: i64) -> Result<(), StudioError>;
}

/// Postgres-backed [`ProjectStore`].
pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    /// Build a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: i64,
    name: String,
    description: Option<String>,
    creator_user_id: String,
    creator_name: String,
    editor_user_id: String,
    editor_name: String,
    created_at: DateTime<Utc>,
    edited_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            name: row.name,
            description: row.description,
            creator: Identity::new(row.creator_user_id, row.creator_name),
            editor: Identity::new(row.editor_user_id, row.editor_name),
            created_at: row.created_at,
            edited_at: row.edited_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, name, description, creator_user_id, creator_name, \
     editor_user_id, editor_name, created_at, edited_at";

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn list(&self, creator_id: Option<&str>) -> Result<Vec<Project>, StudioError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM project \
             WHERE ($1::text IS NULL OR creator_user_id = $1) \
             ORDER BY edited_at DESC"
        );
        sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(creator_id)
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(Project::from).collect())
            .map_err(|e| internal("failed to list projects", e))
    }

    async fn get_optional(&self, id: i64) -> Result<Option<Project>, StudioError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM project WHERE id = $1");
        sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(Project::from))
            .map_err(|e| internal("failed to fetch project", e))
    }

    async fn create(&self, new_project: NewProject) -> Result<Project, StudioError> {
        let sql = format!(
            "INSERT INTO project \
                 (name, description, creator_user_id, creator_name, editor_user_id, editor_name) \
             VALUES ($1, $2, $3, $4, $3, $4) \
             RETURNING {SELECT_COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(&new_project.name)
            .bind(&new_project.description)
            .bind(&new_project.creator.user_id)
            .bind(&new_project.creator.user_name)
            .fetch_one(&self.pool)
            .await
            .map(Project::from)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StudioError::conflict(format!(
                        "a project named {:?} already exists",
                        new_project.name
                    ))
                    .with_code("PROJECT_NAME_CONFLICT")
                } else {
                    internal("failed to create project", e)
                }
            })
    }

    async fn update(&self, id: i64, update: UpdateProject) -> Result<Project, StudioError> {
        let current = self.get(id).await?;
        let name = update.name.unwrap_or(current.name);
        let description = update.description.unwrap_or(current.description);

        let sql = format!(
            "UPDATE project \
             SET name = $2, description = $3, editor_user_id = $4, editor_name = $5, \
                 edited_at = now() \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        );
        sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .bind(&name)
            .bind(&description)
            .bind(&update.editor.user_id)
            .bind(&update.editor.user_name)
            .fetch_one(&self.pool)
            .await
            .map(Project::from)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StudioError::conflict("a project with that name already exists")
                        .with_code("PROJECT_NAME_CONFLICT")
                } else {
                    internal("failed to update project", e)
                }
            })
    }

    async fn delete(&self, id: i64) -> Result<(), StudioError> {
        sqlx::query("DELETE FROM project WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| internal("failed to delete project", e))?;
        Ok(())
    }

    async fn delete_cascade(&self, id: i64) -> Result<(), StudioError> {
        let mut tx = studio_db::begin(&self.pool).await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM project WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| internal("failed to check project existence", e))?;
        if !exists {
            return Err(StudioError::not_found(format!("project {id} not found")));
        }

        // `function_document` rows have no foreign key to `project_node`
        // (spec.md §3's ownership is enforced in the application, not the
        // schema), so they need an explicit delete; `project_node` and
        // `dictionary` rows cascade from the `project` row via `ON DELETE
        // CASCADE`, and `document_content` cascades from the
        // `function_document` delete below.
        sqlx::query(
            "DELETE FROM function_document WHERE function_node_id IN \
                 (SELECT id FROM project_node WHERE project_id = $1 AND document_id IS NOT NULL)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| internal("failed to delete project documents", e))?;

        sqlx::query("DELETE FROM project WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| internal("failed to delete project", e))?;

        tx.commit()
            .await
            .map_err(|e| internal("failed to commit project deletion", e))?;
        Ok(())
    }
}
