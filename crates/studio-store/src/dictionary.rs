use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use studio_domain::dictionary::DictionaryEntry;
use studio_error::StudioError;

use crate::pg_error::{internal, is_unique_violation};

/// Persistence contract for project-scoped [`DictionaryEntry`] rows
/// (spec.md §3 `DictionaryEntry`, supplementing the distilled spec's C2/C3
/// project surface).
#[async_trait]
pub trait DictionaryStore: Send + Sync {
    /// All entries of a project, ordered by term.
    async fn list_by_project(&self, project_id: i64) -> Result<Vec<DictionaryEntry>, StudioError>;
    /// Fetch an entry by id, or `None` if it doesn't exist.
    async fn get_optional(&self, id: i64) -> Result<Option<DictionaryEntry>, StudioError>;
    /// Fetch an entry by id, failing with `NotFound` if absent.
    async fn get(&self, id: i64) -> Result<DictionaryEntry, StudioError> {
        self.get_optional(id)
            .await?
            .ok_or_else(|| StudioError::not_found(format!("dictionary entry {id} not found")))
    }
    /// Create a new entry. Fails with `Conflict` if the term already exists
    /// in the project.
    async fn create(
        &self,
        project_id: i64,
        term: String,
        definition: String,
    ) -> Result<DictionaryEntry, StudioError>;
    /// Update an entry's term and/or definition. Fails with `Conflict` on a
    /// duplicate term within the project.
    async fn update(
        &self,
        id: i64,
        term: Option<String>,
        definition: Option<String>,
    ) -> Result<DictionaryEntry, StudioError>;
    /// Delete a single entry.
    async fn delete(&self, id: i64) -> Result<(), StudioError>;
    /// Bulk-delete every entry belonging to a project.
    async fn delete_by_project(&self, project_id: i64) -> Result<(), StudioError>;
}

/// Postgres-backed [`DictionaryStore`].
pub struct PgDictionaryStore {
    pool: PgPool,
}

impl PgDictionaryStore {
    /// Build a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct DictionaryRow {
    id: i64,
    project_id: i64,
    term: String,
    definition: String,
    created_at: DateTime<Utc>,
}

impl From<DictionaryRow> for DictionaryEntry {
    fn from(row: DictionaryRow) -> Self {
        DictionaryEntry {
            id: row.id,
            project_id: row.project_id,
            term: row.term,
            definition: row.definition,
            created_at: row.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, project_id, term, definition, created_at";

fn conflict(term: &str) -> StudioError {
    StudioError::conflict(format!("a dictionary entry for {term:?} already exists"))
        .with_code("DICTIONARY_TERM_CONFLICT")
}

#[async_trait]
impl DictionaryStore for PgDictionaryStore {
    async fn list_by_project(&self, project_id: i64) -> Result<Vec<DictionaryEntry>, StudioError> {
        let sql =
            format!("SELECT {SELECT_COLUMNS} FROM dictionary WHERE project_id = $1 ORDER BY term");
        sqlx::query_as::<_, DictionaryRow>(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(DictionaryEntry::from).collect())
            .map_err(|e| internal("failed to list dictionary entries", e))
    }

    async fn get_optional(&self, id: i64) -> Result<Option<DictionaryEntry>, StudioError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM dictionary WHERE id = $1");
        sqlx::query_as::<_, DictionaryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(DictionaryEntry::from))
            .map_err(|e| internal("failed to fetch dictionary entry", e))
    }

    async fn create(
        &self,
        project_id: i64,
        term: String,
        definition: String,
    ) -> Result<DictionaryEntry, StudioError> {
        let sql = format!(
            "INSERT INTO dictionary (project_id, term, definition) \
             VALUES ($1, $2, $3) \
             RETURNING {SELECT_COLUMNS}"
        );
        sqlx::query_as::<_, DictionaryRow>(&sql)
            .bind(project_id)
            .bind(&term)
            .bind(&definition)
            .fetch_one(&self.pool)
            .await
            .map(DictionaryEntry::from)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    conflict(&term)
                } else {
                    internal("failed to create dictionary entry", e)
                }
            })
    }

    async fn update(
        &self,
        id: i64,
        term: Option<String>,
        definition: Option<String>,
    ) -> Result<DictionaryEntry, StudioError> {
        let current = self.get(id).await?;
        let term = term.unwrap_or(current.term);
        let definition = definition.unwrap_or(current.definition);

        let sql = format!(
            "UPDATE dictionary SET term = $2, definition = $3 WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        );
        sqlx::query_as::<_, DictionaryRow>(&sql)
            .bind(id)
            .bind(&term)
            .bind(&definition)
            .fetch_one(&self.pool)
            .await
            .map(DictionaryEntry::from)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    conflict(&term)
                } else {
                    internal("failed to update dictionary entry", e)
                }
            })
    }

    async fn delete(&self, id: i64) -> Result<(), StudioError> {
        sqlx::query("DELETE FROM dictionary WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| internal("failed to delete dictionary entry", e))?;
        Ok(())
    }

    async fn delete_by_project(&self, project_id: i64) -> Result<(), StudioError> {
        sqlx::query("DELETE FROM dictionary WHERE project_id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map_err(|e| internal("failed to delete project dictionary entries", e))?;
        Ok(())
    }
}
