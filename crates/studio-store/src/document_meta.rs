use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use studio_domain::document::FunctionDocument;
use studio_domain::identity::Identity;
use studio_error::StudioError;
use uuid::Uuid;

use crate::pg_error::internal;

/// Persistence contract for [`FunctionDocument`] metadata (spec.md §3, C4).
///
/// A document's content lives separately in
/// [`crate::document_content::DocumentContentStore`]; [`create`](DocumentMetaStore::create)
/// initialises both rows in one transaction so a function node never ends up
/// pointing at metadata with no content row.
#[async_trait]
pub trait DocumentMetaStore: Send + Sync {
    /// Create document metadata for a function node, with empty content
    /// (spec.md §4.2 `create_function` step 2).
    async fn create(
        &self,
        function_node_id: Uuid,
        creator: Identity,
    ) -> Result<FunctionDocument, StudioError>;
    /// Fetch by document id, or `None` if it doesn't exist.
    async fn get_optional(&self, id: i64) -> Result<Option<FunctionDocument>, StudioError>;
    /// Fetch by document id, failing with `NotFound` if absent.
    async fn get(&self, id: i64) -> Result<FunctionDocument, StudioError> {
        self.get_optional(id)
            .await?
            .ok_or_else(|| StudioError::not_found(format!("document {id} not found")))
    }
    /// Fetch the document owned by a function node, if one has been created.
    async fn get_by_function_node(
        &self,
        function_node_id: Uuid,
    ) -> Result<Option<FunctionDocument>, StudioError>;
    /// Record a new editor and bump `edited_at`, called whenever the
    /// document's content changes (spec.md §4.3 `patch`/`set`).
    async fn touch(&self, id: i64, editor: Identity) -> Result<(), StudioError>;
    /// Delete a document's metadata row. Cascades to its content row.
    async fn delete(&self, id: i64) -> Result<(), StudioError>;
}

/// Postgres-backed [`DocumentMetaStore`].
pub struct PgDocumentMetaStore {
    pool: PgPool,
}

impl PgDocumentMetaStore {
    /// Build a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: i64,
    function_node_id: Uuid,
    creator_user_id: String,
    creator_name: String,
    editor_user_id: String,
    editor_name: String,
    created_at: DateTime<Utc>,
    edited_at: DateTime<Utc>,
}

impl From<DocumentRow> for FunctionDocument {
    fn from(row: DocumentRow) -> Self {
        FunctionDocument {
            id: row.id,
            function_node_id: row.function_node_id,
            creator: Identity::new(row.creator_user_id, row.creator_name),
            editor: Identity::new(row.editor_user_id, row.editor_name),
            created_at: row.created_at,
            edited_at: row.edited_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, function_node_id, creator_user_id, creator_name, \
     editor_user_id, editor_name, created_at, edited_at";

#[async_trait]
impl DocumentMetaStore for PgDocumentMetaStore {
    async fn create(
        &self,
        function_node_id: Uuid,
        creator: Identity,
    ) -> Result<FunctionDocument, StudioError> {
        let mut tx = studio_db::begin(&self.pool).await?;

        let sql = format!(
            "INSERT INTO function_document \
                 (function_node_id, creator_user_id, creator_name, editor_user_id, editor_name) \
             VALUES ($1, $2, $3, $2, $3) \
             RETURNING {SELECT_COLUMNS}"
        );
        let row: DocumentRow = sqlx::query_as(&sql)
            .bind(function_node_id)
            .bind(&creator.user_id)
            .bind(&creator.user_name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| internal("failed to create document metadata", e))?;

        sqlx::query("INSERT INTO document_content (document_id, content) VALUES ($1, '{}'::jsonb)")
            .bind(row.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| internal("failed to initialise document content", e))?;

        tx.commit()
            .await
            .map_err(|e| internal("failed to commit document creation", e))?;
        Ok(FunctionDocument::from(row))
    }

    async fn get_optional(&self, id: i64) -> Result<Option<FunctionDocument>, StudioError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM function_document WHERE id = $1");
        sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(FunctionDocument::from))
            .map_err(|e| internal("failed to fetch document metadata", e))
    }

    async fn get_by_function_node(
        &self,
        function_node_id: Uuid,
    ) -> Result<Option<FunctionDocument>, StudioError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM function_document WHERE function_node_id = $1"
        );
        sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(function_node_id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(FunctionDocument::from))
            .map_err(|e| internal("failed to fetch document metadata by node", e))
    }

    async fn touch(&self, id: i64, editor: Identity) -> Result<(), StudioError> {
        sqlx::query(
            "UPDATE function_document \
             SET editor_user_id = $2, editor_name = $3, edited_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&editor.user_id)
        .bind(&editor.user_name)
        .execute(&self.pool)
        .await
        .map_err(|e| internal("failed to record document edit", e))?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StudioError> {
        sqlx::query("DELETE FROM function_document WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| internal("failed to delete document metadata", e))?;
        Ok(())
    }
}
