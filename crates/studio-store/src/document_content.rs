use async_trait::async_trait;
use sqlx::PgPool;
use studio_domain::document::DocumentContent;
use studio_error::StudioError;
use studio_json_patch::PatchOp;

use crate::pg_error::internal;

/// Persistence contract for [`DocumentContent`] (spec.md §4.3, C5).
///
/// [`patch`](DocumentContentStore::patch) is the only mutation most callers
/// use: it loads the current content, applies the patch with
/// [`studio_json_patch::apply`], and writes the result back inside a
/// single transaction, so a concurrent patch against the same document either
/// serialises behind a row lock or observes the pre-patch value — never a
/// half-applied one.
#[async_trait]
pub trait DocumentContentStore: Send + Sync {
    /// Fetch a document's content, defaulting to `{}` if no row exists yet
    /// (spec.md §4.3 `get`).
    async fn get(&self, document_id: i64) -> Result<DocumentContent, StudioError>;
    /// Overwrite a document's content wholesale (spec.md §4.3 `set`).
    async fn set(&self, document_id: i64, content: DocumentContent) -> Result<(), StudioError>;
    /// Apply a JSON Patch to a document's content atomically, returning the
    /// resulting content (spec.md §4.3 `patch`).
    async fn patch(
        &self,
        document_id: i64,
        ops: &[PatchOp],
    ) -> Result<DocumentContent, StudioError>;
}

/// Postgres-backed [`DocumentContentStore`].
pub struct PgDocumentContentStore {
    pool: PgPool,
}

impl PgDocumentContentStore {
    /// Build a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentContentStore for PgDocumentContentStore {
    async fn get(&self, document_id: i64) -> Result<DocumentContent, StudioError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT content FROM document_content WHERE document_id = $1")
                .bind(document_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| internal("failed to fetch document content", e))?;
        match row {
            Some((value,)) => DocumentContent::from_value(value),
            None => Ok(DocumentContent::empty()),
        }
    }

    async fn set(&self, document_id: i64, content: DocumentContent) -> Result<(), StudioError> {
        sqlx::query(
            "INSERT INTO document_content (document_id, content, updated_at) \
             VALUES ($1, $2, now()) \
             ON CONFLICT (document_id) DO UPDATE \
                 SET content = EXCLUDED.content, updated_at = now()",
        )
        .bind(document_id)
        .bind(content.into_value())
        .execute(&self.pool)
        .await
        .map_err(|e| internal("failed to set document content", e))?;
        Ok(())
    }

    async fn patch(
        &self,
        document_id: i64,
        ops: &[PatchOp],
    ) -> Result<DocumentContent, StudioError> {
        let mut tx = studio_db::begin(&self.pool).await?;

        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            "SELECT content FROM document_content WHERE document_id = $1 FOR UPDATE",
        )
        .bind(document_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| internal("failed to lock document content", e))?;
        let current = match row {
            Some((value,)) => value,
            None => DocumentContent::empty().into_value(),
        };

        let patched = studio_json_patch::apply(&current, ops)?;
        let content = DocumentContent::from_value(patched)?;

        sqlx::query(
            "INSERT INTO document_content (document_id, content, updated_at) \
             VALUES ($1, $2, now()) \
             ON CONFLICT (document_id) DO UPDATE \
                 SET content = EXCLUDED.content, updated_at = now()",
        )
        .bind(document_id)
        .bind(content.as_value())
        .execute(&mut *tx)
        .await
        .map_err(|e| internal("failed to write patched document content", e))?;

        tx.commit()
            .await
            .map_err(|e| internal("failed to commit document patch", e))?;
        Ok(content)
    }
}
