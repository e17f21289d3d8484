//! Dictionary service (spec.md §3/§6, supplemented per `DESIGN.md` §9):
//! validates terms and definitions before delegating to the store.

use std::sync::Arc;

use studio_domain::dictionary::{validate_definition, validate_term, DictionaryEntry};
use studio_error::StudioError;
use studio_store::DictionaryStore;

/// Wraps [`DictionaryStore`] with the term/definition validation spec.md §3
/// leaves to the caller.
pub struct DictionaryService {
    store: Arc<dyn DictionaryStore>,
}

impl DictionaryService {
    /// Build a service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn DictionaryStore>) -> Self {
        Self { store }
    }

    /// All dictionary entries of a project, ordered by term.
    pub async fn list_by_project(&self, project_id: i64) -> Result<Vec<DictionaryEntry>, StudioError> {
        self.store.list_by_project(project_id).await
    }

    /// Create a new entry. Fails with `Conflict` on a duplicate term within
    /// the project.
    pub async fn create(
        &self,
        project_id: i64,
        term: String,
        definition: String,
    ) -> Result<DictionaryEntry, StudioError> {
        validate_term(&term)?;
        validate_definition(&definition)?;
        self.store.create(project_id, term, definition).await
    }

    /// Update an entry's term and/or definition.
    pub async fn update(
        &self,
        id: i64,
        term: Option<String>,
        definition: Option<String>,
    ) -> Result<DictionaryEntry, StudioError> {
        if let Some(term) = &term {
            validate_term(term)?;
        }
        if let Some(definition) = &definition {
            validate_definition(definition)?;
        }
        self.store.update(id, term, definition).await
    }

    /// Delete a single entry.
    pub async fn delete(&self, id: i64) -> Result<(), StudioError> {
        self.store.delete(id).await
    }
}
