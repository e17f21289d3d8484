use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::limits::{within, DICTIONARY_TERM_MAX};
use studio_error::StudioError;

/// A project-scoped term/definition pair (spec.md §3 `DictionaryEntry`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Entry id.
    pub id: i64,
    /// Owning project id.
    pub project_id: i64,
    /// Term, unique within the project.
    pub term: String,
    /// Definition; must be non-empty.
    pub definition: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validate a dictionary term against [`DICTIONARY_TERM_MAX`].
pub fn validate_term(term: &str) -> Result<(), StudioError> {
    if term.is_empty() {
        return Err(StudioError::validation(
            "dictionary term must not be empty",
        ));
    }
    if !within(term, DICTIONARY_TERM_MAX) {
        return Err(StudioError::validation(format!(
            "dictionary term exceeds {DICTIONARY_TERM_MAX} characters"
        )));
    }
    Ok(())
}

/// Validate a dictionary definition: non-empty (spec.md §3).
pub fn validate_definition(definition: &str) -> Result<(), StudioError> {
    if definition.is_empty() {
        return Err(StudioError::validation(
            "dictionary definition must not be empty",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_term_rejected() {
        assert!(validate_term("").is_err());
    }

    #[test]
    fn term_at_255_accepted() {
        assert!(validate_term(&"a".repeat(255)).is_ok());
    }

    #[test]
    fn term_at_256_rejected() {
        assert!(validate_term(&"a".repeat(256)).is_err());
    }

    #[test]
    fn empty_definition_rejected() {
        assert!(validate_definition("").is_err());
    }

    #[test]
    fn non_empty_definition_accepted() {
        assert!(validate_definition("a widget is a thing").is_ok());
    }
}
