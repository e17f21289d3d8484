use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::limits::{within, PROJECT_DESCRIPTION_MAX, PROJECT_NAME_MAX};
use studio_error::StudioError;

/// A project: the top-level container owning a node tree and dictionary
/// (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project id.
    pub id: i64,
    /// Display name, unique across the system.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Creator identity.
    pub creator: Identity,
    /// Last editor identity.
    pub editor: Identity,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-edited timestamp.
    pub edited_at: DateTime<Utc>,
}

/// Validate a project name against [`PROJECT_NAME_MAX`].
pub fn validate_name(name: &str) -> Result<(), StudioError> {
    if name.is_empty() {
        return Err(StudioError::validation("project name must not be empty"));
    }
    if !within(name, PROJECT_NAME_MAX) {
        return Err(StudioError::validation(format!(
            "project name exceeds {PROJECT_NAME_MAX} characters"
        )));
    }
    Ok(())
}

/// Validate an optional project description against
/// [`PROJECT_DESCRIPTION_MAX`].
pub fn validate_description(description: Option<&str>) -> Result<(), StudioError> {
    match description {
        Some(d) if !within(d, PROJECT_DESCRIPTION_MAX) => Err(StudioError::validation(format!(
            "project description exceeds {PROJECT_DESCRIPTION_MAX} characters"
        ))),
        _ => Ok(()),
    }
}
