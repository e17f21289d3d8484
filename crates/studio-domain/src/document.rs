use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::identity::Identity;
use studio_error::StudioError;

/// Document metadata, 1:1 with a function node (spec.md §3 `FunctionDocument`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDocument {
    /// Document id.
    pub id: i64,
    /// The function node this document belongs to.
    pub function_node_id: Uuid,
    /// Creator identity.
    pub creator: Identity,
    /// Last editor identity.
    pub editor: Identity,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-edited timestamp.
    pub edited_at: DateTime<Utc>,
}

/// The document payload: a single JSON object, structurally opaque to the
/// engine (spec.md §3 `DocumentContent`).
///
/// The invariant enforced here is the "top level is always an object" shape
/// from spec.md §4.3 step 3 — not the document's internal structure, which
/// callers are free to shape however they like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentContent(Value);

impl DocumentContent {
    /// The empty document, `{}` — the initial content of every newly
    /// created function document.
    #[must_use]
    pub fn empty() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }

    /// Wrap a JSON value as document content, rejecting anything whose top
    /// level is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, StudioError> {
        if value.is_object() {
            Ok(Self(value))
        } else {
            Err(StudioError::validation(
                "document content must be a JSON object",
            ))
        }
    }

    /// Borrow the underlying JSON value.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume `self`, returning the underlying JSON value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for DocumentContent {
    fn default() -> Self {
        Self::empty()
    }
}
