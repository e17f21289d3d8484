use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Identity;
use crate::limits::{within, NODE_NAME_MAX};
use studio_error::StudioError;

/// The three node kinds a `ProjectNode` can be, and the fixed parent
/// grammar between them (spec.md §3): `application` has no parent, `page`
/// sits under an `application`, `function` sits under a `page`, and
/// `function` nodes never have children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// The root node of a project; exactly one per project.
    Application,
    /// An intermediate node directly under an application.
    Page,
    /// A leaf node under a page; owns one document.
    Function,
}

impl NodeType {
    /// The node type a node of `self`'s kind is required to have as a
    /// parent, or `None` if `self` must be a root (only `Application`).
    #[must_use]
    pub fn required_parent(self) -> Option<NodeType> {
        match self {
            NodeType::Application => None,
            NodeType::Page => Some(NodeType::Application),
            NodeType::Function => Some(NodeType::Page),
        }
    }

    /// `true` if a node of `self`'s kind is allowed to have `parent` as its
    /// parent type. `None` means "no parent" (root position).
    #[must_use]
    pub fn accepts_parent(self, parent: Option<NodeType>) -> bool {
        self.required_parent() == parent
    }

    /// `true` if nodes of this type may never have children (only
    /// `Function`).
    #[must_use]
    pub fn is_leaf(self) -> bool {
        matches!(self, NodeType::Function)
    }
}

/// A node in the application → page → function tree, persisted as a flat
/// row with a parent pointer and a materialised path (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectNode {
    /// 128-bit node id.
    pub id: Uuid,
    /// Owning project id.
    pub project_id: i64,
    /// Parent node id; `None` only for the root node of a project.
    pub parent_id: Option<Uuid>,
    /// The node's kind.
    pub node_type: NodeType,
    /// Display name, at most [`NODE_NAME_MAX`] chars.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Materialised path: `/node_<id>/node_<id>/…` from root to self.
    pub path: String,
    /// Position among siblings; lower sorts first. Not globally unique.
    pub sort: i32,
    /// Reserved status flag.
    pub status: i16,
    /// Document id; non-null iff `node_type == Function`.
    pub document_id: Option<i64>,
    /// Creator identity.
    pub creator: Identity,
    /// Last editor identity.
    pub editor: Identity,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-edited timestamp.
    pub edited_at: DateTime<Utc>,
}

/// The path token for a single node id: `node_<id>`.
#[must_use]
pub fn path_segment(id: Uuid) -> String {
    format!("node_{id}")
}

/// The materialised path for a root node (no parent).
#[must_use]
pub fn root_path(id: Uuid) -> String {
    format!("/{}", path_segment(id))
}

/// The materialised path for a node given its parent's path.
#[must_use]
pub fn child_path(parent_path: &str, id: Uuid) -> String {
    format!("{parent_path}/{}", path_segment(id))
}

/// The materialised path this node *would* have given its (possibly new)
/// parent path, mirroring §4.1's `create`/`move` path computation.
#[must_use]
pub fn path_for(parent_path: Option<&str>, id: Uuid) -> String {
    match parent_path {
        Some(p) => child_path(p, id),
        None => root_path(id),
    }
}

/// The strict-descendant path prefix for subtree queries: `<path>/`.
#[must_use]
pub fn descendant_prefix(path: &str) -> String {
    format!("{path}/")
}

/// Validate a node name against [`NODE_NAME_MAX`].
pub fn validate_name(name: &str) -> Result<(), StudioError> {
    if name.is_empty() {
        return Err(StudioError::validation("node name must not be empty"));
    }
    if !within(name, NODE_NAME_MAX) {
        return Err(StudioError::validation(format!(
            "node name exceeds {NODE_NAME_MAX} characters"
        )));
    }
    Ok(())
}

impl ProjectNode {
    /// `true` if `candidate_parent_path` is this node's own path or lies
    /// within its subtree — i.e. moving this node under that parent would
    /// graft it into its own descendants (spec.md §4.1).
    #[must_use]
    pub fn would_create_cycle(&self, candidate_parent_path: &str) -> bool {
        candidate_parent_path == self.path
            || candidate_parent_path.starts_with(&descendant_prefix(&self.path))
    }
}
