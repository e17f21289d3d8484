use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use studio_domain::identity::Identity;
use studio_domain::node::{child_path, path_for, root_path};
use studio_domain::{NodeType, ProjectNode};
use studio_error::StudioError;
use uuid::Uuid;

use crate::pg_error::internal;

/// Fields supplied by the caller when creating a node. `path` and `sort`
/// have already been resolved by the service layer by the time this reaches
/// the store — `sort` is the caller's requested position; the store
/// computes `path` itself from the live parent row inside the same
/// transaction so it can never be computed from stale data.
#[derive(Debug, Clone)]
pub struct NewNode {
    /// Owning project id.
    pub project_id: i64,
    /// Parent node id; `None` only for a project's root `application` node.
    pub parent_id: Option<Uuid>,
    /// The node's kind.
    pub node_type: NodeType,
    /// Display name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Position among siblings.
    pub sort: i32,
    /// Creator identity.
    pub creator: Identity,
}

/// Fields a caller may change via [`NodeStore::update`]. Path and parent are
/// not mutable here — use [`NodeStore::move_node`] for those (spec.md §4.1).
#[derive(Debug, Clone, Default)]
pub struct UpdateNode {
    /// New name, if changing.
    pub name: Option<String>,
    /// New description, if changing. `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// Editor identity recording who made the change.
    pub editor: Identity,
}

/// Persistence contract for the typed, ordered, materialised-path node tree
/// (spec.md §4.1, C3).
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Create a node under the given (possibly absent) parent. Computes
    /// `path` from the parent's live row; the service layer is responsible
    /// for type-constraint and root-uniqueness checks before calling this.
    async fn create(&self, new_node: NewNode) -> Result<ProjectNode, StudioError>;
    /// Create a `function` node together with its companion
    /// `FunctionDocument` and empty content, writing the node's
    /// `document_id` back onto the returned row — all inside a single
    /// transaction, so the node never commits without its document (spec.md
    /// §3 "created atomically when a function node is created"; §4.2
    /// `create_function`: "all three steps must succeed as a unit; on
    /// failure, roll back"). `new_node.node_type` must be `Function`; the
    /// service layer is responsible for type-constraint checks before
    /// calling this.
    async fn create_function(&self, new_node: NewNode) -> Result<ProjectNode, StudioError>;
    /// Fetch a node by id, or `None` if it doesn't exist.
    async fn get_optional(&self, id: Uuid) -> Result<Option<ProjectNode>, StudioError>;
    /// Fetch a node by id, failing with `NotFound` if absent.
    async fn get(&self, id: Uuid) -> Result<ProjectNode, StudioError> {
        self.get_optional(id)
            .await?
            .ok_or_else(|| StudioError::not_found(format!("node {id} not found")))
    }
    /// All nodes of a project, ordered by `(path, sort)`.
    async fn list_by_project(&self, project_id: i64) -> Result<Vec<ProjectNode>, StudioError>;
    /// The project's root `application` node, if one exists.
    async fn get_root(&self, project_id: i64) -> Result<Option<ProjectNode>, StudioError>;
    /// Direct children of `parent_id`, ordered by `sort` ascending.
    async fn children(&self, parent_id: Uuid) -> Result<Vec<ProjectNode>, StudioError>;
    /// All strict descendants of `id` (path-prefix match), ordered by
    /// `(path, sort)`.
    async fn descendants(&self, id: Uuid) -> Result<Vec<ProjectNode>, StudioError>;
    /// `true` if `id` has at least one child.
    async fn has_children(&self, id: Uuid) -> Result<bool, StudioError>;
    /// Update name/description/editor; `path` and `parent_id` are untouched.
    async fn update(&self, id: Uuid, update: UpdateNode) -> Result<ProjectNode, StudioError>;
    /// Move a node to a new parent and sibling position, reparenting its
    /// subtree's paths, in one transaction (spec.md §4.1 `move`).
    async fn move_node(
        &self,
        id: Uuid,
        new_parent_id: Option<Uuid>,
        new_sort: i32,
        editor: Identity,
    ) -> Result<ProjectNode, StudioError>;
    /// Delete a single node row. Callers must have verified it has no
    /// children (or cascade at a higher layer).
    async fn delete(&self, id: Uuid) -> Result<(), StudioError>;
    /// Bulk-delete every node belonging to a project.
    async fn delete_by_project(&self, project_id: i64) -> Result<(), StudioError>;
    /// Highest existing `sort` among direct children of `parent_id` (or
    /// among root nodes when `None`), used to append a sibling at
    /// `max_sort + 1`.
    async fn max_sort(
        &self,
        parent_id: Option<Uuid>,
        project_id: i64,
    ) -> Result<i32, StudioError>;
    /// Record this node's `document_id` after its companion
    /// `FunctionDocument` has been created (spec.md §4.2 `create_function`).
    async fn set_document_id(&self, id: Uuid, document_id: i64) -> Result<(), StudioError>;
}

/// Postgres-backed [`NodeStore`].
pub struct PgNodeStore {
    pool: PgPool,
}

impl PgNodeStore {
    /// Build a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct NodeRow {
    id: Uuid,
    project_id: i64,
    parent_id: Option<Uuid>,
    node_type: String,
    name: String,
    description: Option<String>,
    path: String,
    sort: i32,
    status: i16,
    document_id: Option<i64>,
    creator_user_id: String,
    creator_name: String,
    editor_user_id: String,
    editor_name: String,
    created_at: DateTime<Utc>,
    edited_at: DateTime<Utc>,
}

impl TryFrom<NodeRow> for ProjectNode {
    type Error = StudioError;

    fn try_from(row: NodeRow) -> Result<Self, StudioError> {
        let node_type = parse_node_type(&row.node_type)?;
        Ok(ProjectNode {
            id: row.id,
            project_id: row.project_id,
            parent_id: row.parent_id,
            node_type,
            name: row.name,
            description: row.description,
            path: row.path,
            sort: row.sort,
            status: row.status,
            document_id: row.document_id,
            creator: Identity::new(row.creator_user_id, row.creator_name),
            editor: Identity::new(row.editor_user_id, row.editor_name),
            created_at: row.created_at,
            edited_at: row.edited_at,
        })
    }
}

fn parse_node_type(s: &str) -> Result<NodeType, StudioError> {
    match s {
        "application" => Ok(NodeType::Application),
        "page" => Ok(NodeType::Page),
        "function" => Ok(NodeType::Function),
        other => Err(StudioError::internal(format!(
            "unrecognised node_type {other:?} in database row"
        ))),
    }
}

fn node_type_str(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Application => "application",
        NodeType::Page => "page",
        NodeType::Function => "function",
    }
}

const SELECT_COLUMNS: &str = "id, project_id, parent_id, node_type, name, description, path, \
     sort, status, document_id, creator_user_id, creator_name, editor_user_id, editor_name, \
     created_at, edited_at";

fn rows_to_nodes(rows: Vec<NodeRow>) -> Result<Vec<ProjectNode>, StudioError> {
    rows.into_iter().map(ProjectNode::try_from).collect()
}

async fn load_parent_path(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    parent_id: Option<Uuid>,
) -> Result<Option<String>, StudioError> {
    let Some(parent_id) = parent_id else {
        return Ok(None);
    };
    let row: Option<(String,)> = sqlx::query_as("SELECT path FROM project_node WHERE id = $1")
        .bind(parent_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| internal("failed to load parent node", e))?;
    Ok(Some(
        row.ok_or_else(|| StudioError::not_found(format!("parent node {parent_id} not found")))?
            .0,
    ))
}

#[async_trait]
impl NodeStore for PgNodeStore {
    async fn create(&self, new_node: NewNode) -> Result<ProjectNode, StudioError> {
        let id = Uuid::new_v4();
        let mut tx = studio_db::begin(&self.pool).await?;

        let parent_path = load_parent_path(&mut tx, new_node.parent_id).await?;
        let path = path_for(parent_path.as_deref(), id);

        let sql = format!(
            "INSERT INTO project_node \
                 (id, project_id, parent_id, node_type, name, description, path, sort, \
                  status, document_id, creator_user_id, creator_name, editor_user_id, \
                  editor_name) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, NULL, $9, $10, $9, $10) \
             RETURNING {SELECT_COLUMNS}"
        );
        let row: NodeRow = sqlx::query_as(&sql)
            .bind(id)
            .bind(new_node.project_id)
            .bind(new_node.parent_id)
            .bind(node_type_str(new_node.node_type))
            .bind(&new_node.name)
            .bind(&new_node.description)
            .bind(&path)
            .bind(new_node.sort)
            .bind(&new_node.creator.user_id)
            .bind(&new_node.creator.user_name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| internal("failed to create node", e))?;

        tx.commit()
            .await
            .map_err(|e| internal("failed to commit node creation", e))?;
        ProjectNode::try_from(row)
    }

    async fn create_function(&self, new_node: NewNode) -> Result<ProjectNode, StudioError> {
        let id = Uuid::new_v4();
        let mut tx = studio_db::begin(&self.pool).await?;

        let parent_path = load_parent_path(&mut tx, new_node.parent_id).await?;
        let path = path_for(parent_path.as_deref(), id);

        let sql = format!(
            "INSERT INTO project_node \
                 (id, project_id, parent_id, node_type, name, description, path, sort, \
                  status, document_id, creator_user_id, creator_name, editor_user_id, \
                  editor_name) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, NULL, $9, $10, $9, $10) \
             RETURNING {SELECT_COLUMNS}"
        );
        let mut row: NodeRow = sqlx::query_as(&sql)
            .bind(id)
            .bind(new_node.project_id)
            .bind(new_node.parent_id)
            .bind(node_type_str(new_node.node_type))
            .bind(&new_node.name)
            .bind(&new_node.description)
            .bind(&path)
            .bind(new_node.sort)
            .bind(&new_node.creator.user_id)
            .bind(&new_node.creator.user_name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| internal("failed to create function node", e))?;

        let document_id: i64 = sqlx::query_scalar(
            "INSERT INTO function_document \
                 (function_node_id, creator_user_id, creator_name, editor_user_id, editor_name) \
             VALUES ($1, $2, $3, $2, $3) \
             RETURNING id",
        )
        .bind(id)
        .bind(&new_node.creator.user_id)
        .bind(&new_node.creator.user_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| internal("failed to create function document metadata", e))?;

        sqlx::query("INSERT INTO document_content (document_id, content) VALUES ($1, '{}'::jsonb)")
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| internal("failed to initialise document content", e))?;

        sqlx::query("UPDATE project_node SET document_id = $2 WHERE id = $1")
            .bind(id)
            .bind(document_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| internal("failed to write back node document_id", e))?;

        tx.commit()
            .await
            .map_err(|e| internal("failed to commit function node creation", e))?;

        row.document_id = Some(document_id);
        ProjectNode::try_from(row)
    }

    async fn get_optional(&self, id: Uuid) -> Result<Option<ProjectNode>, StudioError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM project_node WHERE id = $1");
        let row: Option<NodeRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| internal("failed to fetch node", e))?;
        row.map(ProjectNode::try_from).transpose()
    }

    async fn list_by_project(&self, project_id: i64) -> Result<Vec<ProjectNode>, StudioError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM project_node WHERE project_id = $1 ORDER BY path, sort"
        );
        let rows: Vec<NodeRow> = sqlx::query_as(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| internal("failed to list nodes for project", e))?;
        rows_to_nodes(rows)
    }

    async fn get_root(&self, project_id: i64) -> Result<Option<ProjectNode>, StudioError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM project_node \
             WHERE project_id = $1 AND parent_id IS NULL AND node_type = 'application'"
        );
        let row: Option<NodeRow> = sqlx::query_as(&sql)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| internal("failed to fetch project root", e))?;
        row.map(ProjectNode::try_from).transpose()
    }

    async fn children(&self, parent_id: Uuid) -> Result<Vec<ProjectNode>, StudioError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM project_node WHERE parent_id = $1 ORDER BY sort"
        );
        let rows: Vec<NodeRow> = sqlx::query_as(&sql)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| internal("failed to list children", e))?;
        rows_to_nodes(rows)
    }

    async fn descendants(&self, id: Uuid) -> Result<Vec<ProjectNode>, StudioError> {
        let node = self.get(id).await?;
        let prefix = format!("{}/", node.path);
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM project_node \
             WHERE path LIKE $1 || '%' ORDER BY path, sort"
        );
        let rows: Vec<NodeRow> = sqlx::query_as(&sql)
            .bind(&prefix)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| internal("failed to list descendants", e))?;
        rows_to_nodes(rows)
    }

    async fn has_children(&self, id: Uuid) -> Result<bool, StudioError> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM project_node WHERE parent_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| internal("failed to check for children", e))?;
        Ok(row.0)
    }

    async fn update(&self, id: Uuid, update: UpdateNode) -> Result<ProjectNode, StudioError> {
        let current = self.get(id).await?;
        let name = update.name.unwrap_or(current.name);
        let description = update.description.unwrap_or(current.description);

        let sql = format!(
            "UPDATE project_node \
             SET name = $2, description = $3, editor_user_id = $4, editor_name = $5, \
                 edited_at = now() \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        );
        let row: NodeRow = sqlx::query_as(&sql)
            .bind(id)
            .bind(&name)
            .bind(&description)
            .bind(&update.editor.user_id)
            .bind(&update.editor.user_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| internal("failed to update node", e))?;
        ProjectNode::try_from(row)
    }

    async fn move_node(
        &self,
        id: Uuid,
        new_parent_id: Option<Uuid>,
        new_sort: i32,
        editor: Identity,
    ) -> Result<ProjectNode, StudioError> {
        let mut tx = studio_db::begin(&self.pool).await?;

        let node = fetch_node_tx(&mut tx, id)
            .await?
            .ok_or_else(|| StudioError::not_found(format!("node {id} not found")))?;

        let new_parent_path: Option<String> = match new_parent_id {
            Some(parent_id) => {
                let row: Option<(String,)> =
                    sqlx::query_as("SELECT path FROM project_node WHERE id = $1")
                        .bind(parent_id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(|e| internal("failed to load new parent", e))?;
                Some(
                    row.ok_or_else(|| {
                        StudioError::not_found(format!("parent node {parent_id} not found"))
                    })?
                    .0,
                )
            }
            None => None,
        };
        let new_path = match &new_parent_path {
            Some(p) => child_path(p, id),
            None => root_path(id),
        };

        // Make room among the new siblings: shift everyone at or after
        // `new_sort` up by one (spec.md §4.1 step 3).
        sqlx::query(
            "UPDATE project_node SET sort = sort + 1 \
             WHERE project_id = $1 AND id != $2 AND sort >= $3 \
             AND parent_id IS NOT DISTINCT FROM $4",
        )
        .bind(node.project_id)
        .bind(id)
        .bind(new_sort)
        .bind(new_parent_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| internal("failed to shift sibling sort positions", e))?;

        // Move the node itself.
        let sql = format!(
            "UPDATE project_node \
             SET parent_id = $2, path = $3, sort = $4, editor_user_id = $5, \
                 editor_name = $6, edited_at = now() \
             WHERE id = $1 \
             RETURNING {SELECT_COLUMNS}"
        );
        let row: NodeRow = sqlx::query_as(&sql)
            .bind(id)
            .bind(new_parent_id)
            .bind(&new_path)
            .bind(new_sort)
            .bind(&editor.user_id)
            .bind(&editor.user_name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| internal("failed to move node", e))?;

        // Reparent descendants: replace the old path prefix with the new
        // one (spec.md §4.1 step 5).
        let old_prefix = format!("{}/", node.path);
        sqlx::query(
            "UPDATE project_node \
             SET path = $2 || substring(path from $3) \
             WHERE path LIKE $4 || '%'",
        )
        .bind(id)
        .bind(format!("{new_path}/"))
        .bind((old_prefix.chars().count() + 1) as i32)
        .bind(&old_prefix)
        .execute(&mut *tx)
        .await
        .map_err(|e| internal("failed to reparent descendant paths", e))?;

        tx.commit()
            .await
            .map_err(|e| internal("failed to commit node move", e))?;
        ProjectNode::try_from(row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StudioError> {
        sqlx::query("DELETE FROM project_node WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| internal("failed to delete node", e))?;
        Ok(())
    }

    async fn delete_by_project(&self, project_id: i64) -> Result<(), StudioError> {
        sqlx::query("DELETE FROM project_node WHERE project_id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map_err(|e| internal("failed to delete project nodes", e))?;
        Ok(())
    }

    async fn max_sort(
        &self,
        parent_id: Option<Uuid>,
        project_id: i64,
    ) -> Result<i32, StudioError> {
        let row: (Option<i32>,) = sqlx::query_as(
            "SELECT MAX(sort) FROM project_node \
             WHERE project_id = $1 AND parent_id IS NOT DISTINCT FROM $2",
        )
        .bind(project_id)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| internal("failed to compute max sort", e))?;
        Ok(row.0.unwrap_or(-1))
    }

    async fn set_document_id(&self, id: Uuid, document_id: i64) -> Result<(), StudioError> {
        sqlx::query("UPDATE project_node SET document_id = $2 WHERE id = $1")
            .bind(id)
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(|e| internal("failed to set node document_id", e))?;
        Ok(())
    }
}

async fn fetch_node_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
) -> Result<Option<ProjectNode>, StudioError> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM project_node WHERE id = $1");
    let row: Option<NodeRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| internal("failed to fetch node", e))?;
    row.map(ProjectNode::try_from).transpose()
}

