//! Tree service (spec.md §4.2 C6): business rules over the node store —
//! type-constrained creation, sort-position computation, move validation,
//! cascading delete, and in-memory tree assembly.

use std::collections::HashMap;
use std::sync::Arc;

use studio_domain::identity::Identity;
use studio_domain::node::validate_name;
use studio_domain::{NodeType, ProjectNode};
use studio_error::StudioError;
use studio_store::node::{NewNode, NodeStore, UpdateNode};
use studio_store::project::ProjectStore;
use studio_store::DocumentMetaStore;
use uuid::Uuid;

/// A node with its children assembled in-memory, sorted by `sort`
/// (spec.md §4.2 `tree`).
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// The node itself.
    pub node: ProjectNode,
    /// Direct children, sorted by `sort` ascending.
    pub children: Vec<TreeNode>,
}

/// Orchestrates [`NodeStore`] and [`ProjectStore`], enforcing the node-type
/// parent grammar, sort-position assignment, and cascading delete
/// (spec.md §4.2).
pub struct TreeService {
    nodes: Arc<dyn NodeStore>,
    projects: Arc<dyn ProjectStore>,
    document_meta: Arc<dyn DocumentMetaStore>,
}

impl TreeService {
    /// Build a service over the given stores. The document-meta store is
    /// used only by single-node deletion, to remove a function node's
    /// document row before the node itself (spec.md §4.2 `delete`); document
    /// creation for `create_function` goes through
    /// [`NodeStore::create_function`] instead, which owns its own document
    /// wiring.
    #[must_use]
    pub fn new(
        nodes: Arc<dyn NodeStore>,
        projects: Arc<dyn ProjectStore>,
        document_meta: Arc<dyn DocumentMetaStore>,
    ) -> Self {
        Self {
            nodes,
            projects,
            document_meta,
        }
    }

    /// Create the root `application` node of a project. Fails with
    /// `Conflict` if the project already has a root.
    pub async fn create_application(
        &self,
        project_id: i64,
        name: String,
        description: Option<String>,
        creator: Identity,
    ) -> Result<ProjectNode, StudioError> {
        self.projects.get(project_id).await?;
        validate_name(&name)?;
        if self.nodes.get_root(project_id).await?.is_some() {
            return Err(StudioError::conflict(format!(
                "project {project_id} already has an application root"
            ))
            .with_code("APPLICATION_ROOT_CONFLICT"));
        }
        self.nodes
            .create(NewNode {
                project_id,
                parent_id: None,
                node_type: NodeType::Application,
                name,
                description,
                sort: 0,
                creator,
            })
            .await
    }

    /// Create a `page` node under an `application` parent.
    pub async fn create_page(
        &self,
        project_id: i64,
        parent_id: Uuid,
        name: String,
        description: Option<String>,
        creator: Identity,
    ) -> Result<ProjectNode, StudioError> {
        self.create_child(
            project_id,
            parent_id,
            NodeType::Page,
            name,
            description,
            creator,
        )
        .await
    }

    /// Create a `function` node under a `page` parent together with its
    /// companion document, via [`NodeStore::create_function`], which
    /// performs the node insert, document metadata/content creation, and
    /// `document_id` write-back in one transaction — "all three steps must
    /// succeed as a unit; on failure, roll back" (spec.md §4.2
    /// `create_function`; §3: the document is "created atomically when a
    /// function node is created").
    pub async fn create_function(
        &self,
        project_id: i64,
        parent_id: Uuid,
        name: String,
        description: Option<String>,
        creator: Identity,
    ) -> Result<ProjectNode, StudioError> {
        validate_name(&name)?;
        self.validate_parent(project_id, parent_id, NodeType::Function)
            .await?;
        let sort = self.nodes.max_sort(Some(parent_id), project_id).await? + 1;
        self.nodes
            .create_function(NewNode {
                project_id,
                parent_id: Some(parent_id),
                node_type: NodeType::Function,
                name,
                description,
                sort,
                creator,
            })
            .await
    }

    async fn create_child(
        &self,
        project_id: i64,
        parent_id: Uuid,
        node_type: NodeType,
        name: String,
        description: Option<String>,
        creator: Identity,
    ) -> Result<ProjectNode, StudioError> {
        validate_name(&name)?;
        self.validate_parent(project_id, parent_id, node_type).await?;
        let sort = self.nodes.max_sort(Some(parent_id), project_id).await? + 1;
        self.nodes
            .create(NewNode {
                project_id,
                parent_id: Some(parent_id),
                node_type,
                name,
                description,
                sort,
                creator,
            })
            .await
    }

    /// Load `parent_id`, verifying it belongs to `project_id` and accepts a
    /// child of `node_type`, per the parent grammar (spec.md §3: "application
    /// has no parent; page has an application parent; function has a page
    /// parent").
    async fn validate_parent(
        &self,
        project_id: i64,
        parent_id: Uuid,
        node_type: NodeType,
    ) -> Result<ProjectNode, StudioError> {
        let parent = self.nodes.get(parent_id).await?;
        if parent.project_id != project_id {
            return Err(StudioError::validation(
                "parent node does not belong to the given project",
            ));
        }
        if !node_type.accepts_parent(Some(parent.node_type)) {
            return Err(StudioError::validation(format!(
                "a {node_type:?} node cannot be created under a {:?} parent",
                parent.node_type
            )));
        }
        Ok(parent)
    }

    /// Update a node's name and/or description.
    pub async fn update(
        &self,
        node_id: Uuid,
        name: Option<String>,
        description: Option<Option<String>>,
        editor: Identity,
    ) -> Result<ProjectNode, StudioError> {
        self.nodes.get(node_id).await?;
        if let Some(name) = &name {
            validate_name(name)?;
        }
        self.nodes
            .update(
                node_id,
                UpdateNode {
                    name,
                    description,
                    editor,
                },
            )
            .await
    }

    /// Move a node to a new parent, positioned immediately after
    /// `predecessor_id` among the new siblings (or first, if `None`)
    /// (spec.md §4.2 `move`).
    pub async fn move_node(
        &self,
        node_id: Uuid,
        new_parent_id: Option<Uuid>,
        predecessor_id: Option<Uuid>,
        editor: Identity,
    ) -> Result<ProjectNode, StudioError> {
        let node = self.nodes.get(node_id).await?;

        let new_parent = match new_parent_id {
            Some(id) => Some(self.nodes.get(id).await?),
            None => None,
        };
        if let Some(parent) = &new_parent {
            if parent.project_id != node.project_id {
                return Err(StudioError::validation(
                    "cannot move a node into a different project",
                ));
            }
            if node.would_create_cycle(&parent.path) {
                return Err(StudioError::validation(
                    "cannot move a node into its own subtree",
                ));
            }
        }
        if !node
            .node_type
            .accepts_parent(new_parent.as_ref().map(|p| p.node_type))
        {
            return Err(StudioError::validation(format!(
                "a {:?} node cannot be moved under that parent",
                node.node_type
            )));
        }

        let new_sort = match predecessor_id {
            None => 0,
            Some(predecessor_id) => {
                let predecessor = self.nodes.get(predecessor_id).await?;
                if predecessor.parent_id != new_parent_id || predecessor.project_id != node.project_id
                {
                    return Err(StudioError::validation(
                        "predecessor is not a direct child of the new parent",
                    ));
                }
                predecessor.sort + 1
            }
        };

        self.nodes
            .move_node(node_id, new_parent_id, new_sort, editor)
            .await
    }

    /// Delete a node. Rejects with `Conflict` if it has children; if it is a
    /// function node, deletes its document metadata first (content cascades
    /// via the database foreign key) before deleting the node row
    /// (spec.md §4.2 `delete`).
    pub async fn delete(&self, node_id: Uuid) -> Result<(), StudioError> {
        let node = self.nodes.get(node_id).await?;
        if self.nodes.has_children(node_id).await? {
            return Err(StudioError::conflict("node has children")
                .with_code("NODE_HAS_CHILDREN"));
        }
        if let Some(document_id) = node.document_id {
            self.document_meta.delete(document_id).await?;
        }
        self.nodes.delete(node_id).await
    }

    /// Fetch every node of a project and assemble it into a tree rooted at
    /// the `application` node, each level sorted by `sort` ascending
    /// (spec.md §4.2 `tree`). Returns `None` if the project has no root yet.
    pub async fn tree(&self, project_id: i64) -> Result<Option<TreeNode>, StudioError> {
        let nodes = self.nodes.list_by_project(project_id).await?;
        let mut children_of: HashMap<Option<Uuid>, Vec<ProjectNode>> = HashMap::new();
        for node in nodes {
            children_of.entry(node.parent_id).or_default().push(node);
        }
        for siblings in children_of.values_mut() {
            siblings.sort_by_key(|n| n.sort);
        }

        let Some(root) = children_of
            .get(&None)
            .and_then(|roots| roots.first())
            .cloned()
        else {
            return Ok(None);
        };
        Ok(Some(build_tree_node(root, &children_of)))
    }
}

fn build_tree_node(node: ProjectNode, children_of: &HashMap<Option<Uuid>, Vec<ProjectNode>>) -> TreeNode {
    let children = children_of
        .get(&Some(node.id))
        .into_iter()
        .flatten()
        .cloned()
        .map(|child| build_tree_node(child, children_of))
        .collect();
    TreeNode { node, children }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        FakeDocumentContentStore, FakeDocumentMetaStore, FakeNodeStore, FakeProjectStore,
    };
    use studio_store::project::NewProject;

    async fn service() -> (TreeService, Arc<FakeProjectStore>, i64) {
        let nodes = Arc::new(FakeNodeStore::default());
        let projects = Arc::new(FakeProjectStore::default());
        let meta = Arc::new(FakeDocumentMetaStore::default());
        let content = Arc::new(FakeDocumentContentStore::default());
        nodes.wire_documents(meta.clone(), content);
        let project = projects
            .create(NewProject {
                name: "P1".into(),
                description: None,
                creator: Identity::new("u1", "Ada"),
            })
            .await
            .unwrap();
        (
            TreeService::new(nodes, projects.clone(), meta),
            projects,
            project.id,
        )
    }

    #[tokio::test]
    async fn create_application_then_second_conflicts() {
        let (svc, _projects, project_id) = service().await;
        let creator = Identity::new("u1", "Ada");
        let app = svc
            .create_application(project_id, "App".into(), None, creator.clone())
            .await
            .unwrap();
        assert!(app.parent_id.is_none());
        assert_eq!(app.sort, 0);

        let err = svc
            .create_application(project_id, "App2".into(), None, creator)
            .await
            .unwrap_err();
        assert_eq!(err.kind, studio_error::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn create_page_under_non_application_is_rejected() {
        let (svc, _projects, project_id) = service().await;
        let creator = Identity::new("u1", "Ada");
        let app = svc
            .create_application(project_id, "App".into(), None, creator.clone())
            .await
            .unwrap();
        let page = svc
            .create_page(project_id, app.id, "Home".into(), None, creator.clone())
            .await
            .unwrap();
        let err = svc
            .create_page(project_id, page.id, "Nested".into(), None, creator)
            .await
            .unwrap_err();
        assert_eq!(err.kind, studio_error::ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn create_function_initialises_document() {
        let (svc, _projects, project_id) = service().await;
        let creator = Identity::new("u1", "Ada");
        let app = svc
            .create_application(project_id, "App".into(), None, creator.clone())
            .await
            .unwrap();
        let page = svc
            .create_page(project_id, app.id, "Home".into(), None, creator.clone())
            .await
            .unwrap();
        let function = svc
            .create_function(project_id, page.id, "Login".into(), None, creator)
            .await
            .unwrap();
        assert!(function.document_id.is_some());
    }

    #[tokio::test]
    async fn move_with_no_predecessor_goes_first() {
        let (svc, _projects, project_id) = service().await;
        let creator = Identity::new("u1", "Ada");
        let app = svc
            .create_application(project_id, "App".into(), None, creator.clone())
            .await
            .unwrap();
        let home = svc
            .create_page(project_id, app.id, "Home".into(), None, creator.clone())
            .await
            .unwrap();
        let settings = svc
            .create_page(project_id, app.id, "Settings".into(), None, creator.clone())
            .await
            .unwrap();
        let function = svc
            .create_function(project_id, home.id, "Login".into(), None, creator.clone())
            .await
            .unwrap();

        let moved = svc
            .move_node(function.id, Some(settings.id), None, creator)
            .await
            .unwrap();
        assert_eq!(moved.parent_id, Some(settings.id));
        assert_eq!(moved.sort, 0);
        assert!(moved.path.starts_with(&settings.path));
    }

    #[tokio::test]
    async fn move_into_own_subtree_rejected() {
        let (svc, _projects, project_id) = service().await;
        let creator = Identity::new("u1", "Ada");
        let app = svc
            .create_application(project_id, "App".into(), None, creator.clone())
            .await
            .unwrap();
        let home = svc
            .create_page(project_id, app.id, "Home".into(), None, creator.clone())
            .await
            .unwrap();
        let err = svc
            .move_node(app.id, Some(home.id), None, creator)
            .await
            .unwrap_err();
        assert_eq!(err.kind, studio_error::ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn delete_rejects_node_with_children() {
        let (svc, _projects, project_id) = service().await;
        let creator = Identity::new("u1", "Ada");
        let app = svc
            .create_application(project_id, "App".into(), None, creator.clone())
            .await
            .unwrap();
        svc.create_page(project_id, app.id, "Home".into(), None, creator)
            .await
            .unwrap();
        let err = svc.delete(app.id).await.unwrap_err();
        assert_eq!(err.kind, studio_error::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn delete_leaf_succeeds_and_removes_document() {
        let (svc, _projects, project_id) = service().await;
        let creator = Identity::new("u1", "Ada");
        let app = svc
            .create_application(project_id, "App".into(), None, creator.clone())
            .await
            .unwrap();
        let home = svc
            .create_page(project_id, app.id, "Home".into(), None, creator.clone())
            .await
            .unwrap();
        let function = svc
            .create_function(project_id, home.id, "Login".into(), None, creator.clone())
            .await
            .unwrap();
        svc.delete(function.id).await.unwrap();
        assert!(svc.nodes.get_optional(function.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tree_assembles_sorted_children() {
        let (svc, _projects, project_id) = service().await;
        let creator = Identity::new("u1", "Ada");
        let app = svc
            .create_application(project_id, "App".into(), None, creator.clone())
            .await
            .unwrap();
        svc.create_page(project_id, app.id, "Home".into(), None, creator.clone())
            .await
            .unwrap();
        svc.create_page(project_id, app.id, "Settings".into(), None, creator)
            .await
            .unwrap();

        let tree = svc.tree(project_id).await.unwrap().unwrap();
        assert_eq!(tree.node.id, app.id);
        assert_eq!(tree.children.len(), 2);
        assert!(tree.children[0].node.sort <= tree.children[1].node.sort);
    }
}
