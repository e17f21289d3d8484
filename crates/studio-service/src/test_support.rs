//! In-memory fakes for the store traits, used by this crate's own unit
//! tests so the business rules in `studio-service` can be exercised without
//! a live Postgres instance. Mirrors the Postgres stores' semantics closely
//! enough to catch service-layer bugs; it is not a substitute for the
//! `sqlx`-backed integration tests in `studio-store`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use studio_domain::dictionary::DictionaryEntry;
use studio_domain::document::{DocumentContent, FunctionDocument};
use studio_domain::identity::Identity;
use studio_domain::node::{child_path, path_for, root_path};
use studio_domain::project::Project;
use studio_domain::{NodeType, ProjectNode};
use studio_error::StudioError;
use studio_json_patch::PatchOp;
use studio_store::dictionary::DictionaryStore;
use studio_store::document_content::DocumentContentStore;
use studio_store::document_meta::DocumentMetaStore;
use studio_store::node::{NewNode, NodeStore, UpdateNode};
use studio_store::project::{NewProject, ProjectStore, UpdateProject};
use uuid::Uuid;

#[derive(Default)]
pub struct FakeNodeStore {
    rows: Mutex<HashMap<Uuid, ProjectNode>>,
    /// Document fakes this store delegates to from `create_function`, to
    /// stand in for the single cross-table transaction `PgNodeStore`
    /// performs there. `None` until [`FakeNodeStore::wire_documents`] is
    /// called — only tests that exercise `create_function` need it wired.
    documents: Mutex<Option<(Arc<FakeDocumentMetaStore>, Arc<FakeDocumentContentStore>)>>,
}

impl FakeNodeStore {
    /// Seed a minimal function node directly, bypassing `create`, for tests
    /// that only care about document write-back.
    pub fn seed_bare_node(&self, id: Uuid) {
        let now = Utc::now();
        self.rows.lock().unwrap().insert(
            id,
            ProjectNode {
                id,
                project_id: 1,
                parent_id: None,
                node_type: NodeType::Function,
                name: "seed".into(),
                description: None,
                path: root_path(id),
                sort: 0,
                status: 0,
                document_id: None,
                creator: Identity::default(),
                editor: Identity::default(),
                created_at: now,
                edited_at: now,
            },
        )
    }

    /// Wire this fake to the document fakes `create_function` delegates to.
    pub fn wire_documents(
        &self,
        meta: Arc<FakeDocumentMetaStore>,
        content: Arc<FakeDocumentContentStore>,
    ) {
        *self.documents.lock().unwrap() = Some((meta, content));
    }
}

#[async_trait]
impl NodeStore for FakeNodeStore {
    async fn create(&self, new_node: NewNode) -> Result<ProjectNode, StudioError> {
        let id = Uuid::new_v4();
        let mut rows = self.rows.lock().unwrap();
        let parent_path = match new_node.parent_id {
            Some(parent_id) => Some(
                rows.get(&parent_id)
                    .ok_or_else(|| StudioError::not_found("parent node not found"))?
                    .path
                    .clone(),
            ),
            None => None,
        };
        let path = path_for(parent_path.as_deref(), id);
        let now = Utc::now();
        let node = ProjectNode {
            id,
            project_id: new_node.project_id,
            parent_id: new_node.parent_id,
            node_type: new_node.node_type,
            name: new_node.name,
            description: new_node.description,
            path,
            sort: new_node.sort,
            status: 0,
            document_id: None,
            creator: new_node.creator.clone(),
            editor: new_node.creator,
            created_at: now,
            edited_at: now,
        };
        rows.insert(id, node.clone());
        Ok(node)
    }

    async fn create_function(&self, new_node: NewNode) -> Result<ProjectNode, StudioError> {
        let creator = new_node.creator.clone();
        let node = self.create(new_node).await?;
        let (meta, content) = self
            .documents
            .lock()
            .unwrap()
            .clone()
            .expect("FakeNodeStore::create_function called without wire_documents");
        let document = meta.create(node.id, creator).await?;
        content.set(document.id, DocumentContent::default()).await?;
        self.set_document_id(node.id, document.id).await?;
        self.get(node.id).await
    }

    async fn get_optional(&self, id: Uuid) -> Result<Option<ProjectNode>, StudioError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_project(&self, project_id: i64) -> Result<Vec<ProjectNode>, StudioError> {
        let rows = self.rows.lock().unwrap();
        let mut out: Vec<ProjectNode> = rows
            .values()
            .filter(|n| n.project_id == project_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| (a.path.clone(), a.sort).cmp(&(b.path.clone(), b.sort)));
        Ok(out)
    }

    async fn get_root(&self, project_id: i64) -> Result<Option<ProjectNode>, StudioError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|n| n.project_id == project_id && n.parent_id.is_none())
            .cloned())
    }

    async fn children(&self, parent_id: Uuid) -> Result<Vec<ProjectNode>, StudioError> {
        let rows = self.rows.lock().unwrap();
        let mut out: Vec<ProjectNode> = rows
            .values()
            .filter(|n| n.parent_id == Some(parent_id))
            .cloned()
            .collect();
        out.sort_by_key(|n| n.sort);
        Ok(out)
    }

    async fn descendants(&self, id: Uuid) -> Result<Vec<ProjectNode>, StudioError> {
        let node = self.get(id).await?;
        let prefix = format!("{}/", node.path);
        let rows = self.rows.lock().unwrap();
        let mut out: Vec<ProjectNode> = rows
            .values()
            .filter(|n| n.path.starts_with(&prefix))
            .cloned()
            .collect();
        out.sort_by(|a, b| (a.path.clone(), a.sort).cmp(&(b.path.clone(), b.sort)));
        Ok(out)
    }

    async fn has_children(&self, id: Uuid) -> Result<bool, StudioError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .any(|n| n.parent_id == Some(id)))
    }

    async fn update(&self, id: Uuid, update: UpdateNode) -> Result<ProjectNode, StudioError> {
        let mut rows = self.rows.lock().unwrap();
        let node = rows
            .get_mut(&id)
            .ok_or_else(|| StudioError::not_found("node not found"))?;
        if let Some(name) = update.name {
            node.name = name;
        }
        if let Some(description) = update.description {
            node.description = description;
        }
        node.editor = update.editor;
        node.edited_at = Utc::now();
        Ok(node.clone())
    }

    async fn move_node(
        &self,
        id: Uuid,
        new_parent_id: Option<Uuid>,
        new_sort: i32,
        editor: Identity,
    ) -> Result<ProjectNode, StudioError> {
        let mut rows = self.rows.lock().unwrap();
        let project_id = rows
            .get(&id)
            .ok_or_else(|| StudioError::not_found("node not found"))?
            .project_id;
        let old_path = rows.get(&id).unwrap().path.clone();
        let new_parent_path = match new_parent_id {
            Some(parent_id) => Some(
                rows.get(&parent_id)
                    .ok_or_else(|| StudioError::not_found("parent node not found"))?
                    .path
                    .clone(),
            ),
            None => None,
        };
        let new_path = match &new_parent_path {
            Some(p) => child_path(p, id),
            None => root_path(id),
        };

        for node in rows.values_mut() {
            if node.id != id
                && node.project_id == project_id
                && node.parent_id == new_parent_id
                && node.sort >= new_sort
            {
                node.sort += 1;
            }
        }

        let old_prefix = format!("{old_path}/");
        for node in rows.values_mut() {
            if node.path.starts_with(&old_prefix) {
                node.path = format!("{new_path}/{}", &node.path[old_prefix.len()..]);
            }
        }

        let node = rows.get_mut(&id).unwrap();
        node.parent_id = new_parent_id;
        node.path = new_path;
        node.sort = new_sort;
        node.editor = editor;
        node.edited_at = Utc::now();
        Ok(node.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StudioError> {
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn delete_by_project(&self, project_id: i64) -> Result<(), StudioError> {
        self.rows
            .lock()
            .unwrap()
            .retain(|_, n| n.project_id != project_id);
        Ok(())
    }

    async fn max_sort(
        &self,
        parent_id: Option<Uuid>,
        project_id: i64,
    ) -> Result<i32, StudioError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|n| n.project_id == project_id && n.parent_id == parent_id)
            .map(|n| n.sort)
            .max()
            .unwrap_or(-1))
    }

    async fn set_document_id(&self, id: Uuid, document_id: i64) -> Result<(), StudioError> {
        let mut rows = self.rows.lock().unwrap();
        let node = rows
            .get_mut(&id)
            .ok_or_else(|| StudioError::not_found("node not found"))?;
        node.document_id = Some(document_id);
        Ok(())
    }
}

#[derive(Clone)]
struct CascadeDeps {
    nodes: Arc<FakeNodeStore>,
    document_meta: Arc<FakeDocumentMetaStore>,
    dictionary: Arc<FakeDictionaryStore>,
}

#[derive(Default)]
pub struct FakeProjectStore {
    rows: Mutex<HashMap<i64, Project>>,
    next_id: Mutex<i64>,
    /// Stores `delete_cascade` delegates to, standing in for the single
    /// transaction `PgProjectStore` performs there. `None` until
    /// [`FakeProjectStore::wire_cascade`] is called — only tests that
    /// exercise `delete_cascade` need it wired.
    cascade: Mutex<Option<CascadeDeps>>,
}

impl FakeProjectStore {
    /// Wire this fake to the node/document/dictionary fakes
    /// `delete_cascade` delegates to.
    pub fn wire_cascade(
        &self,
        nodes: Arc<FakeNodeStore>,
        document_meta: Arc<FakeDocumentMetaStore>,
        dictionary: Arc<FakeDictionaryStore>,
    ) {
        *self.cascade.lock().unwrap() = Some(CascadeDeps {
            nodes,
            document_meta,
            dictionary,
        });
    }
}

#[async_trait]
impl ProjectStore for FakeProjectStore {
    async fn list(&self, creator_id: Option<&str>) -> Result<Vec<Project>, StudioError> {
        let rows = self.rows.lock().unwrap();
        let mut out: Vec<Project> = rows
            .values()
            .filter(|p| creator_id.is_none_or(|c| p.creator.user_id == c))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.edited_at.cmp(&a.edited_at));
        Ok(out)
    }

    async fn get_optional(&self, id: i64) -> Result<Option<Project>, StudioError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn create(&self, new_project: NewProject) -> Result<Project, StudioError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|p| p.name == new_project.name) {
            return Err(StudioError::conflict("duplicate project name"));
        }
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let now = Utc::now();
        let project = Project {
            id: *next_id,
            name: new_project.name,
            description: new_project.description,
            creator: new_project.creator.clone(),
            editor: new_project.creator,
            created_at: now,
            edited_at: now,
        };
        rows.insert(project.id, project.clone());
        Ok(project)
    }

    async fn update(&self, id: i64, update: UpdateProject) -> Result<Project, StudioError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(name) = &update.name {
            if rows.values().any(|p| p.id != id && &p.name == name) {
                return Err(StudioError::conflict("duplicate project name"));
            }
        }
        let project = rows
            .get_mut(&id)
            .ok_or_else(|| StudioError::not_found("project not found"))?;
        if let Some(name) = update.name {
            project.name = name;
        }
        if let Some(description) = update.description {
            project.description = description;
        }
        project.editor = update.editor;
        project.edited_at = Utc::now();
        Ok(project.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StudioError> {
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn delete_cascade(&self, id: i64) -> Result<(), StudioError> {
        self.get(id).await?;
        let deps = self
            .cascade
            .lock()
            .unwrap()
            .clone()
            .expect("FakeProjectStore::delete_cascade called without wire_cascade");

        let nodes = deps.nodes.list_by_project(id).await?;
        for node in nodes {
            if let Some(document_id) = node.document_id {
                deps.document_meta.delete(document_id).await?;
            }
        }
        deps.nodes.delete_by_project(id).await?;
        deps.dictionary.delete_by_project(id).await?;
        self.delete(id).await
    }
}

#[derive(Default)]
pub struct FakeDocumentMetaStore {
    rows: Mutex<HashMap<i64, FunctionDocument>>,
    next_id: Mutex<i64>,
}

#[async_trait]
impl DocumentMetaStore for FakeDocumentMetaStore {
    async fn create(
        &self,
        function_node_id: Uuid,
        creator: Identity,
    ) -> Result<FunctionDocument, StudioError> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let now = Utc::now();
        let document = FunctionDocument {
            id: *next_id,
            function_node_id,
            creator: creator.clone(),
            editor: creator,
            created_at: now,
            edited_at: now,
        };
        self.rows
            .lock()
            .unwrap()
            .insert(document.id, document.clone());
        Ok(document)
    }

    async fn get_optional(&self, id: i64) -> Result<Option<FunctionDocument>, StudioError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_function_node(
        &self,
        function_node_id: Uuid,
    ) -> Result<Option<FunctionDocument>, StudioError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|d| d.function_node_id == function_node_id)
            .cloned())
    }

    async fn touch(&self, id: i64, editor: Identity) -> Result<(), StudioError> {
        let mut rows = self.rows.lock().unwrap();
        let document = rows
            .get_mut(&id)
            .ok_or_else(|| StudioError::not_found("document not found"))?;
        document.editor = editor;
        document.edited_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StudioError> {
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDocumentContentStore {
    rows: Mutex<HashMap<i64, DocumentContent>>,
}

#[async_trait]
impl DocumentContentStore for FakeDocumentContentStore {
    async fn get(&self, document_id: i64) -> Result<DocumentContent, StudioError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&document_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set(&self, document_id: i64, content: DocumentContent) -> Result<(), StudioError> {
        self.rows.lock().unwrap().insert(document_id, content);
        Ok(())
    }

    async fn patch(
        &self,
        document_id: i64,
        ops: &[PatchOp],
    ) -> Result<DocumentContent, StudioError> {
        let mut rows = self.rows.lock().unwrap();
        let current = rows.get(&document_id).cloned().unwrap_or_default();
        let patched = studio_json_patch::apply(current.as_value(), ops)?;
        let content = DocumentContent::from_value(patched)?;
        rows.insert(document_id, content.clone());
        Ok(content)
    }
}

#[derive(Default)]
pub struct FakeDictionaryStore {
    rows: Mutex<HashMap<i64, DictionaryEntry>>,
    next_id: Mutex<i64>,
}

#[async_trait]
impl DictionaryStore for FakeDictionaryStore {
    async fn list_by_project(&self, project_id: i64) -> Result<Vec<DictionaryEntry>, StudioError> {
        let rows = self.rows.lock().unwrap();
        let mut out: Vec<DictionaryEntry> = rows
            .values()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.term.cmp(&b.term));
        Ok(out)
    }

    async fn get_optional(&self, id: i64) -> Result<Option<DictionaryEntry>, StudioError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn create(
        &self,
        project_id: i64,
        term: String,
        definition: String,
    ) -> Result<DictionaryEntry, StudioError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .values()
            .any(|e| e.project_id == project_id && e.term == term)
        {
            return Err(StudioError::conflict("duplicate dictionary term"));
        }
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let entry = DictionaryEntry {
            id: *next_id,
            project_id,
            term,
            definition,
            created_at: Utc::now(),
        };
        rows.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn update(
        &self,
        id: i64,
        term: Option<String>,
        definition: Option<String>,
    ) -> Result<DictionaryEntry, StudioError> {
        let mut rows = self.rows.lock().unwrap();
        let project_id = rows
            .get(&id)
            .ok_or_else(|| StudioError::not_found("dictionary entry not found"))?
            .project_id;
        if let Some(term) = &term {
            if rows
                .values()
                .any(|e| e.id != id && e.project_id == project_id && &e.term == term)
            {
                return Err(StudioError::conflict("duplicate dictionary term"));
            }
        }
        let entry = rows.get_mut(&id).unwrap();
        if let Some(term) = term {
            entry.term = term;
        }
        if let Some(definition) = definition {
            entry.definition = definition;
        }
        Ok(entry.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StudioError> {
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn delete_by_project(&self, project_id: i64) -> Result<(), StudioError> {
        self.rows
            .lock()
            .unwrap()
            .retain(|_, e| e.project_id != project_id);
        Ok(())
    }
}
