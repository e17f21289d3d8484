//! Document service (spec.md §4.3 C7): wraps the content store with
//! document-existence checks, and orchestrates idempotent document
//! initialisation for newly created function nodes.

use std::sync::Arc;

use studio_domain::document::{DocumentContent, FunctionDocument};
use studio_domain::identity::Identity;
use studio_error::StudioError;
use studio_json_patch::PatchOp;
use studio_store::{DocumentContentStore, DocumentMetaStore, NodeStore};
use uuid::Uuid;

/// Orchestrates [`DocumentContentStore`] and [`DocumentMetaStore`], adding
/// the existence checks and write-back-to-node behaviour spec.md §4.3/§4.2
/// leave implicit in the raw stores.
pub struct DocumentService {
    content: Arc<dyn DocumentContentStore>,
    meta: Arc<dyn DocumentMetaStore>,
    nodes: Arc<dyn NodeStore>,
}

impl DocumentService {
    /// Build a service over the given stores.
    #[must_use]
    pub fn new(
        content: Arc<dyn DocumentContentStore>,
        meta: Arc<dyn DocumentMetaStore>,
        nodes: Arc<dyn NodeStore>,
    ) -> Self {
        Self {
            content,
            meta,
            nodes,
        }
    }

    /// Fetch a document's content, failing with `NotFound` if no document
    /// with this id has been created (spec.md §4.3 `get_content`).
    pub async fn get_content(&self, document_id: i64) -> Result<DocumentContent, StudioError> {
        self.meta.get(document_id).await?;
        self.content.get(document_id).await
    }

    /// Apply a JSON Patch to a document's content, failing with `NotFound`
    /// if the document doesn't exist, recording `editor` as the document's
    /// last editor on success (spec.md §4.3 `patch_content`).
    pub async fn patch_content(
        &self,
        document_id: i64,
        ops: &[PatchOp],
        editor: Identity,
    ) -> Result<DocumentContent, StudioError> {
        self.meta.get(document_id).await?;
        let content = self.content.patch(document_id, ops).await?;
        self.meta.touch(document_id, editor).await?;
        Ok(content)
    }

    /// Idempotently ensure a function node has a document: if one already
    /// exists for `function_node_id`, return it unchanged; otherwise create
    /// metadata and write `document_id` back onto the node (spec.md §4.3
    /// `init_document`). Function-node creation itself goes through
    /// [`studio_store::node::NodeStore::create_function`], which performs
    /// the equivalent steps atomically as part of the node insert; this
    /// method exists for repairing a node whose document is missing.
    pub async fn init_document(
        &self,
        function_node_id: Uuid,
        creator: Identity,
    ) -> Result<FunctionDocument, StudioError> {
        if let Some(existing) = self.meta.get_by_function_node(function_node_id).await? {
            return Ok(existing);
        }
        let document = self.meta.create(function_node_id, creator).await?;
        self.nodes
            .set_document_id(function_node_id, document.id)
            .await?;
        Ok(document)
    }
}
