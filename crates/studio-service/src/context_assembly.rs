//! Context-assembly service (spec.md §4.4 C8): builds the
//! ancestors/self-plus-descendants slice an external AI coding agent
//! consumes to ground code generation on an accurate specification.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use studio_domain::ProjectNode;
use studio_error::StudioError;
use studio_store::node::NodeStore;
use studio_store::DocumentContentStore;
use uuid::Uuid;

/// One node in a context-assembly slice, with its document (if any) in both
/// raw and rendered form.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    /// The node itself.
    pub node: ProjectNode,
    /// Raw document content, present iff `node.document_id` is non-null.
    pub document: Option<Value>,
    /// Readable-text rendering of `document`, present under the same
    /// condition.
    pub document_text: Option<String>,
}

/// The payload `application_detail` returns: ancestors root-first, and the
/// target node plus its descendants in `(path, sort)` order
/// (spec.md §4.4).
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    /// Ancestors of the target node, root-first.
    pub context: Vec<Entry>,
    /// The target node, then its descendants in `(path, sort)` order.
    pub content_to_develop: Vec<Entry>,
}

/// Builds [`ApplicationDetail`] slices over [`NodeStore`] and
/// [`DocumentContentStore`], rendering each document's readable text via
/// `studio_render` (spec.md §4.4 C8/C9).
pub struct ContextAssemblyService {
    nodes: Arc<dyn NodeStore>,
    content: Arc<dyn DocumentContentStore>,
}

impl ContextAssemblyService {
    /// Build a service over the given stores.
    #[must_use]
    pub fn new(nodes: Arc<dyn NodeStore>, content: Arc<dyn DocumentContentStore>) -> Self {
        Self { nodes, content }
    }

    /// Assemble the context/content-to-develop slice for `node_id`
    /// (spec.md §4.4 algorithm steps 1-5).
    pub async fn application_detail(
        &self,
        node_id: Uuid,
    ) -> Result<ApplicationDetail, StudioError> {
        let target = self.nodes.get(node_id).await?;

        let mut ancestors = Vec::new();
        let mut cursor = target.parent_id;
        while let Some(parent_id) = cursor {
            let parent = self.nodes.get(parent_id).await?;
            cursor = parent.parent_id;
            ancestors.push(parent);
        }
        ancestors.reverse();

        let descendants = self.nodes.descendants(node_id).await?;

        let mut context = Vec::with_capacity(ancestors.len());
        for node in ancestors {
            context.push(self.build_entry(node).await?);
        }

        let mut content_to_develop = Vec::with_capacity(1 + descendants.len());
        content_to_develop.push(self.build_entry(target).await?);
        for node in descendants {
            content_to_develop.push(self.build_entry(node).await?);
        }

        Ok(ApplicationDetail {
            context,
            content_to_develop,
        })
    }

    async fn build_entry(&self, node: ProjectNode) -> Result<Entry, StudioError> {
        let Some(document_id) = node.document_id else {
            return Ok(Entry {
                node,
                document: None,
                document_text: None,
            });
        };
        let content = self.content.get(document_id).await?;
        let value = content.into_value();
        let document_text = studio_render::render_document(&value);
        Ok(Entry {
            node,
            document: Some(value),
            document_text: Some(document_text),
        })
    }
}
