//! Thin HTTP/JSON adapter over the studio service layer (spec.md §1, §6).
//!
//! Routes forward to `studio-service` verbatim: no business rules live here,
//! only request decoding, caller-identity extraction for `studio-context`,
//! and `StudioError` → HTTP status/body translation.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use axum::extract::{Path as AxPath, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use studio_context::CallerContext;
use studio_domain::identity::Identity;
use studio_domain::{DictionaryEntry, DocumentContent, Project, ProjectNode};
use studio_error::{StudioError, StudioErrorBody};
use studio_json_patch::PatchOp;
use studio_service::{
    ApplicationDetail, ContextAssemblyService, DictionaryService, DocumentService, ProjectService,
    TreeNode, TreeService,
};
use uuid::Uuid;

/// Shared application state, handed to every route via axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    /// Project CRUD and cascading delete (spec.md §4.5, C2).
    pub projects: Arc<ProjectService>,
    /// Node tree orchestration (spec.md §4.2, C6).
    pub tree: Arc<TreeService>,
    /// Document content access (spec.md §4.3, C7).
    pub documents: Arc<DocumentService>,
    /// Context-assembly for the AI coding agent (spec.md §4.4, C8).
    pub context: Arc<ContextAssemblyService>,
    /// Dictionary term/definition CRUD.
    pub dictionary: Arc<DictionaryService>,
}

/// A `StudioError` wrapped for `axum`'s `IntoResponse`, mapping
/// [`ErrorKind`](studio_error::ErrorKind) to the HTTP status table in
/// spec.md §6.
pub struct ApiError(StudioError);

impl From<StudioError> for ApiError {
    fn from(err: StudioError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body: StudioErrorBody = (&self.0).into();
        (status, Json(body)).into_response()
    }
}

/// Build the `axum` router wiring every route in spec.md §6 onto `state`.
#[must_use]
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{id}",
            get(get_project).patch(update_project).delete(delete_project),
        )
        .route("/projects/{id}/nodes/tree", get(get_tree))
        .route("/nodes/application", post(create_application_node))
        .route("/nodes/page", post(create_page_node))
        .route("/nodes/function", post(create_function_node))
        .route(
            "/nodes/{id}",
            patch(update_node).delete(delete_node),
        )
        .route("/nodes/{id}/move", post(move_node))
        .route("/dictionary", get(list_dictionary).post(create_dictionary_entry))
        .route(
            "/dictionary/{id}",
            patch(update_dictionary_entry).delete(delete_dictionary_entry),
        )
        .route(
            "/documents/{document_id}",
            get(get_document).put(update_document),
        )
        .route(
            "/internal/tool-server/nodes/{id}/application-detail",
            get(application_detail),
        )
        .layer(middleware::from_fn(caller_context_middleware))
        .with_state(state)
}

/// Extracts caller identity headers (`x-user-id`, `x-user-name`,
/// `authorization`) and runs the rest of the request inside a
/// [`CallerContext`] scope (spec.md §4.6, C10).
async fn caller_context_middleware(headers: HeaderMap, req: Request, next: Next) -> Response {
    let user_id = header_str(&headers, "x-user-id");
    let user_name = header_str(&headers, "x-user-name");
    let token = header_str(&headers, "authorization");

    let mut ctx = CallerContext::new(user_id, user_name);
    if let Some(token) = token {
        ctx = ctx.with_token(token);
    }
    ctx.scope(next.run(req)).await
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn caller_identity() -> Identity {
    Identity::new(studio_context::user_id(), studio_context::user_name())
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListProjectsQuery {
    creator_id: Option<String>,
}

async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListProjectsQuery>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state.projects.list(q.creator_id.as_deref()).await?;
    Ok(Json(projects))
}

async fn get_project(
    State(state): State<Arc<AppState>>,
    AxPath(id): AxPath<i64>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.projects.get(id).await?))
}

#[derive(Debug, Deserialize)]
struct CreateProjectRequest {
    name: String,
    description: Option<String>,
}

async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state
        .projects
        .create(req.name, req.description, caller_identity())
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

#[derive(Debug, Deserialize)]
struct UpdateProjectRequest {
    name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    description: Option<Option<String>>,
}

async fn update_project(
    State(state): State<Arc<AppState>>,
    AxPath(id): AxPath<i64>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    let project = state
        .projects
        .update(id, req.name, req.description, caller_identity())
        .await?;
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<Arc<AppState>>,
    AxPath(id): AxPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.projects.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct TreeNodeResponse {
    id: Uuid,
    project_id: i64,
    parent_id: Option<Uuid>,
    node_type: studio_domain::NodeType,
    name: String,
    description: Option<String>,
    document_id: Option<i64>,
    children: Vec<TreeNodeResponse>,
}

impl From<TreeNode> for TreeNodeResponse {
    fn from(tree: TreeNode) -> Self {
        Self {
            id: tree.node.id,
            project_id: tree.node.project_id,
            parent_id: tree.node.parent_id,
            node_type: tree.node.node_type,
            name: tree.node.name,
            description: tree.node.description,
            document_id: tree.node.document_id,
            children: tree.children.into_iter().map(TreeNodeResponse::from).collect(),
        }
    }
}

async fn get_tree(
    State(state): State<Arc<AppState>>,
    AxPath(project_id): AxPath<i64>,
) -> Result<Json<Option<TreeNodeResponse>>, ApiError> {
    let tree = state.tree.tree(project_id).await?;
    Ok(Json(tree.map(TreeNodeResponse::from)))
}

#[derive(Debug, Deserialize)]
struct CreateApplicationNodeRequest {
    project_id: i64,
    name: String,
    description: Option<String>,
}

async fn create_application_node(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateApplicationNodeRequest>,
) -> Result<(StatusCode, Json<ProjectNode>), ApiError> {
    let node = state
        .tree
        .create_application(req.project_id, req.name, req.description, caller_identity())
        .await?;
    Ok((StatusCode::CREATED, Json(node)))
}

#[derive(Debug, Deserialize)]
struct CreateChildNodeRequest {
    project_id: i64,
    parent_id: Uuid,
    name: String,
    description: Option<String>,
}

async fn create_page_node(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateChildNodeRequest>,
) -> Result<(StatusCode, Json<ProjectNode>), ApiError> {
    let node = state
        .tree
        .create_page(
            req.project_id,
            req.parent_id,
            req.name,
            req.description,
            caller_identity(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(node)))
}

async fn create_function_node(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateChildNodeRequest>,
) -> Result<(StatusCode, Json<ProjectNode>), ApiError> {
    let node = state
        .tree
        .create_function(
            req.project_id,
            req.parent_id,
            req.name,
            req.description,
            caller_identity(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(node)))
}

#[derive(Debug, Deserialize)]
struct UpdateNodeRequest {
    name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    description: Option<Option<String>>,
}

async fn update_node(
    State(state): State<Arc<AppState>>,
    AxPath(id): AxPath<Uuid>,
    Json(req): Json<UpdateNodeRequest>,
) -> Result<Json<ProjectNode>, ApiError> {
    let node = state
        .tree
        .update(id, req.name, req.description, caller_identity())
        .await?;
    Ok(Json(node))
}

#[derive(Debug, Deserialize)]
struct MoveNodeRequest {
    new_parent_id: Option<Uuid>,
    predecessor_id: Option<Uuid>,
}

async fn move_node(
    State(state): State<Arc<AppState>>,
    AxPath(id): AxPath<Uuid>,
    Json(req): Json<MoveNodeRequest>,
) -> Result<Json<ProjectNode>, ApiError> {
    let node = state
        .tree
        .move_node(id, req.new_parent_id, req.predecessor_id, caller_identity())
        .await?;
    Ok(Json(node))
}

async fn delete_node(
    State(state): State<Arc<AppState>>,
    AxPath(id): AxPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.tree.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Dictionary
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListDictionaryQuery {
    project_id: i64,
}

async fn list_dictionary(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListDictionaryQuery>,
) -> Result<Json<Vec<DictionaryEntry>>, ApiError> {
    Ok(Json(state.dictionary.list_by_project(q.project_id).await?))
}

#[derive(Debug, Deserialize)]
struct CreateDictionaryEntryRequest {
    project_id: i64,
    term: String,
    definition: String,
}

async fn create_dictionary_entry(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDictionaryEntryRequest>,
) -> Result<(StatusCode, Json<DictionaryEntry>), ApiError> {
    let entry = state
        .dictionary
        .create(req.project_id, req.term, req.definition)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Debug, Deserialize)]
struct UpdateDictionaryEntryRequest {
    term: Option<String>,
    definition: Option<String>,
}

async fn update_dictionary_entry(
    State(state): State<Arc<AppState>>,
    AxPath(id): AxPath<i64>,
    Json(req): Json<UpdateDictionaryEntryRequest>,
) -> Result<Json<DictionaryEntry>, ApiError> {
    let entry = state.dictionary.update(id, req.term, req.definition).await?;
    Ok(Json(entry))
}

async fn delete_dictionary_entry(
    State(state): State<Arc<AppState>>,
    AxPath(id): AxPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.dictionary.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

async fn get_document(
    State(state): State<Arc<AppState>>,
    AxPath(document_id): AxPath<i64>,
) -> Result<Json<DocumentContent>, ApiError> {
    Ok(Json(state.documents.get_content(document_id).await?))
}

#[derive(Debug, Serialize)]
struct UpdateDocumentResponse {
    success: bool,
}

async fn update_document(
    State(state): State<Arc<AppState>>,
    AxPath(document_id): AxPath<i64>,
    Json(ops): Json<Vec<PatchOp>>,
) -> Result<Json<UpdateDocumentResponse>, ApiError> {
    state
        .documents
        .patch_content(document_id, &ops, caller_identity())
        .await?;
    Ok(Json(UpdateDocumentResponse { success: true }))
}

// ---------------------------------------------------------------------------
// Internal: context assembly for the AI coding agent
// ---------------------------------------------------------------------------

async fn application_detail(
    State(state): State<Arc<AppState>>,
    AxPath(id): AxPath<Uuid>,
) -> Result<Json<ApplicationDetail>, ApiError> {
    Ok(Json(state.context.application_detail(id).await?))
}

/// `serde_with`-style helper so `Some(null)` round-trips as `Some(None)` for
/// the description-clearing fields, while an absent key stays `None`
/// (distinguishing "don't touch" from "clear it").
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
