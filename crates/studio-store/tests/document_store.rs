//! Integration tests for [`PgDocumentMetaStore`] and
//! [`PgDocumentContentStore`] against a real, per-test Postgres schema
//! (spec.md §4.2 `create_function`, §4.3 C5).

use serde_json::json;
use sqlx::PgPool;
use studio_domain::document::DocumentContent;
use studio_domain::{Identity, NodeType};
use studio_json_patch::PatchOp;
use studio_store::node::{NewNode, NodeStore, PgNodeStore};
use studio_store::{
    DocumentContentStore, DocumentMetaStore, NewProject, PgDocumentContentStore,
    PgDocumentMetaStore, PgProjectStore, ProjectStore,
};

fn identity(user_id: &str) -> Identity {
    Identity::new(user_id, format!("{user_id} name"))
}

async fn seed_function_node(pool: &PgPool) -> uuid::Uuid {
    let project_id = PgProjectStore::new(pool.clone())
        .create(NewProject {
            name: "Seed".into(),
            description: None,
            creator: identity("u1"),
        })
        .await
        .unwrap()
        .id;
    let nodes = PgNodeStore::new(pool.clone());
    let root = nodes
        .create(NewNode {
            project_id,
            parent_id: None,
            node_type: NodeType::Application,
            name: "App".into(),
            description: None,
            sort: 0,
            creator: identity("u1"),
        })
        .await
        .unwrap();
    let page = nodes
        .create(NewNode {
            project_id,
            parent_id: Some(root.id),
            node_type: NodeType::Page,
            name: "Home".into(),
            description: None,
            sort: 0,
            creator: identity("u1"),
        })
        .await
        .unwrap();
    nodes
        .create(NewNode {
            project_id,
            parent_id: Some(page.id),
            node_type: NodeType::Function,
            name: "Submit".into(),
            description: None,
            sort: 0,
            creator: identity("u1"),
        })
        .await
        .unwrap()
        .id
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_initialises_empty_content_row(pool: PgPool) {
    let function_node_id = seed_function_node(&pool).await;
    let meta = PgDocumentMetaStore::new(pool.clone());
    let content = PgDocumentContentStore::new(pool);

    let doc = meta.create(function_node_id, identity("u1")).await.unwrap();
    assert_eq!(doc.function_node_id, function_node_id);

    let loaded = content.get(doc.id).await.unwrap();
    assert_eq!(loaded.as_value(), &json!({}));
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_by_function_node_finds_existing_document(pool: PgPool) {
    let function_node_id = seed_function_node(&pool).await;
    let meta = PgDocumentMetaStore::new(pool);

    let created = meta.create(function_node_id, identity("u1")).await.unwrap();
    let found = meta
        .get_by_function_node(function_node_id)
        .await
        .unwrap()
        .expect("document should exist");
    assert_eq!(found.id, created.id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn patch_applies_atomically_and_persists(pool: PgPool) {
    let function_node_id = seed_function_node(&pool).await;
    let meta = PgDocumentMetaStore::new(pool.clone());
    let content = PgDocumentContentStore::new(pool);

    let doc = meta.create(function_node_id, identity("u1")).await.unwrap();

    let patched = content
        .patch(
            doc.id,
            &[PatchOp::Add {
                path: "/title".into(),
                value: json!("Submit form"),
            }],
        )
        .await
        .unwrap();
    assert_eq!(patched.as_value(), &json!({"title": "Submit form"}));

    let reloaded = content.get(doc.id).await.unwrap();
    assert_eq!(reloaded.as_value(), &json!({"title": "Submit form"}));
}

#[sqlx::test(migrations = "../../migrations")]
async fn patch_failure_leaves_content_untouched(pool: PgPool) {
    let function_node_id = seed_function_node(&pool).await;
    let meta = PgDocumentMetaStore::new(pool.clone());
    let content = PgDocumentContentStore::new(pool);

    let doc = meta.create(function_node_id, identity("u1")).await.unwrap();
    content
        .set(
            doc.id,
            DocumentContent::from_value(json!({"title": "Original"})).unwrap(),
        )
        .await
        .unwrap();

    let err = content
        .patch(
            doc.id,
            &[
                PatchOp::Replace {
                    path: "/title".into(),
                    value: json!("Changed"),
                },
                PatchOp::Remove {
                    path: "/missing".into(),
                },
            ],
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, studio_error::ErrorKind::ValidationError);

    let unchanged = content.get(doc.id).await.unwrap();
    assert_eq!(unchanged.as_value(), &json!({"title": "Original"}));
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_meta_cascades_to_content(pool: PgPool) {
    let function_node_id = seed_function_node(&pool).await;
    let meta = PgDocumentMetaStore::new(pool.clone());
    let content = PgDocumentContentStore::new(pool.clone());

    let doc = meta.create(function_node_id, identity("u1")).await.unwrap();
    meta.delete(doc.id).await.unwrap();

    // The content row is gone too (FK cascade), so `get` reports the
    // documented empty-object default rather than erroring.
    let after = content.get(doc.id).await.unwrap();
    assert_eq!(after.as_value(), &json!({}));

    let row: Option<(i64,)> =
        sqlx::query_as("SELECT document_id FROM document_content WHERE document_id = $1")
            .bind(doc.id)
            .fetch_optional(&pool)
            .await
            .unwrap();
    assert!(row.is_none());
}
