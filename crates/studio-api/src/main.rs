#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use studio_api::{build_app, AppState};
use studio_service::{ContextAssemblyService, DictionaryService, DocumentService, ProjectService, TreeService};
use studio_store::{PgDictionaryStore, PgDocumentContentStore, PgDocumentMetaStore, PgNodeStore, PgProjectStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "studio-api", version, about = "Design-document studio backend")]
struct Args {
    /// Bind address.
    #[arg(long, default_value = "127.0.0.1:8090")]
    bind: String,

    /// Run pending database migrations on startup.
    #[arg(long)]
    migrate: bool,

    /// Enable debug-level logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("studio=debug")
    } else {
        EnvFilter::new("studio=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db_config = studio_db::DbConfig::from_env().context("load database config")?;
    let pool = db_config.connect().await.context("connect to database")?;

    if args.migrate {
        studio_db::run_migrations(&pool).await.context("run migrations")?;
    }

    let projects_store = Arc::new(PgProjectStore::new(pool.clone()));
    let nodes_store = Arc::new(PgNodeStore::new(pool.clone()));
    let document_meta_store = Arc::new(PgDocumentMetaStore::new(pool.clone()));
    let document_content_store = Arc::new(PgDocumentContentStore::new(pool.clone()));
    let dictionary_store = Arc::new(PgDictionaryStore::new(pool.clone()));

    let documents = Arc::new(DocumentService::new(
        document_content_store.clone(),
        document_meta_store.clone(),
        nodes_store.clone(),
    ));
    let tree = Arc::new(TreeService::new(
        nodes_store.clone(),
        projects_store.clone(),
        document_meta_store,
    ));
    let context = Arc::new(ContextAssemblyService::new(
        nodes_store.clone(),
        document_content_store.clone(),
    ));
    let projects = Arc::new(ProjectService::new(projects_store));
    let dictionary = Arc::new(DictionaryService::new(dictionary_store));

    let state = Arc::new(AppState {
        projects,
        tree,
        documents,
        context,
        dictionary,
    });

    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("bind {}", args.bind))?;
    info!(bind = %args.bind, "studio-api listening");

    axum::serve(listener, app).await.context("serve")
}
