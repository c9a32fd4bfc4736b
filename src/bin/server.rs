//! Server binary: env config, tracing setup, pool, definition bootstrap.
//!
//! The Definition Store is seeded either from a document file
//! (`DEFINITION_PATH`) or, when none is configured, from the generator run
//! against the live catalog.

use restbridge::{
    app_router, build_document, AppState, DefinitionStore, Engine, PgExecutor, TriggerRegistry,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("restbridge=info".parse()?))
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/restbridge".into());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let definition_path = std::env::var("DEFINITION_PATH").ok().map(PathBuf::from);
    let exclude_filter = std::env::var("EXCLUDE_FILTER").ok();

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let definitions = Arc::new(DefinitionStore::default());
    match &definition_path {
        Some(path) => {
            let text = tokio::fs::read_to_string(path).await?;
            definitions.load_text(&text)?;
            tracing::info!(path = %path.display(), "definition loaded from file");
        }
        None => {
            let catalog = restbridge::generate::load_catalog(&pool, exclude_filter.as_deref()).await?;
            definitions.load_document(&build_document(&catalog))?;
            tracing::info!(tables = catalog.tables.len(), "definition generated from catalog");
        }
    }

    let engine = Arc::new(Engine::new(
        definitions.clone(),
        Arc::new(TriggerRegistry::default()),
        Arc::new(PgExecutor::new(pool.clone())),
    ));
    let state = AppState {
        pool,
        definitions,
        engine,
        definition_path,
        exclude_filter,
    };

    let app = app_router(state);
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
