//! Description endpoints: serve the generated document and reload the store.

use crate::definition::DocFormat;
use crate::error::{ApiError, DefinitionError};
use crate::generate::{build_document, generate, load_catalog};
use crate::response::Envelope;
use crate::state::AppState;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub async fn openapi_yaml(State(state): State<AppState>) -> Response {
    serve_document(&state, DocFormat::Yaml, "application/yaml", "/openapi.yaml").await
}

pub async fn openapi_json(State(state): State<AppState>) -> Response {
    serve_document(&state, DocFormat::Json, "application/json", "/openapi.json").await
}

async fn serve_document(
    state: &AppState,
    format: DocFormat,
    content_type: &'static str,
    url: &str,
) -> Response {
    match generate(&state.pool, state.exclude_filter.as_deref(), format).await {
        Ok(text) => ([(header::CONTENT_TYPE, content_type)], text).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "description generation failed");
            Json(Envelope::failure("GET", url, &err)).into_response()
        }
    }
}

/// Re-read the description document and install a fresh snapshot. A failed
/// reload leaves the running snapshot in place.
pub async fn reload(State(state): State<AppState>) -> Json<Envelope> {
    match reload_definitions(&state).await {
        Ok(()) => Json(Envelope::success("GET", "/load", json!({}), None)),
        Err(err) => {
            tracing::error!(error = %err, "definition reload failed");
            Json(Envelope::failure("GET", "/load", &err))
        }
    }
}

async fn reload_definitions(state: &AppState) -> Result<(), ApiError> {
    match &state.definition_path {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| DefinitionError::Read(format!("{}: {}", path.display(), e)))?;
            state.definitions.load_text(&text)?;
        }
        None => {
            let catalog = load_catalog(&state.pool, state.exclude_filter.as_deref()).await?;
            state.definitions.load_document(&build_document(&catalog))?;
        }
    }
    tracing::info!("definition snapshot installed");
    Ok(())
}
