//! Catch-all dispatch: every request no explicit route claims is translated
//! by the engine. The handler only shapes the HTTP request into an
//! `EngineRequest`; all semantics live behind it.

use crate::engine::EngineRequest;
use crate::error::ApiError;
use crate::response::Envelope;
use crate::state::AppState;
use axum::{
    body::to_bytes,
    extract::{Query, Request, State},
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

/// Request body cap, matched by the router's body limit layer.
pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

pub async fn dispatch(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    req: Request,
) -> Json<Envelope> {
    let method = req.method().to_string();
    let url = req.uri().to_string();
    let path = req.uri().path().to_string();

    let body = match read_body(req).await {
        Ok(body) => body,
        Err(err) => return Json(Envelope::failure(&method, &url, &err)),
    };

    let engine_req = EngineRequest {
        method,
        path,
        url,
        query,
        body,
    };
    Json(state.engine.process(&engine_req).await)
}

async fn read_body(req: Request) -> Result<Option<Value>, ApiError> {
    let bytes = to_bytes(req.into_body(), BODY_LIMIT)
        .await
        .map_err(|e| ApiError::InvalidBody(format!("could not read request body: {}", e)))?;
    if bytes.is_empty() {
        return Ok(None);
    }
    let value = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::InvalidBody(format!("request body is not valid JSON: {}", e)))?;
    Ok(Some(value))
}
