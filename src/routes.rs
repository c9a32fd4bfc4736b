//! Router assembly: explicit service routes plus the catch-all dispatch.

use crate::handlers::{common, describe, rest};
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::limit::RequestBodyLimitLayer;

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(common::health))
        .route("/ready", get(common::ready))
        .route("/version", get(common::version))
        .route("/openapi.yaml", get(describe::openapi_yaml))
        .route("/openapi.json", get(describe::openapi_json))
        .route("/load", get(describe::reload))
        .fallback(rest::dispatch)
        .layer(RequestBodyLimitLayer::new(rest::BODY_LIMIT))
        .with_state(state)
}
