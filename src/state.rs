//! Shared application state. Everything is an explicit constructed
//! dependency; the definition store is reloadable at runtime.

use crate::definition::DefinitionStore;
use crate::engine::Engine;
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub definitions: Arc<DefinitionStore>,
    pub engine: Arc<Engine>,
    /// Description document re-read by `/load`. When absent, reloads
    /// regenerate the description from the live catalog instead.
    pub definition_path: Option<PathBuf>,
    /// Raw predicate appended to the introspection column query.
    pub exclude_filter: Option<String>,
}
