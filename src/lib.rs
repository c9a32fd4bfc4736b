//! restbridge: schema-driven REST to SQL translation engine for PostgreSQL.

pub mod definition;
pub mod engine;
pub mod error;
pub mod executor;
pub mod filter;
pub mod generate;
pub mod handlers;
pub mod reshape;
pub mod response;
pub mod routes;
pub mod sql;
pub mod state;
pub mod trigger;

pub use definition::{parse_document, render_document, ApiDocument, DefinitionSnapshot, DefinitionStore, DocFormat};
pub use engine::{normalize_path, Engine, EngineRequest};
pub use error::{ApiError, DefinitionError, FilterError};
pub use executor::{PgExecutor, StatementExecutor};
pub use generate::{build_document, generate, DatabaseCatalog};
pub use response::Envelope;
pub use routes::app_router;
pub use state::AppState;
pub use trigger::TriggerRegistry;
