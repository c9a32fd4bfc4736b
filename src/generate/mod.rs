//! Description generation from a live database catalog.

pub mod catalog;
pub mod openapi;

pub use catalog::{load_catalog, ColumnRecord, DatabaseCatalog, RelationRecord, TableColumns};
pub use openapi::{build_document, generate};
