//! Declarative API description: document types, codec, and the runtime store.

pub mod document;
pub mod store;

pub use document::{parse_document, render_document, ApiDocument, DocFormat, LinkObject, OperationObject};
pub use store::{
    ColumnDef, DefinitionSnapshot, DefinitionStore, MethodDef, RouteDef, SemanticType, TableSchema,
};
