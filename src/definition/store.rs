//! Definition Store: a case-normalized snapshot of routes, links, and column
//! schemas, plus the reloadable holder that swaps whole snapshots atomically.

use crate::definition::document::{ApiDocument, LinkObject, OperationObject};
use crate::error::{ApiError, DefinitionError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Semantic column type from the fixed SQL-type-to-JSON-type mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SemanticType {
    Integer,
    Float,
    String,
}

impl SemanticType {
    pub fn parse(s: &str) -> SemanticType {
        match s {
            "integer" => SemanticType::Integer,
            "number" => SemanticType::Float,
            _ => SemanticType::String,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ColumnDef {
    pub name: String,
    pub semantic: SemanticType,
}

/// Ordered column schema for one table. Order follows the document, which in
/// turn follows the catalog's declared column order.
#[derive(Clone, Debug, Default)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Case-insensitive column lookup returning the canonical definition.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Per-method route metadata. The table is the operation's first tag.
#[derive(Clone, Debug)]
pub struct MethodDef {
    pub table: String,
}

#[derive(Clone, Debug, Default)]
pub struct RouteDef {
    /// Lower-cased HTTP method -> metadata.
    pub methods: HashMap<String, MethodDef>,
}

/// One immutable load of a description document. Constructed whole, never
/// mutated; replaced as a unit on reload.
#[derive(Debug, Default)]
pub struct DefinitionSnapshot {
    /// Lower-cased path -> route.
    routes: HashMap<String, RouteDef>,
    /// Lower-cased `table.relation` -> link.
    links: HashMap<String, LinkObject>,
    /// Lower-cased table name -> schema (canonical name kept inside).
    schemas: HashMap<String, TableSchema>,
}

impl DefinitionSnapshot {
    pub fn load(doc: &ApiDocument) -> Result<DefinitionSnapshot, DefinitionError> {
        let mut schemas = HashMap::new();
        for (table, schema_value) in &doc.components.schemas {
            let mut columns = Vec::new();
            if let Some(props) = schema_value.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    let semantic = prop
                        .get("type")
                        .and_then(Value::as_str)
                        .map(SemanticType::parse)
                        .unwrap_or(SemanticType::String);
                    columns.push(ColumnDef {
                        name: name.clone(),
                        semantic,
                    });
                }
            }
            schemas.insert(
                table.to_lowercase(),
                TableSchema {
                    table: table.clone(),
                    columns,
                },
            );
        }

        let mut routes: HashMap<String, RouteDef> = HashMap::new();
        for (path, item) in &doc.paths {
            let key = path.to_lowercase();
            if routes.contains_key(&key) {
                // Last write wins; the document owner should rename one of them.
                tracing::warn!(path = %path, key = %key, "route key collision after case normalization");
            }
            let mut route = RouteDef::default();
            let Some(methods) = item.as_object() else { continue };
            for (method, op_value) in methods {
                let op: OperationObject = serde_json::from_value(op_value.clone())
                    .map_err(|e| DefinitionError::Parse(e.to_string()))?;
                let table = op.tags.first().cloned().ok_or_else(|| DefinitionError::MissingTable {
                    path: path.clone(),
                    method: method.clone(),
                })?;
                if !schemas.contains_key(&table.to_lowercase()) {
                    return Err(DefinitionError::UnknownRouteTable {
                        path: path.clone(),
                        method: method.clone(),
                        table,
                    });
                }
                route.methods.insert(method.to_lowercase(), MethodDef { table });
            }
            routes.insert(key, route);
        }

        let mut links = HashMap::new();
        for (name, link_value) in &doc.links {
            let link: LinkObject = serde_json::from_value(link_value.clone())
                .map_err(|e| DefinitionError::Parse(e.to_string()))?;
            if !schemas.contains_key(&link.result_table.to_lowercase()) {
                return Err(DefinitionError::UnknownResultTable {
                    link: name.clone(),
                    table: link.result_table,
                });
            }
            links.insert(name.to_lowercase(), link);
        }

        Ok(DefinitionSnapshot {
            routes,
            links,
            schemas,
        })
    }

    /// Resolve a normalized (lower-cased, `{id}`-substituted) path and method.
    pub fn resolve(&self, method: &str, route_key: &str) -> Result<&MethodDef, ApiError> {
        let route = self.routes.get(route_key).ok_or(ApiError::RouteNotFound)?;
        route
            .methods
            .get(&method.to_lowercase())
            .ok_or_else(|| ApiError::MethodNotAllowed(method.to_lowercase()))
    }

    pub fn schema(&self, table: &str) -> Option<&TableSchema> {
        self.schemas.get(&table.to_lowercase())
    }

    /// Look up the link for `?include=<relation>` on a base table.
    pub fn link(&self, table: &str, relation: &str) -> Option<&LinkObject> {
        self.links.get(&format!("{}.{}", table, relation).to_lowercase())
    }
}

/// Shared, read-mostly holder. Readers clone the inner `Arc`; a reload builds
/// a complete snapshot and swaps the `Arc` under the write lock, so in-flight
/// requests keep the snapshot they started with.
#[derive(Debug)]
pub struct DefinitionStore {
    current: RwLock<Arc<DefinitionSnapshot>>,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        DefinitionStore {
            current: RwLock::new(Arc::new(DefinitionSnapshot::default())),
        }
    }
}

impl DefinitionStore {
    pub fn new(snapshot: DefinitionSnapshot) -> Self {
        DefinitionStore {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn snapshot(&self) -> Arc<DefinitionSnapshot> {
        self.current.read().expect("definition lock poisoned").clone()
    }

    pub fn install(&self, snapshot: DefinitionSnapshot) {
        let mut guard = self.current.write().expect("definition lock poisoned");
        *guard = Arc::new(snapshot);
    }

    /// Parse and install a description document from text. On any failure the
    /// prior snapshot stays installed.
    pub fn load_text(&self, text: &str) -> Result<(), DefinitionError> {
        let doc = crate::definition::document::parse_document(text)?;
        self.load_document(&doc)
    }

    pub fn load_document(&self, doc: &ApiDocument) -> Result<(), DefinitionError> {
        let snapshot = DefinitionSnapshot::load(doc)?;
        self.install(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::document::parse_document;

    fn sample_doc() -> ApiDocument {
        let text = r#"
openapi: 3.0.0
paths:
  /Case:
    get:
      tags: [Case]
    post:
      tags: [Case]
  /Case/{ID}:
    get:
      tags: [Case]
    delete:
      tags: [Case]
links:
  Case.Status:
    x-childTable: Status
    x-childColumn: CaseID
    x-parentTable: Case
    x-parentColumn: ID
    x-resultTable: Status
    x-level: 0
components:
  schemas:
    Case:
      type: object
      properties:
        ID: { type: integer }
        Name: { type: string }
    Status:
      type: object
      properties:
        ID: { type: integer }
        CaseID: { type: integer }
"#;
        parse_document(text).unwrap()
    }

    #[test]
    fn resolves_routes_case_insensitively() {
        let snap = DefinitionSnapshot::load(&sample_doc()).unwrap();
        let def = snap.resolve("GET", "/case").unwrap();
        assert_eq!(def.table, "Case");
        let def = snap.resolve("delete", "/case/{id}").unwrap();
        assert_eq!(def.table, "Case");
    }

    #[test]
    fn unknown_path_and_method_are_distinct_errors() {
        let snap = DefinitionSnapshot::load(&sample_doc()).unwrap();
        assert!(matches!(snap.resolve("get", "/nope"), Err(ApiError::RouteNotFound)));
        assert!(matches!(
            snap.resolve("patch", "/case"),
            Err(ApiError::MethodNotAllowed(m)) if m == "patch"
        ));
    }

    #[test]
    fn schema_order_and_lookup() {
        let snap = DefinitionSnapshot::load(&sample_doc()).unwrap();
        let schema = snap.schema("case").unwrap();
        let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ID", "Name"]);
        assert_eq!(schema.column("name").unwrap().name, "Name");
        assert_eq!(schema.column("ID").unwrap().semantic, SemanticType::Integer);
    }

    #[test]
    fn link_lookup_is_case_insensitive() {
        let snap = DefinitionSnapshot::load(&sample_doc()).unwrap();
        let link = snap.link("case", "status").unwrap();
        assert_eq!(link.result_table, "Status");
        assert!(!link.is_to_one());
    }

    #[test]
    fn link_to_unknown_table_fails_load() {
        let mut doc = sample_doc();
        doc.links.insert(
            "Case.Ghost".into(),
            serde_json::json!({
                "x-childTable": "Ghost", "x-childColumn": "CaseID",
                "x-parentTable": "Case", "x-parentColumn": "ID",
                "x-resultTable": "Ghost", "x-level": 0
            }),
        );
        assert!(matches!(
            DefinitionSnapshot::load(&doc),
            Err(DefinitionError::UnknownResultTable { .. })
        ));
    }

    #[test]
    fn reload_failure_keeps_previous_snapshot() {
        let store = DefinitionStore::default();
        store.load_document(&sample_doc()).unwrap();
        assert!(store.load_text("paths: [broken").is_err());
        let snap = store.snapshot();
        assert!(snap.resolve("get", "/case").is_ok());
    }
}
