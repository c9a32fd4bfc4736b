//! Document builder: catalog model to OpenAPI-shaped description.
//!
//! For every table: a collection path (`get` + `post`) and a record path
//! (`/{ID}` with `get`/`patch`/`put`/`delete`), all tagged with the table;
//! one link per directional relation, keyed `Main.Result`, carrying the
//! structural `x-*` attributes; one ordered field schema per table. The
//! builder itself is pure so it can be tested against a hand-built catalog.

use crate::definition::{render_document, ApiDocument, DocFormat};
use crate::error::ApiError;
use crate::generate::catalog::{load_catalog, ColumnRecord, DatabaseCatalog};
use serde_json::{json, Map, Value};
use sqlx::PgPool;

/// Fixed SQL-type-to-document-type mapping. The integer family and `numeric`
/// map to `integer`; everything else is carried as a string.
fn semantic_type(column: &ColumnRecord) -> &'static str {
    match column.sql_type.as_str() {
        "smallint" | "integer" | "bigint" | "int" | "int2" | "int4" | "int8" | "numeric" => {
            "integer"
        }
        _ => "string",
    }
}

fn shared_parameter_refs() -> Value {
    json!([
        { "$ref": "#/components/parameters/fields" },
        { "$ref": "#/components/parameters/orderBy" },
        { "$ref": "#/components/parameters/pageSize" },
        { "$ref": "#/components/parameters/pageNr" },
        { "$ref": "#/components/parameters/filter" }
    ])
}

fn id_path_parameter() -> Value {
    json!([{
        "name": "ID",
        "in": "path",
        "description": "",
        "schema": { "type": "integer" }
    }])
}

fn collection_response(table: &str) -> Value {
    json!({
        "200": {
            "description": "",
            "content": {
                "application/json": {
                    "schema": { "$ref": format!("#/components/schemas/{}", table) }
                }
            }
        },
        "default": { "$ref": "#/components/responses/error" }
    })
}

fn mutation_response() -> Value {
    json!({ "405": { "description": "Invalid input" } })
}

pub fn build_document(catalog: &DatabaseCatalog) -> ApiDocument {
    let mut doc = ApiDocument {
        openapi: "3.0.0".to_string(),
        servers: json!([{ "description": "", "url": "" }]),
        info: json!({
            "description": "",
            "version": "1.0.0",
            "title": "",
            "contact": { "email": "" },
        }),
        tags: Value::Array(
            catalog
                .tables
                .iter()
                .map(|t| json!({ "name": t.name, "description": "" }))
                .collect(),
        ),
        ..ApiDocument::default()
    };

    for table in &catalog.tables {
        let mut parameters: Vec<Value> = match shared_parameter_refs() {
            Value::Array(refs) => refs,
            _ => Vec::new(),
        };
        for column in &table.columns {
            parameters.push(json!({
                "name": column.name,
                "in": "query",
                "required": false,
                "description": "",
                "schema": { "type": semantic_type(column) }
            }));
        }
        let relations = catalog.relations_of(&table.name);
        if !relations.is_empty() {
            parameters.push(json!({
                "name": "include",
                "in": "query",
                "required": false,
                "description": "",
                "explode": true,
                "schema": {
                    "type": "array",
                    "uniqueItems": true,
                    "items": {
                        "type": "string",
                        "enum": relations.iter().map(|r| r.result_table.clone()).collect::<Vec<_>>()
                    }
                }
            }));
        }

        doc.paths.insert(
            format!("/{}", table.name),
            json!({
                "get": {
                    "summary": "",
                    "tags": [table.name],
                    "parameters": parameters,
                    "responses": collection_response(&table.name)
                },
                "post": {
                    "summary": "",
                    "tags": [table.name],
                    "operationId": format!("add{}", table.name),
                    "responses": mutation_response()
                }
            }),
        );
        doc.paths.insert(
            format!("/{}/{{ID}}", table.name),
            json!({
                "get": {
                    "summary": "",
                    "tags": [table.name],
                    "parameters": id_path_parameter(),
                    "responses": collection_response(&table.name)
                },
                "patch": {
                    "summary": "",
                    "tags": [table.name],
                    "parameters": id_path_parameter(),
                    "responses": mutation_response()
                },
                "put": {
                    "summary": "",
                    "tags": [table.name],
                    "parameters": id_path_parameter(),
                    "responses": mutation_response()
                },
                "delete": {
                    "summary": "",
                    "tags": [table.name],
                    "parameters": id_path_parameter(),
                    "responses": mutation_response()
                }
            }),
        );

        let mut properties = Map::new();
        for column in &table.columns {
            properties.insert(
                column.name.clone(),
                json!({ "type": semantic_type(column) }),
            );
        }
        doc.components.schemas.insert(
            table.name.clone(),
            json!({ "type": "object", "properties": properties }),
        );
    }

    for relation in &catalog.relations {
        doc.links.insert(
            format!("{}.{}", relation.main_table, relation.result_table),
            json!({
                "description": "",
                "operationId": format!("get{}", relation.result_table),
                "x-childTable": relation.child_table,
                "x-childColumn": relation.child_column,
                "x-parentTable": relation.parent_table,
                "x-parentColumn": relation.parent_column,
                "x-resultTable": relation.result_table,
                "x-level": relation.level
            }),
        );
    }

    doc.components.parameters = json!({
        "fields": {
            "name": "fields",
            "in": "query",
            "required": false,
            "description": "Return only the named columns, separated by commas",
            "schema": { "type": "string" }
        },
        "orderBy": {
            "name": "orderBy",
            "in": "query",
            "required": false,
            "description": "Ordering expression inserted after ORDER BY, e.g. 'Name DESC'",
            "schema": { "type": "string" }
        },
        "pageSize": {
            "name": "pageSize",
            "in": "query",
            "required": false,
            "description": "Number of rows per page. Must be an integer bigger than 0",
            "schema": { "type": "string" }
        },
        "pageNr": {
            "name": "pageNr",
            "in": "query",
            "required": false,
            "description": "Page number to return. Must be an integer bigger than 0",
            "schema": { "type": "string" }
        },
        "filter": {
            "name": "filter",
            "in": "query",
            "required": false,
            "description": "Filter expression of (field:operator:value) terms combined with and/or",
            "schema": { "type": "string" }
        }
    });
    doc.components.responses = json!({
        "error": {
            "description": "",
            "content": {
                "application/json": {
                    "schema": {
                        "type": "object",
                        "properties": { "message": { "type": "string" } }
                    }
                }
            }
        }
    });

    doc
}

/// Introspect the live catalog and render the description document.
pub async fn generate(
    pool: &PgPool,
    exclude: Option<&str>,
    format: DocFormat,
) -> Result<String, ApiError> {
    let catalog = load_catalog(pool, exclude).await?;
    let doc = build_document(&catalog);
    render_document(&doc, format).map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::DefinitionSnapshot;
    use crate::generate::catalog::{ColumnRecord, TableColumns};

    fn column(name: &str, sql_type: &str) -> ColumnRecord {
        ColumnRecord {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
            length: None,
            precision: None,
            nullable: true,
            identity: false,
            computed: false,
        }
    }

    fn sample_catalog() -> DatabaseCatalog {
        let mut catalog = DatabaseCatalog {
            tables: vec![
                TableColumns {
                    name: "Case".into(),
                    columns: vec![
                        column("ID", "integer"),
                        column("Name", "character varying"),
                        column("PersonID", "integer"),
                        column("Total", "numeric"),
                    ],
                },
                TableColumns {
                    name: "Person".into(),
                    columns: vec![column("ID", "integer"), column("FullName", "text")],
                },
            ],
            relations: Vec::new(),
        };
        catalog.add_foreign_key("Case", "PersonID", "Person", "ID");
        catalog
    }

    #[test]
    fn generates_paths_links_and_ordered_schemas() {
        let doc = build_document(&sample_catalog());
        assert_eq!(doc.openapi, "3.0.0");
        assert!(doc.paths.contains_key("/Case"));
        assert!(doc.paths.contains_key("/Case/{ID}"));
        assert!(doc.paths.contains_key("/Person"));

        let link = &doc.links["Case.Person"];
        assert_eq!(link["x-level"], 1);
        assert_eq!(link["x-resultTable"], "Person");
        let back = &doc.links["Person.Case"];
        assert_eq!(back["x-level"], 0);
        assert_eq!(back["x-resultTable"], "Case");

        let schema = &doc.components.schemas["Case"];
        let props = schema["properties"].as_object().unwrap();
        let names: Vec<&String> = props.keys().collect();
        assert_eq!(names, ["ID", "Name", "PersonID", "Total"]);
        assert_eq!(props["Total"]["type"], "integer");
        assert_eq!(props["Name"]["type"], "string");
    }

    #[test]
    fn include_enum_lists_related_result_tables() {
        let doc = build_document(&sample_catalog());
        let get = &doc.paths["/Case"]["get"];
        let parameters = get["parameters"].as_array().unwrap();
        let include = parameters
            .iter()
            .find(|p| p["name"] == "include")
            .expect("include parameter");
        assert_eq!(include["schema"]["items"]["enum"], json!(["Person"]));
    }

    #[test]
    fn generated_document_loads_into_a_snapshot() {
        let doc = build_document(&sample_catalog());
        let snapshot = DefinitionSnapshot::load(&doc).expect("generated document loads");
        for (path, methods) in [
            ("/case", vec!["get", "post"]),
            ("/case/{id}", vec!["get", "patch", "put", "delete"]),
            ("/person", vec!["get", "post"]),
            ("/person/{id}", vec!["get", "patch", "put", "delete"]),
        ] {
            for method in methods {
                let def = snapshot.resolve(method, path).expect("route resolves");
                assert!(snapshot.schema(&def.table).is_some());
            }
        }
        let link = snapshot.link("Case", "Person").expect("link resolves");
        assert!(link.is_to_one());
        let schema = snapshot.schema("case").unwrap();
        let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["ID", "Name", "PersonID", "Total"]);
    }

    #[test]
    fn yaml_rendering_round_trips() {
        let doc = build_document(&sample_catalog());
        let text = render_document(&doc, DocFormat::Yaml).unwrap();
        let parsed = crate::definition::parse_document(&text).unwrap();
        assert_eq!(parsed.links.len(), doc.links.len());
        assert_eq!(parsed.links["Case.Person"]["x-childColumn"], "PersonID");
    }
}
