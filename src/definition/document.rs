//! Description-document types and the YAML/JSON codec.
//!
//! The document is OpenAPI-shaped: `paths`, `links`, `components.schemas`,
//! `components.parameters`. Only the parts the engine consumes are typed;
//! everything else rides along as raw JSON so a loaded document can be
//! re-serialized without loss. Object order is preserved (serde_json with
//! `preserve_order`), which keeps declared column order intact.

use crate::error::DefinitionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ApiDocument {
    #[serde(default)]
    pub openapi: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub servers: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub info: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub tags: Value,
    /// Path key -> { method -> operation object }.
    #[serde(default)]
    pub paths: Map<String, Value>,
    /// `Table.Relation` key -> link object with `x-*` attributes.
    #[serde(default)]
    pub links: Map<String, Value>,
    #[serde(default)]
    pub components: Components,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Components {
    /// Table name -> { type: object, properties: { column -> { type } } }.
    #[serde(default)]
    pub schemas: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub parameters: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub responses: Value,
}

/// One HTTP method entry under a path.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OperationObject {
    #[serde(default)]
    pub summary: String,
    /// First tag is the target table.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub parameters: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub responses: Value,
}

/// A foreign-key relation exposed as an include. The `x-*` attributes are
/// structural: the query builder depends on them and they round-trip exactly.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LinkObject {
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(rename = "x-childTable")]
    pub child_table: String,
    #[serde(rename = "x-childColumn")]
    pub child_column: String,
    #[serde(rename = "x-parentTable")]
    pub parent_table: String,
    #[serde(rename = "x-parentColumn")]
    pub parent_column: String,
    #[serde(rename = "x-resultTable")]
    pub result_table: String,
    /// >= 1: many-to-one from the base table's perspective; 0: one-to-many.
    #[serde(rename = "x-level")]
    pub level: i64,
}

impl LinkObject {
    /// Many-to-one: at most one related row per base row.
    pub fn is_to_one(&self) -> bool {
        self.level >= 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocFormat {
    Yaml,
    Json,
}

/// Parse a description document from text. YAML is a superset of JSON, so a
/// single parser covers both source formats.
pub fn parse_document(text: &str) -> Result<ApiDocument, DefinitionError> {
    serde_yaml::from_str(text).map_err(|e| DefinitionError::Parse(e.to_string()))
}

pub fn render_document(doc: &ApiDocument, format: DocFormat) -> Result<String, DefinitionError> {
    match format {
        DocFormat::Yaml => serde_yaml::to_string(doc).map_err(|e| DefinitionError::Parse(e.to_string())),
        DocFormat::Json => serde_json::to_string(doc).map_err(|e| DefinitionError::Parse(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn link_extension_attributes_round_trip() {
        let link = LinkObject {
            description: String::new(),
            operation_id: Some("getStatus".into()),
            child_table: "Status".into(),
            child_column: "CaseID".into(),
            parent_table: "Case".into(),
            parent_column: "ID".into(),
            result_table: "Status".into(),
            level: 0,
        };
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value["x-childTable"], "Status");
        assert_eq!(value["x-parentColumn"], "ID");
        assert_eq!(value["x-level"], 0);
        let back: LinkObject = serde_json::from_value(value).unwrap();
        assert_eq!(back, link);
    }

    #[test]
    fn parses_yaml_and_json_documents() {
        let yaml = "openapi: 3.0.0\npaths:\n  /case:\n    get:\n      tags: [Case]\n";
        let doc = parse_document(yaml).unwrap();
        assert!(doc.paths.contains_key("/case"));

        let json_text = json!({
            "openapi": "3.0.0",
            "paths": { "/case": { "get": { "tags": ["Case"] } } }
        })
        .to_string();
        let doc = parse_document(&json_text).unwrap();
        let op: OperationObject =
            serde_json::from_value(doc.paths["/case"]["get"].clone()).unwrap();
        assert_eq!(op.tags, vec!["Case"]);
    }

    #[test]
    fn rejects_unparseable_documents() {
        assert!(parse_document("paths: [unclosed").is_err());
    }
}
