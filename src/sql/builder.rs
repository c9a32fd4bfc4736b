//! Per-method statement construction.
//!
//! GET builds a staged plan: a base stage with filters and many-to-one joins,
//! a paged stage, one union stage per one-to-many include, a count stage, and
//! a final projection. POST/PATCH/PUT/DELETE build single parameterized
//! statements that return the affected identifier via RETURNING.

use crate::definition::{DefinitionSnapshot, TableSchema};
use crate::error::ApiError;
use crate::filter;
use crate::sql::params::ParamTable;
use crate::sql::plan::{
    quoted, FinalSelect, JoinSpec, PagingClause, ProjectedColumn, QueryPlan, Stage, StageSelect,
    StageSource,
};
use serde_json::Value;
use std::collections::HashMap;

/// Identifier column convention shared by the builder, the reshaper, and the
/// description generator.
pub const ID_COLUMN: &str = "ID";

const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSpec {
    pub size: u32,
    pub nr: u32,
}

/// A fully built statement plus what the response path needs to know about it.
#[derive(Debug)]
pub struct BuiltStatement {
    pub sql: String,
    pub params: ParamTable,
    pub base_table: String,
    /// Result tables of one-to-many includes, in include order.
    pub to_many_tables: Vec<String>,
    /// Result tables of many-to-one includes.
    pub to_one_tables: Vec<String>,
    pub paging: Option<PageSpec>,
    /// Whether rows carry `Table_Column` aliases and need reshaping.
    pub reshape: bool,
}

pub fn build(
    method: &str,
    table: &str,
    schema: &TableSchema,
    snapshot: &DefinitionSnapshot,
    query: &HashMap<String, String>,
    body: Option<&Value>,
    id: Option<i64>,
) -> Result<BuiltStatement, ApiError> {
    match method {
        "get" => build_get(table, schema, snapshot, query, id),
        "post" => build_post(table, schema, body),
        "patch" => build_patch(table, schema, body, id),
        "put" => build_put(table, schema, body, id),
        "delete" => build_delete(table, id),
        other => Err(ApiError::UnsupportedMethod(other.to_string())),
    }
}

/// Compose an ORDER BY clause from the user's raw value. The leading
/// identifier is resolved against the schema and quoted (composed with the
/// `Table_` prefix in include mode, where every projected column is a quoted
/// alias); the rest of the value, typically a direction, passes through.
fn order_clause(raw: &str, prefix: Option<&str>, schema: &TableSchema) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    let (field, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((field, rest)) => (field, rest.trim()),
        None => (trimmed, ""),
    };
    let column = schema
        .column(field)
        .ok_or_else(|| ApiError::UnknownOrderColumn(field.to_string()))?;
    let ident = match prefix {
        Some(table) => quoted(&format!("{}_{}", table, column.name)),
        None => quoted(&column.name),
    };
    Ok(if rest.is_empty() {
        ident
    } else {
        format!("{} {}", ident, rest)
    })
}

fn parse_page_argument(name: &'static str, raw: &str) -> Result<u32, ApiError> {
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ApiError::InvalidPageArgument {
            name,
            value: raw.to_string(),
        }),
    }
}

fn build_get(
    table: &str,
    schema: &TableSchema,
    snapshot: &DefinitionSnapshot,
    query: &HashMap<String, String>,
    id: Option<i64>,
) -> Result<BuiltStatement, ApiError> {
    let mut params = ParamTable::default();
    let mut columns: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
    let mut order_by: Option<String> = None;
    let mut page = PageSpec {
        size: DEFAULT_PAGE_SIZE,
        nr: 1,
    };
    let mut includes: Vec<String> = Vec::new();
    let mut checks: Vec<String> = Vec::new();

    for (key, value) in query {
        match key.to_lowercase().as_str() {
            "fields" => {
                let fields: Vec<String> = value.split(',').map(|s| s.trim().to_lowercase()).collect();
                columns.retain(|c| fields.contains(&c.to_lowercase()));
            }
            "orderby" => order_by = Some(value.clone()),
            "pagesize" => page.size = parse_page_argument("page size", value)?,
            "pagenr" => page.nr = parse_page_argument("page number", value)?,
            "filter" => checks.push(filter::compile(value, table, schema, &mut params)?),
            "include" => includes = value.split(',').map(|s| s.trim().to_string()).collect(),
            _ => {
                // Any other parameter naming a schema column becomes an
                // equality predicate on that column.
                if let Some(col) = schema.column(key) {
                    checks.push(format!(
                        "{}.{} = {}",
                        quoted(table),
                        quoted(&col.name),
                        params.bind(value)
                    ));
                }
            }
        }
    }

    if let Some(id) = id {
        checks.push(format!(
            "{}.{} = {}",
            quoted(table),
            quoted(ID_COLUMN),
            params.bind_i64(id)
        ));
    }
    let where_clause = if checks.is_empty() {
        None
    } else {
        Some(checks.join(" AND "))
    };

    // Resolve includes against the link map; unknown names are skipped,
    // duplicate result tables dropped so stage names stay unique.
    let mut to_one = Vec::new();
    let mut to_many = Vec::new();
    for include in &includes {
        let Some(link) = snapshot.link(table, include) else {
            tracing::debug!(table = %table, include = %include, "unknown include, skipping");
            continue;
        };
        if link.is_to_one() {
            if !to_one.iter().any(|l: &&crate::definition::LinkObject| l.result_table == link.result_table) {
                to_one.push(link);
            }
        } else if !to_many
            .iter()
            .any(|l: &&crate::definition::LinkObject| l.result_table == link.result_table)
        {
            to_many.push(link);
        }
    }

    let mut plan = QueryPlan::default();
    let paging_clause = |params: &mut ParamTable| PagingClause {
        offset: params.bind_i64((page.nr as i64 - 1) * page.size as i64),
        fetch: params.bind_i64(page.size as i64),
    };

    if to_one.is_empty() && to_many.is_empty() {
        let select = StageSelect::Columns(
            columns
                .iter()
                .map(|c| ProjectedColumn::Plain(c.to_string()))
                .collect(),
        );
        let mut data = Stage::new("data_cte", select, StageSource::Table(table.to_string()));
        data.where_clause = where_clause;
        plan.stages.push(data);
        plan.stages.push(Stage::new(
            "count_cte",
            StageSelect::Count { alias: "TotalRows".into() },
            StageSource::Stage("data_cte".into()),
        ));
        let final_order = match &order_by {
            Some(raw) => order_clause(raw, None, schema)?,
            None => format!("{} ASC", quoted(ID_COLUMN)),
        };
        plan.final_select = FinalSelect {
            base: "data_cte".into(),
            unions: Vec::new(),
            cross_join: Some("count_cte".into()),
            order_by: Some(final_order),
            paging: if id.is_none() {
                Some(paging_clause(&mut params))
            } else {
                None
            },
        };
        return Ok(BuiltStatement {
            sql: plan.render(),
            params,
            base_table: table.to_string(),
            to_many_tables: Vec::new(),
            to_one_tables: Vec::new(),
            paging: if id.is_none() { Some(page) } else { None },
            reshape: false,
        });
    }

    // With includes every projected column is aliased `Table_Column` so rows
    // can be flattened back apart. The field list is the base columns plus
    // every include's result-table columns; stages project NULL for columns
    // they do not carry so the union stays aligned.
    let mut all_fields: Vec<(String, String)> = columns
        .iter()
        .map(|c| (table.to_string(), c.to_string()))
        .collect();
    for link in to_one.iter().chain(to_many.iter()) {
        if let Some(rel_schema) = snapshot.schema(&link.result_table) {
            for col in &rel_schema.columns {
                all_fields.push((rel_schema.table.clone(), col.name.clone()));
            }
        }
    }
    let alias_of = |t: &str, c: &str| format!("{}_{}", t, c);
    let base_id_alias = alias_of(table, ID_COLUMN);

    let data_select = StageSelect::Columns(
        all_fields
            .iter()
            .map(|(t, c)| {
                let carried = t.as_str() == table || to_one.iter().any(|l| l.result_table == *t);
                if carried {
                    ProjectedColumn::Aliased {
                        expr: format!("{}.{}", quoted(t), quoted(c)),
                        alias: alias_of(t, c),
                    }
                } else {
                    ProjectedColumn::NullAs(alias_of(t, c))
                }
            })
            .collect(),
    );
    let mut data = Stage::new("data_cte", data_select, StageSource::Table(table.to_string()));
    for link in &to_one {
        data.joins.push(JoinSpec {
            table: link.result_table.clone(),
            left: format!("{}.{}", quoted(&link.child_table), quoted(&link.child_column)),
            right: format!("{}.{}", quoted(&link.parent_table), quoted(&link.parent_column)),
        });
    }
    data.where_clause = where_clause;
    plan.stages.push(data);

    // The paged stage orders and pages the base rows before any one-to-many
    // union joins them, so the expansion only applies to the current page.
    let mut paged = Stage::new("page_cte", StageSelect::All, StageSource::Stage("data_cte".into()));
    paged.order_by = Some(match &order_by {
        Some(raw) => order_clause(raw, Some(table), schema)?,
        None => format!("{} ASC", quoted(&base_id_alias)),
    });
    if id.is_none() {
        paged.paging = Some(paging_clause(&mut params));
    }
    plan.stages.push(paged);

    let mut union_names = Vec::new();
    for link in &to_many {
        let union_table = &link.result_table;
        let stage_name = format!("union_{}", union_table.to_lowercase());
        let select = StageSelect::Columns(
            all_fields
                .iter()
                .map(|(t, c)| {
                    let alias = alias_of(t, c);
                    if alias == base_id_alias {
                        ProjectedColumn::Plain(alias)
                    } else if t == union_table {
                        ProjectedColumn::Aliased {
                            expr: format!("{}.{}", quoted(t), quoted(c)),
                            alias,
                        }
                    } else {
                        ProjectedColumn::NullAs(alias)
                    }
                })
                .collect(),
        );
        let mut stage = Stage::new(stage_name.clone(), select, StageSource::Stage("page_cte".into()));
        // A join side on the base table refers to the paged stage's aliased
        // column; the other side to the joined table itself.
        let side = |t: &str, c: &str| {
            if t == table {
                quoted(&alias_of(t, c))
            } else {
                format!("{}.{}", quoted(t), quoted(c))
            }
        };
        stage.joins.push(JoinSpec {
            table: union_table.clone(),
            left: side(&link.child_table, &link.child_column),
            right: side(&link.parent_table, &link.parent_column),
        });
        plan.stages.push(stage);
        union_names.push(stage_name);
    }

    plan.stages.push(Stage::new(
        "count_cte",
        StageSelect::Count { alias: "TotalRows".into() },
        StageSource::Stage("data_cte".into()),
    ));
    plan.final_select = FinalSelect {
        base: "page_cte".into(),
        unions: union_names,
        cross_join: Some("count_cte".into()),
        order_by: Some(quoted(&base_id_alias)),
        paging: None,
    };

    Ok(BuiltStatement {
        sql: plan.render(),
        params,
        base_table: table.to_string(),
        to_many_tables: to_many.iter().map(|l| l.result_table.clone()).collect(),
        to_one_tables: to_one.iter().map(|l| l.result_table.clone()).collect(),
        paging: if id.is_none() { Some(page) } else { None },
        reshape: true,
    })
}

fn body_object(body: Option<&Value>) -> Result<&serde_json::Map<String, Value>, ApiError> {
    body.and_then(Value::as_object)
        .ok_or_else(|| ApiError::InvalidBody("request body must be a JSON object".into()))
}

/// Intersect body fields with the schema, case-insensitively, keeping the
/// canonical column name and the body's value.
fn known_fields<'a>(
    schema: &'a TableSchema,
    body: &'a serde_json::Map<String, Value>,
) -> Vec<(&'a str, &'a Value)> {
    body.iter()
        .filter_map(|(k, v)| schema.column(k).map(|c| (c.name.as_str(), v)))
        .collect()
}

fn build_post(
    table: &str,
    schema: &TableSchema,
    body: Option<&Value>,
) -> Result<BuiltStatement, ApiError> {
    let body = body_object(body)?;
    let fields = known_fields(schema, body);
    if fields.is_empty() {
        return Err(ApiError::InvalidBody("no recognized columns in request body".into()));
    }
    let mut params = ParamTable::default();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for (name, value) in fields {
        cols.push(quoted(name));
        placeholders.push(params.bind_value(value.clone()));
    }
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(table),
        cols.join(", "),
        placeholders.join(", "),
        quoted(ID_COLUMN)
    );
    Ok(plain_statement(sql, params, table))
}

fn build_patch(
    table: &str,
    schema: &TableSchema,
    body: Option<&Value>,
    id: Option<i64>,
) -> Result<BuiltStatement, ApiError> {
    let id = id.ok_or_else(|| ApiError::MissingIdentifier("PATCH".into()))?;
    let body = body_object(body)?;
    let fields = known_fields(schema, body);
    if fields.is_empty() {
        return Err(ApiError::InvalidBody("no recognized columns in request body".into()));
    }
    let mut params = ParamTable::default();
    let sets: Vec<String> = fields
        .into_iter()
        .map(|(name, value)| format!("{} = {}", quoted(name), params.bind_value(value.clone())))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        quoted(table),
        sets.join(", "),
        quoted(ID_COLUMN),
        params.bind_i64(id),
        quoted(ID_COLUMN)
    );
    Ok(plain_statement(sql, params, table))
}

fn build_put(
    table: &str,
    schema: &TableSchema,
    body: Option<&Value>,
    id: Option<i64>,
) -> Result<BuiltStatement, ApiError> {
    let id = id.ok_or_else(|| ApiError::MissingIdentifier("PUT".into()))?;
    let body = body_object(body)?;
    let mut params = ParamTable::default();
    // Full replace: every non-identifier column is set; absent fields to NULL.
    let sets: Vec<String> = schema
        .columns
        .iter()
        .filter(|c| !c.name.eq_ignore_ascii_case(ID_COLUMN))
        .map(|c| {
            let value = body
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(&c.name))
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null);
            format!("{} = {}", quoted(&c.name), params.bind_value(value))
        })
        .collect();
    if sets.is_empty() {
        return Err(ApiError::InvalidBody(format!(
            "table {} has no non-identifier columns to set",
            table
        )));
    }
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        quoted(table),
        sets.join(", "),
        quoted(ID_COLUMN),
        params.bind_i64(id),
        quoted(ID_COLUMN)
    );
    Ok(plain_statement(sql, params, table))
}

fn build_delete(table: &str, id: Option<i64>) -> Result<BuiltStatement, ApiError> {
    let id = id.ok_or_else(|| ApiError::MissingIdentifier("DELETE".into()))?;
    let mut params = ParamTable::default();
    let sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        quoted(table),
        quoted(ID_COLUMN),
        params.bind_i64(id),
        quoted(ID_COLUMN)
    );
    Ok(plain_statement(sql, params, table))
}

fn plain_statement(sql: String, params: ParamTable, table: &str) -> BuiltStatement {
    BuiltStatement {
        sql,
        params,
        base_table: table.to_string(),
        to_many_tables: Vec::new(),
        to_one_tables: Vec::new(),
        paging: None,
        reshape: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{parse_document, DefinitionSnapshot};
    use serde_json::json;

    fn snapshot() -> DefinitionSnapshot {
        let text = r#"
openapi: 3.0.0
paths:
  /Case:
    get: { tags: [Case] }
    post: { tags: [Case] }
  /Case/{ID}:
    get: { tags: [Case] }
    patch: { tags: [Case] }
    put: { tags: [Case] }
    delete: { tags: [Case] }
links:
  Case.Status:
    x-childTable: Status
    x-childColumn: CaseID
    x-parentTable: Case
    x-parentColumn: ID
    x-resultTable: Status
    x-level: 0
  Case.Person:
    x-childTable: Case
    x-childColumn: PersonID
    x-parentTable: Person
    x-parentColumn: ID
    x-resultTable: Person
    x-level: 1
components:
  schemas:
    Case:
      type: object
      properties:
        ID: { type: integer }
        Name: { type: string }
        PersonID: { type: integer }
    Status:
      type: object
      properties:
        ID: { type: integer }
        CaseID: { type: integer }
        Label: { type: string }
    Person:
      type: object
      properties:
        ID: { type: integer }
        FullName: { type: string }
"#;
        DefinitionSnapshot::load(&parse_document(text).unwrap()).unwrap()
    }

    fn case_schema(snap: &DefinitionSnapshot) -> TableSchema {
        snap.schema("Case").unwrap().clone()
    }

    #[test]
    fn get_default_paging_binds_offset_and_fetch() {
        let snap = snapshot();
        let built = build("get", "Case", &case_schema(&snap), &snap, &HashMap::new(), None, None).unwrap();
        assert!(built.sql.contains("OFFSET $1 ROWS FETCH NEXT $2 ROWS ONLY"));
        assert_eq!(built.params.params()[0].value, json!(0));
        assert_eq!(built.params.params()[1].value, json!(100));
        assert_eq!(built.paging, Some(PageSpec { size: 100, nr: 1 }));
        assert!(!built.reshape);
    }

    #[test]
    fn get_page_two_binds_computed_offset() {
        let snap = snapshot();
        let query: HashMap<String, String> = [("pageSize", "10"), ("pageNr", "2")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let built = build("get", "Case", &case_schema(&snap), &snap, &query, None, None).unwrap();
        assert_eq!(built.params.params()[0].value, json!(10));
        assert_eq!(built.params.params()[1].value, json!(10));
        assert_eq!(built.paging, Some(PageSpec { size: 10, nr: 2 }));
    }

    #[test]
    fn invalid_page_arguments_abort() {
        let snap = snapshot();
        for (k, v) in [("pageSize", "0"), ("pageSize", "x"), ("pageNr", "-1")] {
            let query: HashMap<String, String> = [(k.to_string(), v.to_string())].into_iter().collect();
            assert!(matches!(
                build("get", "Case", &case_schema(&snap), &snap, &query, None, None),
                Err(ApiError::InvalidPageArgument { .. })
            ));
        }
    }

    #[test]
    fn id_path_adds_identifier_predicate_and_suppresses_paging() {
        let snap = snapshot();
        let built = build("get", "Case", &case_schema(&snap), &snap, &HashMap::new(), None, Some(7)).unwrap();
        assert!(built.sql.contains("\"Case\".\"ID\" = $1"));
        assert!(!built.sql.contains("OFFSET"));
        assert!(built.paging.is_none());
    }

    #[test]
    fn fields_restricts_columns_in_schema_order() {
        let snap = snapshot();
        let query: HashMap<String, String> =
            [("fields".to_string(), "name,id".to_string())].into_iter().collect();
        let built = build("get", "Case", &case_schema(&snap), &snap, &query, None, None).unwrap();
        assert!(built.sql.contains("SELECT \"ID\", \"Name\" FROM \"Case\""));
        assert!(!built.sql.contains("PersonID"));
    }

    #[test]
    fn order_by_quotes_resolved_column_and_keeps_direction() {
        let snap = snapshot();
        let query: HashMap<String, String> =
            [("orderBy".to_string(), "name DESC".to_string())].into_iter().collect();
        let built = build("get", "Case", &case_schema(&snap), &snap, &query, None, None).unwrap();
        assert!(built.sql.contains("ORDER BY \"Name\" DESC"));
    }

    #[test]
    fn order_by_in_include_mode_targets_the_quoted_alias() {
        let snap = snapshot();
        let query: HashMap<String, String> = [
            ("include".to_string(), "Status".to_string()),
            ("orderBy".to_string(), "Name DESC".to_string()),
        ]
        .into_iter()
        .collect();
        let built = build("get", "Case", &case_schema(&snap), &snap, &query, None, None).unwrap();
        // The paged stage must reference the alias it projects, quoted, or
        // the identifier case-folds away from the projected column.
        assert!(built.sql.contains("\"Case\".\"Name\" AS \"Case_Name\""));
        assert!(built.sql.contains("ORDER BY \"Case_Name\" DESC OFFSET"));
        assert!(!built.sql.contains("ORDER BY Case_Name"));
    }

    #[test]
    fn order_by_on_unknown_column_is_rejected() {
        let snap = snapshot();
        let query: HashMap<String, String> =
            [("orderBy".to_string(), "Ghost DESC".to_string())].into_iter().collect();
        assert!(matches!(
            build("get", "Case", &case_schema(&snap), &snap, &query, None, None),
            Err(ApiError::UnknownOrderColumn(c)) if c == "Ghost"
        ));
    }

    #[test]
    fn column_query_parameter_becomes_bound_equality() {
        let snap = snapshot();
        let query: HashMap<String, String> =
            [("Name".to_string(), "Ada".to_string())].into_iter().collect();
        let built = build("get", "Case", &case_schema(&snap), &snap, &query, None, None).unwrap();
        assert!(built.sql.contains("\"Case\".\"Name\" = $1"));
        assert!(!built.sql.contains("Ada"));
    }

    #[test]
    fn include_to_one_joins_into_base_stage() {
        let snap = snapshot();
        let query: HashMap<String, String> =
            [("include".to_string(), "Person".to_string())].into_iter().collect();
        let built = build("get", "Case", &case_schema(&snap), &snap, &query, None, None).unwrap();
        assert!(built.reshape);
        assert_eq!(built.to_one_tables, vec!["Person"]);
        assert!(built.to_many_tables.is_empty());
        assert!(built
            .sql
            .contains("LEFT OUTER JOIN \"Person\" ON \"Case\".\"PersonID\" = \"Person\".\"ID\""));
        assert!(built.sql.contains("\"Person\".\"FullName\" AS \"Person_FullName\""));
        // Joined directly: no union stage for a many-to-one include.
        assert!(!built.sql.contains("union_person"));
    }

    #[test]
    fn include_to_many_builds_union_stage_against_paged_base() {
        let snap = snapshot();
        let query: HashMap<String, String> =
            [("include".to_string(), "Status".to_string())].into_iter().collect();
        let built = build("get", "Case", &case_schema(&snap), &snap, &query, None, None).unwrap();
        assert_eq!(built.to_many_tables, vec!["Status"]);
        // Base stage pads the related table's columns with NULL.
        assert!(built.sql.contains("NULL AS \"Status_Label\""));
        // Paged stage orders and pages before the union joins it.
        assert!(built.sql.contains(
            "page_cte AS (SELECT * FROM data_cte ORDER BY \"Case_ID\" ASC OFFSET $1 ROWS FETCH NEXT $2 ROWS ONLY)"
        ));
        // The union joins the paged stage's aliased base column.
        assert!(built
            .sql
            .contains("LEFT OUTER JOIN \"Status\" ON \"Status\".\"CaseID\" = \"Case_ID\""));
        assert!(built.sql.contains("UNION ALL SELECT * FROM union_status"));
        assert!(built.sql.ends_with("CROSS JOIN count_cte ORDER BY \"Case_ID\""));
    }

    #[test]
    fn unknown_include_is_skipped() {
        let snap = snapshot();
        let query: HashMap<String, String> =
            [("include".to_string(), "Ghost".to_string())].into_iter().collect();
        let built = build("get", "Case", &case_schema(&snap), &snap, &query, None, None).unwrap();
        assert!(!built.reshape);
        assert!(built.to_many_tables.is_empty());
    }

    #[test]
    fn post_intersects_body_with_schema_and_returns_id() {
        let snap = snapshot();
        let body = json!({ "Name": "Ada", "PersonID": 3, "Bogus": true });
        let built = build("post", "Case", &case_schema(&snap), &snap, &HashMap::new(), Some(&body), None).unwrap();
        assert_eq!(
            built.sql,
            "INSERT INTO \"Case\" (\"Name\", \"PersonID\") VALUES ($1, $2) RETURNING \"ID\""
        );
        assert_eq!(built.params.len(), 2);
    }

    #[test]
    fn patch_requires_identifier_and_updates_only_given_columns() {
        let snap = snapshot();
        let body = json!({ "Name": "Ada" });
        assert!(matches!(
            build("patch", "Case", &case_schema(&snap), &snap, &HashMap::new(), Some(&body), None),
            Err(ApiError::MissingIdentifier(m)) if m == "PATCH"
        ));
        let built =
            build("patch", "Case", &case_schema(&snap), &snap, &HashMap::new(), Some(&body), Some(4)).unwrap();
        assert_eq!(
            built.sql,
            "UPDATE \"Case\" SET \"Name\" = $1 WHERE \"ID\" = $2 RETURNING \"ID\""
        );
    }

    #[test]
    fn put_sets_every_non_identifier_column_null_filling_omissions() {
        let snap = snapshot();
        let body = json!({ "Name": "Ada" });
        let built =
            build("put", "Case", &case_schema(&snap), &snap, &HashMap::new(), Some(&body), Some(4)).unwrap();
        assert_eq!(
            built.sql,
            "UPDATE \"Case\" SET \"Name\" = $1, \"PersonID\" = $2 WHERE \"ID\" = $3 RETURNING \"ID\""
        );
        assert_eq!(built.params.params()[0].value, json!("Ada"));
        assert_eq!(built.params.params()[1].value, Value::Null);
    }

    #[test]
    fn delete_requires_identifier() {
        let snap = snapshot();
        assert!(matches!(
            build("delete", "Case", &case_schema(&snap), &snap, &HashMap::new(), None, None),
            Err(ApiError::MissingIdentifier(_))
        ));
        let built = build("delete", "Case", &case_schema(&snap), &snap, &HashMap::new(), None, Some(9)).unwrap();
        assert_eq!(
            built.sql,
            "DELETE FROM \"Case\" WHERE \"ID\" = $1 RETURNING \"ID\""
        );
    }

    #[test]
    fn unsupported_method_is_rejected() {
        let snap = snapshot();
        assert!(matches!(
            build("options", "Case", &case_schema(&snap), &snap, &HashMap::new(), None, None),
            Err(ApiError::UnsupportedMethod(m)) if m == "options"
        ));
    }
}
