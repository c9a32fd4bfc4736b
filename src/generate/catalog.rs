//! PostgreSQL catalog introspection.
//!
//! Reads tables, columns, and foreign keys from `information_schema` into a
//! plain model the document builder consumes. Column order follows the
//! declared (ordinal) order. An operator-supplied exclude filter is appended
//! to the column query as a raw predicate, so tables or whole prefixes can be
//! kept out of the generated description.

use crate::error::ApiError;
use sqlx::{PgPool, Row};

#[derive(Clone, Debug)]
pub struct ColumnRecord {
    pub name: String,
    pub sql_type: String,
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub nullable: bool,
    pub identity: bool,
    pub computed: bool,
}

#[derive(Clone, Debug)]
pub struct TableColumns {
    pub name: String,
    pub columns: Vec<ColumnRecord>,
}

/// One directional relation derived from a foreign key. Every key yields two:
/// from the child's perspective (level 1, result = parent) and from the
/// parent's perspective (level 0, result = child).
#[derive(Clone, Debug, PartialEq)]
pub struct RelationRecord {
    pub main_table: String,
    pub child_table: String,
    pub child_column: String,
    pub parent_table: String,
    pub parent_column: String,
    pub result_table: String,
    pub level: i64,
}

#[derive(Clone, Debug, Default)]
pub struct DatabaseCatalog {
    pub tables: Vec<TableColumns>,
    pub relations: Vec<RelationRecord>,
}

impl DatabaseCatalog {
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name == name)
    }

    /// Relations from one table's perspective, in discovery order.
    pub fn relations_of(&self, table: &str) -> Vec<&RelationRecord> {
        self.relations.iter().filter(|r| r.main_table == table).collect()
    }

    /// Fold raw foreign-key pairs into directional relations, dropping any
    /// that touch a table missing from the column set (excluded or foreign).
    pub fn add_foreign_key(
        &mut self,
        child_table: &str,
        child_column: &str,
        parent_table: &str,
        parent_column: &str,
    ) {
        if !self.has_table(child_table) || !self.has_table(parent_table) {
            return;
        }
        for (main, result, level) in [
            (child_table, parent_table, 1),
            (parent_table, child_table, 0),
        ] {
            self.relations.push(RelationRecord {
                main_table: main.to_string(),
                child_table: child_table.to_string(),
                child_column: child_column.to_string(),
                parent_table: parent_table.to_string(),
                parent_column: parent_column.to_string(),
                result_table: result.to_string(),
                level,
            });
        }
    }
}

const COLUMN_QUERY: &str = r#"
SELECT
    c.table_name,
    c.column_name,
    c.data_type,
    c.character_maximum_length,
    c.numeric_precision,
    c.is_nullable,
    c.is_identity,
    c.is_generated
FROM information_schema.columns c
JOIN information_schema.tables t
  ON t.table_schema = c.table_schema AND t.table_name = c.table_name
WHERE c.table_schema = 'public'
  AND t.table_type IN ('BASE TABLE', 'VIEW')
"#;

const COLUMN_ORDER: &str = " ORDER BY c.table_name, c.ordinal_position";

const FOREIGN_KEY_QUERY: &str = r#"
SELECT
    tc.table_name AS child_table,
    kcu.column_name AS child_column,
    ccu.table_name AS parent_table,
    ccu.column_name AS parent_column
FROM information_schema.table_constraints tc
JOIN information_schema.key_column_usage kcu
  ON kcu.constraint_name = tc.constraint_name AND kcu.table_schema = tc.table_schema
JOIN information_schema.constraint_column_usage ccu
  ON ccu.constraint_name = tc.constraint_name AND ccu.table_schema = tc.table_schema
WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_schema = 'public'
ORDER BY tc.table_name, kcu.column_name
"#;

fn backend(err: sqlx::Error, sql: &str) -> ApiError {
    ApiError::Backend {
        message: err.to_string(),
        statement: Some(sql.to_string()),
    }
}

pub async fn load_catalog(pool: &PgPool, exclude: Option<&str>) -> Result<DatabaseCatalog, ApiError> {
    let mut column_sql = COLUMN_QUERY.to_string();
    if let Some(predicate) = exclude {
        if !predicate.trim().is_empty() {
            column_sql.push_str(&format!("  AND ({})\n", predicate));
        }
    }
    column_sql.push_str(COLUMN_ORDER);

    tracing::debug!(sql = %column_sql, "introspect columns");
    let rows = sqlx::query(&column_sql)
        .fetch_all(pool)
        .await
        .map_err(|e| backend(e, &column_sql))?;

    let mut catalog = DatabaseCatalog::default();
    for row in rows {
        let table: String = row.try_get("table_name").map_err(|e| backend(e, &column_sql))?;
        let column = ColumnRecord {
            name: row.try_get("column_name").map_err(|e| backend(e, &column_sql))?,
            sql_type: row.try_get("data_type").map_err(|e| backend(e, &column_sql))?,
            length: row.try_get("character_maximum_length").unwrap_or(None),
            precision: row.try_get("numeric_precision").unwrap_or(None),
            nullable: row.try_get::<String, _>("is_nullable").map(|v| v == "YES").unwrap_or(false),
            identity: row.try_get::<String, _>("is_identity").map(|v| v == "YES").unwrap_or(false),
            computed: row.try_get::<String, _>("is_generated").map(|v| v == "ALWAYS").unwrap_or(false),
        };
        match catalog.tables.last_mut() {
            Some(last) if last.name == table => last.columns.push(column),
            _ => catalog.tables.push(TableColumns {
                name: table,
                columns: vec![column],
            }),
        }
    }

    tracing::debug!(sql = %FOREIGN_KEY_QUERY, "introspect foreign keys");
    let rows = sqlx::query(FOREIGN_KEY_QUERY)
        .fetch_all(pool)
        .await
        .map_err(|e| backend(e, FOREIGN_KEY_QUERY))?;
    for row in rows {
        let child_table: String =
            row.try_get("child_table").map_err(|e| backend(e, FOREIGN_KEY_QUERY))?;
        let child_column: String =
            row.try_get("child_column").map_err(|e| backend(e, FOREIGN_KEY_QUERY))?;
        let parent_table: String =
            row.try_get("parent_table").map_err(|e| backend(e, FOREIGN_KEY_QUERY))?;
        let parent_column: String =
            row.try_get("parent_column").map_err(|e| backend(e, FOREIGN_KEY_QUERY))?;
        catalog.add_foreign_key(&child_table, &child_column, &parent_table, &parent_column);
    }

    Ok(catalog)
}
