//! Flat-row reshaping and paging metadata.
//!
//! Statements built with includes return rows whose columns are aliased
//! `Table_Column`. Reshaping walks the row stream, which is ordered by the
//! base table's identifier, and folds consecutive rows with the same base
//! identifier into one record: base columns become plain fields, many-to-one
//! tables become nested objects, and one-to-many tables become lists with one
//! sub-record appended per relation per row. A relation with no matching rows
//! produces no key at all rather than an empty list.

use crate::sql::{PageSpec, ID_COLUMN};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Count column carried by every row via the count stage cross join. Read for
/// the paging metadata, then stripped from every record.
pub const TOTAL_ROWS_COLUMN: &str = "TotalRows";

/// What the reshaper needs to know about the statement that produced the rows.
#[derive(Debug, Default)]
pub struct ReshapeSpec {
    pub base_table: String,
    pub to_many: Vec<String>,
    pub to_one: Vec<String>,
}

enum ColumnKind<'a> {
    Base(&'a str),
    ToMany { table: &'a str, column: &'a str },
    ToOne { table: &'a str, column: &'a str },
    Other,
}

impl ReshapeSpec {
    fn classify<'a>(&self, key: &'a str) -> ColumnKind<'a> {
        let Some((table, column)) = key.split_once('_') else {
            return ColumnKind::Other;
        };
        if table == self.base_table {
            ColumnKind::Base(column)
        } else if self.to_many.iter().any(|t| t == table) {
            ColumnKind::ToMany { table, column }
        } else if self.to_one.iter().any(|t| t == table) {
            ColumnKind::ToOne { table, column }
        } else {
            ColumnKind::Other
        }
    }
}

/// Merge a column into a record, letting a non-null value overwrite and a
/// null value fill only an absent field. Rows repeat the base columns once
/// per joined row, so nulls from padding must not clobber real values.
fn merge_field(target: &mut Map<String, Value>, key: &str, value: &Value) {
    if !value.is_null() || !target.contains_key(key) {
        target.insert(key.to_string(), value.clone());
    }
}

pub fn reshape(rows: &[Map<String, Value>], spec: &ReshapeSpec) -> Vec<Map<String, Value>> {
    let base_id_key = format!("{}_{}", spec.base_table, ID_COLUMN);
    let mut records: Vec<Map<String, Value>> = Vec::new();

    for row in rows {
        let row_base_id = row.get(&base_id_key).cloned().unwrap_or(Value::Null);
        let boundary = match records.last() {
            None => true,
            Some(last) => last.get(ID_COLUMN) != Some(&row_base_id),
        };
        if boundary {
            records.push(Map::new());
        }
        let current = records.last_mut().expect("record just pushed");

        // At most one fresh sub-record per relation per row.
        let mut pending: Vec<(String, Map<String, Value>)> = Vec::new();

        if let Some(total) = row.get(TOTAL_ROWS_COLUMN) {
            current.insert(TOTAL_ROWS_COLUMN.to_string(), total.clone());
        }

        for (key, value) in row {
            match spec.classify(key) {
                ColumnKind::Base(column) => merge_field(current, column, value),
                ColumnKind::ToMany { table, column } => {
                    // Only rows that actually carry the relation contribute a
                    // sub-record; padding rows have a null relation identifier.
                    let rel_id_key = format!("{}_{}", table, ID_COLUMN);
                    if row.get(&rel_id_key).map_or(false, |v| !v.is_null()) {
                        let idx = match pending.iter().position(|(t, _)| t == table) {
                            Some(i) => i,
                            None => {
                                pending.push((table.to_string(), Map::new()));
                                pending.len() - 1
                            }
                        };
                        pending[idx].1.insert(column.to_string(), value.clone());
                    }
                }
                ColumnKind::ToOne { table, column } => {
                    if !current.contains_key(table) {
                        current.insert(table.to_string(), Value::Object(Map::new()));
                    }
                    if let Some(Value::Object(nested)) = current.get_mut(table) {
                        merge_field(nested, column, value);
                    }
                }
                ColumnKind::Other => {}
            }
        }

        for (table, sub) in pending {
            let list = current
                .entry(table)
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = list {
                items.push(Value::Object(sub));
            }
        }
    }

    records
}

/// Paging metadata attached to collection responses.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PagingInfo {
    pub row_count: i64,
    pub page_size: u32,
    pub page_count: i64,
    pub page_nr: u32,
    pub first_index_on_page: Value,
    pub last_index_on_page: Value,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub is_first_page: bool,
    pub is_last_page: bool,
}

/// Compute paging metadata from the (already reshaped) records. The total row
/// count rides on the first record; first/last index are the identifiers of
/// the first and last record on the page, 0 when the page is empty.
pub fn paging_info(records: &[Map<String, Value>], page: PageSpec) -> PagingInfo {
    let row_count = records
        .first()
        .and_then(|r| r.get(TOTAL_ROWS_COLUMN))
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let page_count = (row_count + page.size as i64 - 1) / page.size as i64;
    let index_of = |record: Option<&Map<String, Value>>| {
        record
            .and_then(|r| r.get(ID_COLUMN))
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| json!(0))
    };
    PagingInfo {
        row_count,
        page_size: page.size,
        page_count,
        page_nr: page.nr,
        first_index_on_page: index_of(records.first()),
        last_index_on_page: index_of(records.last()),
        has_previous_page: page.nr > 1,
        has_next_page: (page.nr as i64) < page_count,
        is_first_page: page.nr == 1,
        is_last_page: page.nr as i64 == page_count,
    }
}

pub fn strip_total_rows(records: &mut [Map<String, Value>]) {
    for record in records {
        record.remove(TOTAL_ROWS_COLUMN);
    }
}
