//! Statement execution against PostgreSQL.
//!
//! The engine talks to a `StatementExecutor` trait object so the translation
//! pipeline can be tested without a database. The real implementation wraps a
//! `sqlx` pool, binds parameters by their inferred wire type, and decodes
//! every row into a JSON object through a type probe chain.

use crate::error::ApiError;
use crate::sql::{Param, SqlType};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgPool, PgRow, PgTypeInfo, Postgres};
use sqlx::Database;

#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Run one statement and return all rows as ordered JSON objects.
    async fn fetch(&self, sql: &str, params: &[Param]) -> Result<Vec<Map<String, Value>>, ApiError>;
}

pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        PgExecutor { pool }
    }
}

#[async_trait]
impl StatementExecutor for PgExecutor {
    async fn fetch(&self, sql: &str, params: &[Param]) -> Result<Vec<Map<String, Value>>, ApiError> {
        tracing::debug!(sql = %sql, params = ?params, "execute");
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(bind_param(p));
        }
        let rows = query.fetch_all(&self.pool).await.map_err(|e| ApiError::Backend {
            message: clarified_message(&e),
            statement: Some(sql.to_string()),
        })?;
        Ok(rows.iter().map(row_to_object).collect())
    }
}

/// Prefer the database's own message over the driver's wrapped error text.
fn clarified_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    }
}

/// A value that can be bound to a PostgreSQL query.
#[derive(Clone, Debug)]
pub enum PgBindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Uuid(uuid::Uuid),
    Json(Value),
}

impl PgBindValue {
    fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::Bool(b) => PgBindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PgBindValue::I64(i)
                } else {
                    PgBindValue::F64(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => {
                if let Ok(u) = uuid::Uuid::parse_str(s) {
                    PgBindValue::Uuid(u)
                } else {
                    PgBindValue::String(s.clone())
                }
            }
            Value::Array(_) | Value::Object(_) => PgBindValue::Json(v.clone()),
        }
    }
}

/// Convert one parameter to its bindable form, honoring the inferred type:
/// numeric strings bound as `Int`/`Float` become real numbers on the wire.
fn bind_param(p: &Param) -> PgBindValue {
    match p.ty {
        SqlType::Int => match &p.value {
            Value::Number(n) => PgBindValue::I64(n.as_i64().unwrap_or(0)),
            Value::String(s) => s.parse::<i64>().map(PgBindValue::I64).unwrap_or(PgBindValue::Null),
            other => PgBindValue::from_json(other),
        },
        SqlType::Float => match &p.value {
            Value::Number(n) => PgBindValue::F64(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => s.parse::<f64>().map(PgBindValue::F64).unwrap_or(PgBindValue::Null),
            other => PgBindValue::from_json(other),
        },
        SqlType::Text => PgBindValue::from_json(&p.value),
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null => <Option<i32> as Encode<Postgres>>::encode_by_ref(&None, buf)?,
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::String(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
            PgBindValue::Uuid(u) => {
                let u_str = u.to_string();
                <&str as Encode<Postgres>>::encode_by_ref(&u_str.as_str(), buf)?
            }
            PgBindValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

/// Decode one row into a JSON object, keeping column order.
pub fn row_to_object(row: &PgRow) -> Map<String, Value> {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_typed_string_binds_as_number() {
        let p = Param {
            name: "param1".into(),
            value: json!("42"),
            ty: SqlType::Int,
        };
        assert!(matches!(bind_param(&p), PgBindValue::I64(42)));
    }

    #[test]
    fn float_typed_string_binds_as_number() {
        let p = Param {
            name: "param1".into(),
            value: json!("4.5"),
            ty: SqlType::Float,
        };
        assert!(matches!(bind_param(&p), PgBindValue::F64(f) if (f - 4.5).abs() < f64::EPSILON));
    }

    #[test]
    fn text_values_stay_text_and_null_stays_null() {
        let p = Param {
            name: "param1".into(),
            value: json!("O'Brien"),
            ty: SqlType::Text,
        };
        assert!(matches!(bind_param(&p), PgBindValue::String(s) if s == "O'Brien"));

        let p = Param {
            name: "param2".into(),
            value: Value::Null,
            ty: SqlType::Text,
        };
        assert!(matches!(bind_param(&p), PgBindValue::Null));
    }

    #[test]
    fn uuid_strings_are_recognized() {
        let p = Param {
            name: "param1".into(),
            value: json!("8c3d0f04-2f8e-4f6e-9d5b-8a1f0c1b2d3e"),
            ty: SqlType::Text,
        };
        assert!(matches!(bind_param(&p), PgBindValue::Uuid(_)));
    }
}
