//! Ordered parameter table for one statement.
//!
//! Every literal bound during statement construction lands here, in order,
//! with a synthetic name and an inferred wire type: integral numeric strings
//! bind as integers, other numeric strings as floating point, everything else
//! as text. Placeholders are positional `$N`. The table is append-only and
//! lives for a single request.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    Int,
    Float,
    Text,
}

#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub value: Value,
    pub ty: SqlType,
}

#[derive(Debug, Default)]
pub struct ParamTable {
    params: Vec<Param>,
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\.\d+)?$").expect("numeric regex"))
}

fn infer_string_type(s: &str) -> SqlType {
    if numeric_re().is_match(s) {
        if s.contains('.') {
            SqlType::Float
        } else {
            SqlType::Int
        }
    } else {
        SqlType::Text
    }
}

impl ParamTable {
    /// Bind a string literal, inferring its wire type. Returns the placeholder.
    pub fn bind(&mut self, value: &str) -> String {
        let ty = infer_string_type(value);
        self.push(Value::String(value.to_string()), ty)
    }

    /// Bind a JSON value from a request body.
    pub fn bind_value(&mut self, value: Value) -> String {
        let ty = match &value {
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    SqlType::Int
                } else {
                    SqlType::Float
                }
            }
            Value::String(s) => infer_string_type(s),
            _ => SqlType::Text,
        };
        self.push(value, ty)
    }

    pub fn bind_i64(&mut self, value: i64) -> String {
        self.push(Value::Number(value.into()), SqlType::Int)
    }

    fn push(&mut self, value: Value, ty: SqlType) -> String {
        let n = self.params.len() + 1;
        self.params.push(Param {
            name: format!("param{}", n),
            value,
            ty,
        });
        format!("${}", n)
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholders_are_positional_and_named_in_order() {
        let mut t = ParamTable::default();
        assert_eq!(t.bind("a"), "$1");
        assert_eq!(t.bind("b"), "$2");
        assert_eq!(t.params()[0].name, "param1");
        assert_eq!(t.params()[1].name, "param2");
    }

    #[test]
    fn string_type_inference() {
        let mut t = ParamTable::default();
        t.bind("42");
        t.bind("4.5");
        t.bind("4x");
        t.bind("-1");
        let types: Vec<SqlType> = t.params().iter().map(|p| p.ty).collect();
        // Signed values do not match the numeric literal pattern; they bind as text.
        assert_eq!(types, vec![SqlType::Int, SqlType::Float, SqlType::Text, SqlType::Text]);
    }

    #[test]
    fn json_value_inference() {
        let mut t = ParamTable::default();
        t.bind_value(json!(7));
        t.bind_value(json!(7.5));
        t.bind_value(json!("12"));
        t.bind_value(json!(null));
        let types: Vec<SqlType> = t.params().iter().map(|p| p.ty).collect();
        assert_eq!(types, vec![SqlType::Int, SqlType::Float, SqlType::Int, SqlType::Text]);
    }
}
