//! Filter mini-language compiler.
//!
//! The grammar is intentionally shallow: `(field:operator:value)` terms
//! combined with literal `and` / `or` and parentheses. The whole string is
//! wrapped in parentheses when it is not already. Guards, in order: a
//! semicolon anywhere rejects the string outright; stripping every term and
//! every connective token must leave nothing but whitespace, otherwise the
//! residue is reported back. Values are always bound through the parameter
//! table, never spliced into the fragment; field names are validated against
//! the table schema and the canonical column name is quoted in.

use crate::definition::TableSchema;
use crate::error::FilterError;
use crate::sql::{quoted, ParamTable};
use regex::Regex;
use std::sync::OnceLock;

fn term_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\((.*?):(.*?):(.*?)\)").expect("term regex"))
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(|\)|and|or").expect("token regex"))
}

/// Compile a raw filter string into a fully parenthesized predicate fragment,
/// binding every literal value through `params`. Stops at the first error.
pub fn compile(
    raw: &str,
    table: &str,
    schema: &TableSchema,
    params: &mut ParamTable,
) -> Result<String, FilterError> {
    let value = if raw.starts_with('(') {
        raw.to_string()
    } else {
        format!("({})", raw)
    };

    if value.contains(';') {
        return Err(FilterError::SemicolonRejected);
    }

    let stripped = term_re().replace_all(&value, "");
    let residue: String = token_re()
        .replace_all(&stripped, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if !residue.is_empty() {
        return Err(FilterError::UnexpectedInput(residue));
    }

    let mut out = String::from("(");
    let mut last = 0;
    for caps in term_re().captures_iter(&value) {
        let whole = caps.get(0).expect("match 0");
        out.push_str(&value[last..whole.start()]);
        out.push_str(&compile_term(&caps[1], &caps[2], &caps[3], table, schema, params)?);
        last = whole.end();
    }
    out.push_str(&value[last..]);
    out.push(')');
    Ok(out)
}

fn compile_term(
    field: &str,
    operator: &str,
    value: &str,
    table: &str,
    schema: &TableSchema,
    params: &mut ParamTable,
) -> Result<String, FilterError> {
    let column = schema
        .column(field)
        .ok_or_else(|| FilterError::UnknownField(field.to_string()))?;
    let left = format!("{}.{}", quoted(table), quoted(&column.name));

    let simple = match operator {
        "eq" => Some("="),
        "neq" => Some("<>"),
        "lk" => Some("LIKE"),
        "nlk" => Some("NOT LIKE"),
        "gt" => Some(">"),
        "gte" => Some(">="),
        "lt" => Some("<"),
        "lte" => Some("<="),
        _ => None,
    };
    if let Some(op) = simple {
        return Ok(format!(" {} {} {} ", left, op, params.bind(value)));
    }

    Ok(match operator {
        "in" => format!(" {} IN ({}) ", left, params.bind(value)),
        "nin" => format!(" {} NOT IN ({}) ", left, params.bind(value)),
        "nl" => format!(" {} IS NULL ", left),
        "nnl" => format!(" {} IS NOT NULL ", left),
        "bt" | "nbt" => {
            let values: Vec<&str> = value.split(',').collect();
            if values.len() != 2 {
                return Err(FilterError::BetweenArity(
                    if operator == "bt" { "between" } else { "not between" }.into(),
                ));
            }
            let negate = if operator == "nbt" { "NOT " } else { "" };
            format!(
                " {} {}BETWEEN {} AND {} ",
                left,
                negate,
                params.bind(values[0]),
                params.bind(values[1])
            )
        }
        "lkc" => format!(" {} LIKE {} COLLATE \"C\" ", left, params.bind(value)),
        "nlkc" => format!(" {} NOT LIKE {} COLLATE \"C\" ", left, params.bind(value)),
        "ct" => format!(" to_tsvector({}) @@ plainto_tsquery({}) ", left, params.bind(value)),
        "nct" => format!(" NOT (to_tsvector({}) @@ plainto_tsquery({})) ", left, params.bind(value)),
        "ft" => format!(" to_tsvector({}) @@ websearch_to_tsquery({}) ", left, params.bind(value)),
        "nft" => format!(
            " NOT (to_tsvector({}) @@ websearch_to_tsquery({})) ",
            left,
            params.bind(value)
        ),
        other => return Err(FilterError::UnknownOperator(other.to_string())),
    })
}
