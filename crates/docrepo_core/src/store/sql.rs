//! Translation of the query model into SQLite SQL over the `documents` table.
//!
//! Envelope fields map to columns; every other path is read through
//! `json_extract(body, '$.path')`. Paths are validated before being embedded,
//! values always travel as bound parameters. Object and array operands are
//! matched structurally, so stored key order never affects equality.

use crate::model::document::{is_envelope_field, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};
use crate::query::{validate_field_path, Filter, QueryError, QueryResult, SortKey, SortOrder};
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

/// WHERE-clause text plus its positional parameters.
#[derive(Debug, Default)]
pub(crate) struct SqlClause {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Returns the SQL expression that reads `field`.
pub(crate) fn field_expr(field: &str) -> QueryResult<String> {
    match field {
        ID_FIELD => Ok("id".to_string()),
        CREATED_AT_FIELD => Ok("created_at".to_string()),
        UPDATED_AT_FIELD => Ok("updated_at".to_string()),
        path => {
            validate_field_path(path)?;
            Ok(format!("json_extract(body, '$.{path}')"))
        }
    }
}

pub(crate) fn compile_filter(filter: &Filter) -> QueryResult<SqlClause> {
    let mut clause = SqlClause::default();
    write_filter(filter, &mut clause)?;
    Ok(clause)
}

fn write_filter(filter: &Filter, out: &mut SqlClause) -> QueryResult<()> {
    match filter {
        Filter::All => out.sql.push('1'),
        Filter::Eq(field, value) if is_container(value) => match container_match(field, value)? {
            Some(test) => {
                out.sql.push_str(&format!("({})", test.sql));
                out.params.extend(test.params);
            }
            None => out.sql.push_str("(0)"),
        },
        Filter::Ne(field, value) if is_container(value) => match container_match(field, value)? {
            Some(test) => {
                out.sql.push_str(&format!("(NOT {})", test.sql));
                out.params.extend(test.params);
            }
            None => out.sql.push_str("(1)"),
        },
        Filter::Eq(field, value) => {
            let expr = field_expr(field)?;
            if value.is_null() {
                out.sql.push_str(&format!("({expr} IS NULL)"));
            } else {
                out.sql.push_str(&format!("({expr} = ?)"));
                out.params.push(to_sql_value(field, value)?);
            }
        }
        Filter::Ne(field, value) => {
            let expr = field_expr(field)?;
            if value.is_null() {
                out.sql.push_str(&format!("({expr} IS NOT NULL)"));
            } else {
                out.sql.push_str(&format!("({expr} IS NULL OR {expr} <> ?)"));
                out.params.push(to_sql_value(field, value)?);
            }
        }
        Filter::Gt(field, value) => write_comparison(field, ">", value, out)?,
        Filter::Gte(field, value) => write_comparison(field, ">=", value, out)?,
        Filter::Lt(field, value) => write_comparison(field, "<", value, out)?,
        Filter::Lte(field, value) => write_comparison(field, "<=", value, out)?,
        Filter::In(field, values) => write_membership(field, values, false, out)?,
        Filter::NotIn(field, values) => write_membership(field, values, true, out)?,
        Filter::Exists(field, present) => {
            let test = match field.as_str() {
                ID_FIELD | CREATED_AT_FIELD | UPDATED_AT_FIELD => "1".to_string(),
                path => {
                    validate_field_path(path)?;
                    format!("json_type(body, '$.{path}') IS NOT NULL")
                }
            };
            if *present {
                out.sql.push_str(&format!("({test})"));
            } else {
                out.sql.push_str(&format!("(NOT ({test}))"));
            }
        }
        Filter::And(filters) => write_group(filters, " AND ", "1", out)?,
        Filter::Or(filters) => write_group(filters, " OR ", "0", out)?,
    }
    Ok(())
}

fn write_comparison(field: &str, op: &str, value: &Value, out: &mut SqlClause) -> QueryResult<()> {
    if value.is_null() {
        return Err(QueryError::InvalidValue {
            field: field.to_string(),
            message: format!("cannot compare with null using `{op}`"),
        });
    }
    let expr = field_expr(field)?;
    out.sql.push_str(&format!("({expr} {op} ?)"));
    out.params.push(to_sql_value(field, value)?);
    Ok(())
}

fn write_membership(
    field: &str,
    values: &[Value],
    negate: bool,
    out: &mut SqlClause,
) -> QueryResult<()> {
    let expr = field_expr(field)?;
    let includes_null = values.iter().any(Value::is_null);
    let scalars: Vec<&Value> = values
        .iter()
        .filter(|value| !value.is_null() && !is_container(value))
        .collect();

    let mut parts = Vec::with_capacity(2);
    if !scalars.is_empty() {
        let placeholders = vec!["?"; scalars.len()].join(", ");
        parts.push(format!("{expr} IN ({placeholders})"));
        for value in scalars {
            out.params.push(to_sql_value(field, value)?);
        }
    }
    for value in values.iter().filter(|value| is_container(value)) {
        if let Some(test) = container_match(field, value)? {
            parts.push(test.sql);
            out.params.extend(test.params);
        }
    }
    if includes_null {
        parts.push(format!("{expr} IS NULL"));
    }

    let positive = if parts.is_empty() {
        "0".to_string()
    } else {
        parts.join(" OR ")
    };

    if negate {
        // Missing fields never equal a listed value, so they pass `$nin`.
        if includes_null {
            out.sql.push_str(&format!("(NOT ({positive}))"));
        } else {
            out.sql
                .push_str(&format!("({expr} IS NULL OR NOT ({positive}))"));
        }
    } else {
        out.sql.push_str(&format!("({positive})"));
    }
    Ok(())
}

fn is_container(value: &Value) -> bool {
    value.is_array() || value.is_object()
}

/// Exact match of `field` against an object or array operand, never NULL.
/// `None` for envelope fields, which cannot hold containers.
fn container_match(field: &str, value: &Value) -> QueryResult<Option<SqlClause>> {
    if is_envelope_field(field) {
        return Ok(None);
    }
    validate_field_path(field)?;
    let mut test = SqlClause::default();
    write_json_match(&format!("$.{field}"), value, &mut test)?;
    test.sql = format!("COALESCE({}, 0)", test.sql);
    Ok(Some(test))
}

fn write_json_match(path: &str, value: &Value, out: &mut SqlClause) -> QueryResult<()> {
    let path_param = || SqlValue::Text(path.to_string());
    match value {
        Value::Object(fields) => {
            out.sql.push_str(
                "(json_type(body, ?) = 'object' AND (SELECT COUNT(*) FROM json_each(body, ?)) = ?",
            );
            out.params.push(path_param());
            out.params.push(path_param());
            out.params.push(SqlValue::Integer(fields.len() as i64));
            for (key, child) in fields {
                out.sql.push_str(" AND ");
                write_json_match(&child_path(path, key)?, child, out)?;
            }
            out.sql.push(')');
        }
        Value::Array(items) => {
            out.sql
                .push_str("(json_type(body, ?) = 'array' AND json_array_length(body, ?) = ?");
            out.params.push(path_param());
            out.params.push(path_param());
            out.params.push(SqlValue::Integer(items.len() as i64));
            for (index, child) in items.iter().enumerate() {
                out.sql.push_str(" AND ");
                write_json_match(&format!("{path}[{index}]"), child, out)?;
            }
            out.sql.push(')');
        }
        Value::Null => {
            out.sql.push_str("(json_type(body, ?) = 'null')");
            out.params.push(path_param());
        }
        Value::Bool(flag) => {
            out.sql.push_str("(json_type(body, ?) = ?)");
            out.params.push(path_param());
            out.params
                .push(SqlValue::Text(if *flag { "true" } else { "false" }.to_string()));
        }
        scalar => {
            out.sql.push_str("(json_extract(body, ?) = ?)");
            out.params.push(path_param());
            out.params.push(to_sql_value(path, scalar)?);
        }
    }
    Ok(())
}

/// Appends an object key to a JSON path, quoting keys that are not plain
/// identifiers.
fn child_path(path: &str, key: &str) -> QueryResult<String> {
    let plain = key
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && key.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if plain {
        return Ok(format!("{path}.{key}"));
    }
    if key.contains('"') {
        return Err(QueryError::InvalidValue {
            field: path.trim_start_matches("$.").to_string(),
            message: format!("object key `{key}` cannot be matched"),
        });
    }
    Ok(format!("{path}.\"{key}\""))
}

fn write_group(filters: &[Filter], joiner: &str, empty: &str, out: &mut SqlClause) -> QueryResult<()> {
    if filters.is_empty() {
        out.sql.push_str(empty);
        return Ok(());
    }
    out.sql.push('(');
    for (index, filter) in filters.iter().enumerate() {
        if index > 0 {
            out.sql.push_str(joiner);
        }
        write_filter(filter, out)?;
    }
    out.sql.push(')');
    Ok(())
}

/// Builds the ORDER BY body. Ties fall back to insertion order in the
/// direction of the first key.
pub(crate) fn compile_order_by(sort: &[SortKey]) -> QueryResult<String> {
    let mut parts = Vec::with_capacity(sort.len() + 1);
    for key in sort {
        parts.push(format!("{} {}", field_expr(&key.field)?, sql_direction(key.order)));
    }
    let tie_break = sort.first().map_or(SortOrder::Desc, |key| key.order);
    parts.push(format!("rowid {}", sql_direction(tie_break)));
    Ok(parts.join(", "))
}

fn sql_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

/// Converts a JSON scalar into the value `json_extract` would yield for it.
fn to_sql_value(field: &str, value: &Value) -> QueryResult<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(flag) => Ok(SqlValue::Integer(i64::from(*flag))),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Ok(SqlValue::Integer(int))
            } else if let Some(float) = number.as_f64() {
                Ok(SqlValue::Real(float))
            } else {
                Err(QueryError::InvalidValue {
                    field: field.to_string(),
                    message: format!("number `{number}` is out of range"),
                })
            }
        }
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        Value::Array(_) | Value::Object(_) => Err(QueryError::InvalidValue {
            field: field.to_string(),
            message: "objects and arrays only support equality and membership".to_string(),
        }),
    }
}
