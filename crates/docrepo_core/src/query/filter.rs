//! Structural document predicates.
//!
//! Filters are plain values: they are built per call, handed to a store and
//! dropped. Backends translate them; nothing here touches storage.

use super::{validate_field_path, QueryError, QueryResult};
use serde_json::{Map, Value};

/// Predicate over document fields.
///
/// Envelope fields (`_id`, `createdAt`, `updatedAt`) are addressed by the
/// same names they carry in serialized documents.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Matches every document.
    #[default]
    All,
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    NotIn(String, Vec<Value>),
    /// `true` matches documents where the field is present (even if null).
    Exists(String, bool),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn all() -> Self {
        Self::All
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ne(field.into(), value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gt(field.into(), value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gte(field.into(), value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lt(field.into(), value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lte(field.into(), value.into())
    }

    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn not_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::NotIn(field.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn exists(field: impl Into<String>, present: bool) -> Self {
        Self::Exists(field.into(), present)
    }

    pub fn all_of(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    pub fn any_of(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::Or(filters.into_iter().collect())
    }

    /// Conjunction with another filter, flattening `All` and nested `And`.
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Self::All, other) => other,
            (this, Self::All) => this,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (this, other) => Self::And(vec![this, other]),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Checks every field path referenced by this filter.
    pub fn validate(&self) -> QueryResult<()> {
        match self {
            Self::All => Ok(()),
            Self::Eq(field, _)
            | Self::Ne(field, _)
            | Self::Gt(field, _)
            | Self::Gte(field, _)
            | Self::Lt(field, _)
            | Self::Lte(field, _)
            | Self::In(field, _)
            | Self::NotIn(field, _)
            | Self::Exists(field, _) => validate_field_path(field),
            Self::And(filters) | Self::Or(filters) => {
                filters.iter().try_for_each(Filter::validate)
            }
        }
    }

    /// Parses the JSON filter dialect used by the CLI.
    ///
    /// `{"name": "a"}` is equality, `{"age": {"$gte": 18, "$lt": 65}}`
    /// applies operators, `{"$or": [{..}, {..}]}` combines sub-filters.
    /// Several keys in one object are combined with AND. `{}` matches all.
    pub fn from_json(value: &Value) -> QueryResult<Self> {
        let object = value.as_object().ok_or_else(|| QueryError::InvalidValue {
            field: "<filter>".to_string(),
            message: "filter must be a JSON object".to_string(),
        })?;

        let mut clauses = Vec::with_capacity(object.len());
        for (key, value) in object {
            clauses.push(parse_clause(key, value)?);
        }

        let filter = match clauses.len() {
            0 => Self::All,
            1 => clauses.remove(0),
            _ => Self::And(clauses),
        };
        filter.validate()?;
        Ok(filter)
    }
}

fn parse_clause(key: &str, value: &Value) -> QueryResult<Filter> {
    match key {
        "$and" => Ok(Filter::And(parse_filter_list(key, value)?)),
        "$or" => Ok(Filter::Or(parse_filter_list(key, value)?)),
        op if op.starts_with('$') => Err(QueryError::UnsupportedOperator(op.to_string())),
        field => match value {
            Value::Object(ops) if is_operator_object(ops) => parse_operators(field, ops),
            other => Ok(Filter::Eq(field.to_string(), other.clone())),
        },
    }
}

fn parse_filter_list(key: &str, value: &Value) -> QueryResult<Vec<Filter>> {
    let items = value.as_array().ok_or_else(|| QueryError::InvalidValue {
        field: key.to_string(),
        message: "expected an array of filters".to_string(),
    })?;
    items.iter().map(Filter::from_json).collect()
}

fn is_operator_object(object: &Map<String, Value>) -> bool {
    !object.is_empty() && object.keys().all(|key| key.starts_with('$'))
}

fn parse_operators(field: &str, ops: &Map<String, Value>) -> QueryResult<Filter> {
    let mut clauses = Vec::with_capacity(ops.len());
    for (op, operand) in ops {
        let name = field.to_string();
        let clause = match op.as_str() {
            "$eq" => Filter::Eq(name, operand.clone()),
            "$ne" => Filter::Ne(name, operand.clone()),
            "$gt" => Filter::Gt(name, operand.clone()),
            "$gte" => Filter::Gte(name, operand.clone()),
            "$lt" => Filter::Lt(name, operand.clone()),
            "$lte" => Filter::Lte(name, operand.clone()),
            "$in" => Filter::In(name, operand_list(field, operand)?),
            "$nin" => Filter::NotIn(name, operand_list(field, operand)?),
            "$exists" => match operand {
                Value::Bool(present) => Filter::Exists(name, *present),
                _ => {
                    return Err(QueryError::InvalidValue {
                        field: field.to_string(),
                        message: "`$exists` expects a boolean".to_string(),
                    })
                }
            },
            other => return Err(QueryError::UnsupportedOperator(other.to_string())),
        };
        clauses.push(clause);
    }

    Ok(if clauses.len() == 1 {
        clauses.remove(0)
    } else {
        Filter::And(clauses)
    })
}

fn operand_list(field: &str, operand: &Value) -> QueryResult<Vec<Value>> {
    operand
        .as_array()
        .cloned()
        .ok_or_else(|| QueryError::InvalidValue {
            field: field.to_string(),
            message: "expected an array operand".to_string(),
        })
}
