//! Read and write options.

use super::{validate_field_path, QueryError, QueryResult};
use crate::model::document::CREATED_AT_FIELD;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "1" => Ok(Self::Asc),
            "desc" | "-1" => Ok(Self::Desc),
            other => Err(QueryError::InvalidValue {
                field: "<sort>".to_string(),
                message: format!("unknown sort order `{other}`; expected asc|desc"),
            }),
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

/// One sort criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

impl SortKey {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Desc)
    }
}

/// Parses `field` or `field:asc|desc`; a bare field sorts ascending.
impl FromStr for SortKey {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (field, order) = match value.split_once(':') {
            Some((field, order)) => (field.trim(), order.parse()?),
            None => (value.trim(), SortOrder::Asc),
        };
        validate_field_path(field)?;
        Ok(Self::new(field, order))
    }
}

/// Shape of a single read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Empty means the default order, `createdAt` descending.
    pub sort: Vec<SortKey>,
    /// Fields to keep. Envelope fields are always kept.
    pub projection: Option<Vec<String>>,
    pub skip: u32,
    pub limit: Option<u32>,
}

impl QueryOptions {
    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push(SortKey::new(field, order));
        self
    }

    pub fn select<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sort keys actually applied to a read.
    pub fn effective_sort(&self) -> Vec<SortKey> {
        if self.sort.is_empty() {
            vec![SortKey::desc(CREATED_AT_FIELD)]
        } else {
            self.sort.clone()
        }
    }

    /// Checks sort and projection field paths.
    pub fn validate(&self) -> QueryResult<()> {
        for key in &self.sort {
            validate_field_path(&key.field)?;
        }
        if let Some(fields) = &self.projection {
            for field in fields {
                validate_field_path(field)?;
            }
        }
        Ok(())
    }
}

/// Options for `create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// When `false`, caller-supplied `createdAt`/`updatedAt` are kept.
    pub timestamps: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self { timestamps: true }
    }
}

/// Options for `update_one_by_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Fields to keep on the returned document.
    pub projection: Option<Vec<String>>,
}
