//! Backend-neutral query model: filters, sort, projection and pagination.
//!
//! # Responsibility
//! - Describe which documents a read selects and how results are shaped.
//! - Validate field paths before any backend embeds them.
//!
//! # Invariants
//! - Field paths are dot-separated identifiers (`address.city`).
//! - When no sort key is supplied, reads order by `createdAt` descending.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod filter;
pub mod options;

pub use filter::Filter;
pub use options::{QueryOptions, SaveOptions, SortKey, SortOrder, UpdateOptions};

static FIELD_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("valid field path regex")
});

const MAX_FIELD_PATH_CHARS: usize = 256;

pub type QueryResult<T> = Result<T, QueryError>;

/// Query construction or translation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Field path does not match the accepted identifier grammar.
    InvalidFieldPath(String),
    /// Operator key not understood by the JSON filter dialect.
    UnsupportedOperator(String),
    /// Structurally invalid filter or option value.
    InvalidValue { field: String, message: String },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFieldPath(path) => write!(f, "invalid field path `{path}`"),
            Self::UnsupportedOperator(op) => write!(f, "unsupported filter operator `{op}`"),
            Self::InvalidValue { field, message } => {
                write!(f, "invalid value for `{field}`: {message}")
            }
        }
    }
}

impl Error for QueryError {}

/// Validates a dotted field path.
pub fn validate_field_path(path: &str) -> QueryResult<()> {
    if path.len() > MAX_FIELD_PATH_CHARS || !FIELD_PATH_RE.is_match(path) {
        return Err(QueryError::InvalidFieldPath(path.to_string()));
    }
    Ok(())
}
