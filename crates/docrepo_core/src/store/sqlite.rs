//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist documents of any collection in the shared `documents` table.
//! - Enforce per-collection unique keys through partial expression indexes.
//! - Classify SQLite failures for the repository layer.
//!
//! # Invariants
//! - `body` always holds a JSON object without envelope fields.
//! - Collection and field names are validated before they are embedded in SQL.
//! - Updates run in one transaction and never touch `id` or `created_at`.

use super::sql::{compile_filter, compile_order_by, field_expr};
use super::{DocumentStore, ErrorClass, StoredRecord, UpdateGuard, UpdateOutcome};
use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::document::{is_envelope_field, DocumentId, Timestamp, ID_FIELD};
use crate::query::{validate_field_path, Filter, QueryError, QueryOptions};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{ffi, params, params_from_iter, Connection, Row};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

static COLLECTION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("valid collection regex"));

const RECORD_SELECT_SQL: &str = "SELECT
    id,
    body,
    created_at,
    updated_at
FROM documents";

/// Identifiers bound per `IN (...)` when counting ids. Must stay below
/// SQLite's bound-parameter limit.
const COUNT_IDS_CHUNK: usize = 500;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error raised by [`SqliteDocumentStore`].
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Query(QueryError),
    /// Collection or index name rejected before reaching SQL.
    InvalidName(String),
    /// Persisted row cannot be decoded.
    InvalidData(String),
    /// Connection has not been migrated to the schema this build expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::InvalidName(message) => write!(f, "invalid name: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted document data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::InvalidName(_) | Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<QueryError> for StoreError {
    fn from(value: QueryError) -> Self {
        Self::Query(value)
    }
}

/// Classifies SQLite failures: unique and primary-key violations are
/// duplicate keys, an empty single-row lookup is not-found.
pub fn classify_sqlite_error(err: &StoreError) -> ErrorClass {
    match err {
        StoreError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(failure, _)))
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            ErrorClass::DuplicateKey
        }
        StoreError::Db(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)) => {
            ErrorClass::NotFound
        }
        _ => ErrorClass::Other,
    }
}

/// Validates a collection name.
pub fn validate_collection_name(name: &str) -> StoreResult<()> {
    if !COLLECTION_NAME_RE.is_match(name) {
        return Err(StoreError::InvalidName(format!(
            "collection `{name}` must match [A-Za-z_][A-Za-z0-9_]{{0,62}}"
        )));
    }
    Ok(())
}

/// Document store over a migrated SQLite connection, bound to one collection.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
    collection: String,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Binds a store to `collection` on a connection opened via `db::open_db*`.
    pub fn try_new(conn: &'conn Connection, collection: impl Into<String>) -> StoreResult<Self> {
        let collection = collection.into();
        validate_collection_name(&collection)?;

        let expected_version = latest_version();
        let actual_version = current_version(conn)?;
        if actual_version != expected_version {
            return Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        Ok(Self { conn, collection })
    }

    /// Creates (idempotently) a unique index over `fields` for this
    /// collection and returns its name.
    ///
    /// Documents missing every indexed field never collide with each other.
    pub fn ensure_unique_index(&self, fields: &[&str]) -> StoreResult<String> {
        if fields.is_empty() {
            return Err(StoreError::InvalidName(
                "unique index needs at least one field".to_string(),
            ));
        }
        for field in fields {
            validate_field_path(field)?;
            if is_envelope_field(field) {
                return Err(StoreError::InvalidName(format!(
                    "`{field}` is managed by the repository and cannot be indexed"
                )));
            }
        }

        let name = format!(
            "uq_{}_{}",
            self.collection,
            fields.join("_").replace('.', "__")
        );
        let exprs = fields
            .iter()
            .map(|field| field_expr(field))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");
        let fields_json = serde_json::to_string(fields)
            .map_err(|err| StoreError::InvalidData(err.to_string()))?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS \"{name}\"
             ON documents ({exprs})
             WHERE collection = '{}';",
            self.collection
        ))?;
        tx.execute(
            "INSERT OR IGNORE INTO collection_indexes (collection, name, fields)
             VALUES (?1, ?2, ?3);",
            params![self.collection, name, fields_json],
        )?;
        tx.commit()?;

        info!(
            "event=unique_index_ensure module=store status=ok collection={} index={}",
            self.collection, name
        );
        Ok(name)
    }

    /// Lists the field sets of every unique index declared on this collection.
    pub fn unique_indexes(&self) -> StoreResult<Vec<Vec<String>>> {
        let mut stmt = self.conn.prepare(
            "SELECT fields FROM collection_indexes
             WHERE collection = ?1
             ORDER BY name ASC;",
        )?;
        let mut rows = stmt.query([self.collection.as_str()])?;
        let mut indexes = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            let fields: Vec<String> = serde_json::from_str(&text).map_err(|err| {
                StoreError::InvalidData(format!("invalid collection_indexes.fields: {err}"))
            })?;
            indexes.push(fields);
        }
        Ok(indexes)
    }

    fn where_clause(&self, filter: &Filter) -> StoreResult<(String, Vec<SqlValue>)> {
        let clause = compile_filter(filter)?;
        let mut params = Vec::with_capacity(clause.params.len() + 1);
        params.push(SqlValue::Text(self.collection.clone()));
        params.extend(clause.params);
        Ok((format!("WHERE collection = ? AND {}", clause.sql), params))
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    type Error = StoreError;

    fn collection(&self) -> &str {
        &self.collection
    }

    fn insert(&self, record: &StoredRecord) -> StoreResult<StoredRecord> {
        let body = serde_json::to_string(&record.body)
            .map_err(|err| StoreError::InvalidData(err.to_string()))?;

        self.conn.execute(
            "INSERT INTO documents (
                collection,
                id,
                body,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                self.collection,
                record.id.to_string(),
                body,
                record.created_at,
                record.updated_at,
            ],
        )?;

        Ok(record.clone())
    }

    fn find(&self, filter: &Filter, options: &QueryOptions) -> StoreResult<Vec<StoredRecord>> {
        options.validate()?;
        let (where_sql, mut bind_values) = self.where_clause(filter)?;
        let order_by = compile_order_by(&options.effective_sort())?;
        let mut sql = format!("{RECORD_SELECT_SQL} {where_sql} ORDER BY {order_by}");

        if let Some(limit) = options.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(SqlValue::Integer(i64::from(limit)));
            if options.skip > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(SqlValue::Integer(i64::from(options.skip)));
            }
        } else if options.skip > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(SqlValue::Integer(i64::from(options.skip)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let record = parse_record_row(row)?;
            records.push(match &options.projection {
                Some(fields) => record.project(fields),
                None => record,
            });
        }

        Ok(records)
    }

    fn find_one(
        &self,
        filter: &Filter,
        options: &QueryOptions,
    ) -> StoreResult<Option<StoredRecord>> {
        let single = QueryOptions {
            limit: Some(1),
            ..options.clone()
        };
        Ok(self.find(filter, &single)?.into_iter().next())
    }

    fn find_one_and_update(
        &self,
        id: DocumentId,
        patch: &Map<String, Value>,
        now: Timestamp,
        guard: &mut UpdateGuard<'_>,
    ) -> StoreResult<UpdateOutcome> {
        let patch_text = serde_json::to_string(patch)
            .map_err(|err| StoreError::InvalidData(err.to_string()))?;

        let tx = self.conn.unchecked_transaction()?;
        let updated = {
            let mut stmt = tx.prepare(
                "UPDATE documents
                 SET
                    body = json_patch(body, ?1),
                    updated_at = MAX(?2, updated_at + 1)
                 WHERE collection = ?3
                   AND id = ?4
                 RETURNING id, body, created_at, updated_at;",
            )?;
            let mut rows = stmt.query(params![patch_text, now, self.collection, id.to_string()])?;
            let record = match rows.next()? {
                Some(row) => Some(parse_record_row(row)?),
                None => None,
            };
            record
        };

        let Some(record) = updated else {
            return Ok(UpdateOutcome::Missing);
        };

        if let Err(reason) = guard(&record) {
            tx.rollback()?;
            return Ok(UpdateOutcome::Rejected(reason));
        }

        tx.commit()?;
        Ok(UpdateOutcome::Updated(record))
    }

    fn delete_by_id(&self, id: DocumentId) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2;",
            params![self.collection, id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn count(&self, filter: &Filter) -> StoreResult<u64> {
        let (where_sql, bind_values) = self.where_clause(filter)?;
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM documents {where_sql};"),
            params_from_iter(bind_values),
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn count_ids(&self, ids: &[DocumentId]) -> StoreResult<u64> {
        let mut found = 0;
        for chunk in ids.chunks(COUNT_IDS_CHUNK) {
            let values = chunk.iter().map(|id| Value::String(id.to_string()));
            found += self.count(&Filter::is_in(ID_FIELD, values))?;
        }
        Ok(found)
    }

    fn classify(&self, err: &StoreError) -> ErrorClass {
        classify_sqlite_error(err)
    }
}

fn parse_record_row(row: &Row<'_>) -> StoreResult<StoredRecord> {
    let id_text: String = row.get("id")?;
    let id = id_text.parse::<DocumentId>().map_err(|_| {
        StoreError::InvalidData(format!("invalid id value `{id_text}` in documents.id"))
    })?;

    let body_text: String = row.get("body")?;
    let body = match serde_json::from_str::<Value>(&body_text) {
        Ok(Value::Object(body)) => body,
        Ok(_) => {
            return Err(StoreError::InvalidData(format!(
                "documents.body for `{id_text}` is not a JSON object"
            )))
        }
        Err(err) => {
            return Err(StoreError::InvalidData(format!(
                "documents.body for `{id_text}` is not valid JSON: {err}"
            )))
        }
    };

    Ok(StoredRecord {
        id,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        body,
    })
}
