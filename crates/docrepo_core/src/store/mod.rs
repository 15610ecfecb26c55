//! Storage seam between the generic repository and concrete backends.
//!
//! # Responsibility
//! - Define the operations a document backend must offer for one collection.
//! - Define how backends classify their own errors for the repository.
//!
//! # Invariants
//! - Each trait method issues exactly one request (or one transaction) to the
//!   backend; no retries happen at this layer.
//! - Records carry envelope fields as typed values, never inside `body`.

use crate::model::document::{
    DocumentId, Timestamp, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD,
};
use crate::query::{Filter, QueryOptions};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::error::Error;

mod sql;
pub mod sqlite;

pub use sqlite::{SqliteDocumentStore, StoreError, StoreResult};

/// Backend-neutral error category used to translate storage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A uniqueness constraint rejected the write.
    DuplicateKey,
    /// The addressed document does not exist.
    NotFound,
    /// Anything else; surfaced to callers unchanged.
    Other,
}

/// One persisted document as a backend sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: DocumentId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// User-defined fields only.
    pub body: Map<String, Value>,
}

impl StoredRecord {
    /// Merges envelope and body into the serialized document shape.
    pub fn to_json(&self) -> Value {
        let mut object = self.body.clone();
        object.insert(ID_FIELD.to_string(), Value::String(self.id.to_string()));
        object.insert(CREATED_AT_FIELD.to_string(), Value::from(self.created_at));
        object.insert(UPDATED_AT_FIELD.to_string(), Value::from(self.updated_at));
        Value::Object(object)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.to_json())
    }

    /// Keeps only the listed body paths; envelope fields always survive.
    pub fn project(&self, fields: &[String]) -> Self {
        let mut body = Map::new();
        for field in fields {
            let segments: Vec<&str> = field.split('.').collect();
            if let Some(value) = lookup_path(&self.body, &segments) {
                insert_path(&mut body, &segments, value.clone());
            }
        }
        Self {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            body,
        }
    }
}

fn lookup_path<'a>(object: &'a Map<String, Value>, segments: &[&str]) -> Option<&'a Value> {
    let (first, rest) = segments.split_first()?;
    let value = object.get(*first)?;
    if rest.is_empty() {
        return Some(value);
    }
    lookup_path(value.as_object()?, rest)
}

fn insert_path(object: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        object.insert(first.to_string(), value);
        return;
    }
    let child = object
        .entry(first.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(child) = child {
        insert_path(child, rest, value);
    }
}

/// Result of an atomic find-and-update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Update committed; carries the document as persisted.
    Updated(StoredRecord),
    /// No document matched the identifier; nothing was written.
    Missing,
    /// The caller's guard refused the new state; the write was rolled back.
    Rejected(String),
}

/// Inspects the post-update state before commit. `Err` rolls back.
pub type UpdateGuard<'a> = dyn FnMut(&StoredRecord) -> Result<(), String> + 'a;

/// Document backend bound to a single collection.
pub trait DocumentStore {
    type Error: Error + 'static;

    fn collection(&self) -> &str;

    /// Inserts a new record and returns it as persisted.
    fn insert(&self, record: &StoredRecord) -> Result<StoredRecord, Self::Error>;

    /// Returns detached snapshots of every match, shaped by `options`.
    fn find(&self, filter: &Filter, options: &QueryOptions)
        -> Result<Vec<StoredRecord>, Self::Error>;

    /// Returns the first match under `options` ordering.
    fn find_one(
        &self,
        filter: &Filter,
        options: &QueryOptions,
    ) -> Result<Option<StoredRecord>, Self::Error>;

    /// Atomically merge-patches `body`, sets `updated_at` to
    /// `max(now, previous + 1)` and runs `guard` on the result before commit.
    fn find_one_and_update(
        &self,
        id: DocumentId,
        patch: &Map<String, Value>,
        now: Timestamp,
        guard: &mut UpdateGuard<'_>,
    ) -> Result<UpdateOutcome, Self::Error>;

    /// Returns the backend acknowledgement: `true` when a document was removed.
    fn delete_by_id(&self, id: DocumentId) -> Result<bool, Self::Error>;

    fn count(&self, filter: &Filter) -> Result<u64, Self::Error>;

    /// Counts stored documents whose identifier is in `ids`.
    fn count_ids(&self, ids: &[DocumentId]) -> Result<u64, Self::Error> {
        let values = ids.iter().map(|id| Value::String(id.to_string()));
        self.count(&Filter::is_in(ID_FIELD, values))
    }

    /// Maps a backend error onto the repository's error vocabulary.
    fn classify(&self, err: &Self::Error) -> ErrorClass;
}
