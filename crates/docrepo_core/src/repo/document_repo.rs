//! Generic document repository over any [`DocumentStore`].
//!
//! # Responsibility
//! - Provide one CRUD + validation surface for every collection type.
//! - Translate backend duplicate-key and missing-target conditions into
//!   `Conflict` and `NotFound`.
//! - Own envelope policy: identifier assignment and timestamps.
//!
//! # Invariants
//! - Read paths (`get_*`, `validate_object_ids`) never return errors: failures
//!   are logged and degrade to `[]`, `None` or `false`.
//! - Write paths (`create`, `update_one_by_id`, `remove_one_by_id`, `count`)
//!   log and propagate failures.
//! - `_id` and `createdAt` cannot be changed by an update; `updatedAt` is
//!   always refreshed by the store, whatever the patch says.
//! - The repository keeps no state besides the store handle and its sink.

use crate::log_sink::{FacadeSink, LogSink, NoopSink};
use crate::model::document::{
    is_envelope_field, now_epoch_ms, Document, DocumentId, InvalidDocumentId, Timestamp,
    CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD,
};
use crate::query::{Filter, QueryOptions, SaveOptions, UpdateOptions};
use crate::store::{DocumentStore, ErrorClass, StoredRecord, UpdateOutcome};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

/// Fixed message carried by every `Conflict`.
pub const CONFLICT_MESSAGE: &str = "Document already exists";

pub type RepoResult<T, E> = Result<T, RepoError<E>>;

/// Caller-facing repository error. `E` is the backend error type.
#[derive(Debug)]
pub enum RepoError<E> {
    /// A uniqueness constraint rejected the write.
    Conflict(String),
    /// The update target does not exist.
    NotFound(DocumentId),
    InvalidId(InvalidDocumentId),
    /// Input or resulting document does not fit the collection type.
    Validation(String),
    /// Backend failure, passed through unchanged.
    Storage(E),
    /// The backend reported success for a state it should have refused.
    /// The write may already be committed.
    Inconsistent(String),
}

impl<E: Display> Display for RepoError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::InvalidId(err) => write!(f, "{err}"),
            Self::Validation(message) => write!(f, "invalid document: {message}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Inconsistent(message) => write!(f, "inconsistent store state: {message}"),
        }
    }
}

impl<E: Error + 'static> Error for RepoError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidId(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Conflict(_) | Self::NotFound(_) | Self::Validation(_) | Self::Inconsistent(_) => {
                None
            }
        }
    }
}

/// Typed CRUD facade over one collection of `T`.
pub struct DocumentRepository<'s, T, S> {
    store: &'s S,
    sink: Arc<dyn LogSink>,
    _document: PhantomData<fn() -> T>,
}

impl<'s, T, S> DocumentRepository<'s, T, S>
where
    T: Document,
    S: DocumentStore,
{
    /// Creates a repository that logs nowhere.
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            sink: Arc::new(NoopSink),
            _document: PhantomData,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Logs through the `log` facade under the short name of `T`.
    pub fn with_default_logging(self) -> Self {
        self.with_sink(Arc::new(FacadeSink::for_type::<T>()))
    }

    pub fn store(&self) -> &S {
        self.store
    }

    pub fn collection(&self) -> &str {
        self.store.collection()
    }

    /// Persists a new document built from `fields` and returns it in full.
    ///
    /// A caller-supplied `_id` is kept; otherwise a fresh one is assigned.
    /// Timestamps are set to now unless `options.timestamps` is `false`.
    ///
    /// # Errors
    /// - `Conflict` when a unique key (including `_id`) already exists.
    /// - `Validation` / `InvalidId` when the input cannot form a `T`.
    /// - `Storage` for every other backend failure.
    pub fn create<F>(&self, fields: &F, options: &SaveOptions) -> RepoResult<T, S::Error>
    where
        F: Serialize + ?Sized,
    {
        let mut body = self.input_object(fields, "create")?;

        let id = match body.remove(ID_FIELD) {
            None | Some(Value::Null) => DocumentId::new(),
            Some(Value::String(text)) => text.parse().map_err(|err: InvalidDocumentId| {
                self.sink.warn(
                    &self.event("create", "invalid_id"),
                    Some(&err),
                );
                RepoError::InvalidId(err)
            })?,
            Some(other) => {
                return Err(self.rejected("create", format!("`_id` must be a string, got {other}")))
            }
        };

        let supplied_created = body.remove(CREATED_AT_FIELD);
        let supplied_updated = body.remove(UPDATED_AT_FIELD);
        let now = now_epoch_ms();
        let (created_at, updated_at) = if options.timestamps {
            (now, now)
        } else {
            let created = self
                .timestamp_input(CREATED_AT_FIELD, supplied_created)?
                .unwrap_or(now);
            let updated = self
                .timestamp_input(UPDATED_AT_FIELD, supplied_updated)?
                .unwrap_or(created);
            (created, updated)
        };

        let record = StoredRecord {
            id,
            created_at,
            updated_at,
            body,
        };
        if let Err(err) = record.decode::<T>() {
            return Err(self.rejected("create", err.to_string()));
        }

        let stored = self
            .store
            .insert(&record)
            .map_err(|err| self.write_failure("create", None, err))?;

        let document = stored
            .decode::<T>()
            .map_err(|err| self.rejected("create", err.to_string()))?;
        self.sink.info(&format!(
            "{} id={}",
            self.event("create", "ok"),
            document.id()
        ));
        Ok(document)
    }

    /// Returns every match as a detached snapshot.
    ///
    /// Failures are logged and yield an empty vector, so an empty result is
    /// ambiguous between "no match" and "backend error".
    pub fn get_all(&self, filter: &Filter, options: &QueryOptions) -> Vec<T> {
        let records = match self.store.find(filter, options) {
            Ok(records) => records,
            Err(err) => {
                self.sink.error(&self.event("get_all", "error"), Some(&err));
                return Vec::new();
            }
        };

        let mut documents = Vec::with_capacity(records.len());
        for record in &records {
            match record.decode::<T>() {
                Ok(document) => documents.push(document),
                Err(err) => {
                    self.sink.error(
                        &format!("{} id={}", self.event("get_all", "decode_error"), record.id),
                        Some(&err),
                    );
                    return Vec::new();
                }
            }
        }
        documents
    }

    /// Returns the first match, or `None` on no match or any failure.
    pub fn get_one_where(&self, filter: &Filter, options: &QueryOptions) -> Option<T> {
        let record = match self.store.find_one(filter, options) {
            Ok(record) => record?,
            Err(err) => {
                self.sink
                    .error(&self.event("get_one_where", "error"), Some(&err));
                return None;
            }
        };

        match record.decode::<T>() {
            Ok(document) => Some(document),
            Err(err) => {
                self.sink.error(
                    &format!("{} id={}", self.event("get_one_where", "decode_error"), record.id),
                    Some(&err),
                );
                None
            }
        }
    }

    /// Looks a document up by identifier. Malformed identifiers yield `None`.
    pub fn get_one_by_id(&self, id: &str, options: &QueryOptions) -> Option<T> {
        let id = match id.parse::<DocumentId>() {
            Ok(id) => id,
            Err(err) => {
                self.sink
                    .warn(&self.event("get_one_by_id", "invalid_id"), Some(&err));
                return None;
            }
        };
        self.get_one_where(&Filter::eq(ID_FIELD, id.to_string()), options)
    }

    /// Applies `patch` (JSON merge-patch) to the document and returns the
    /// updated version.
    ///
    /// Envelope keys in the patch are ignored. The write is rolled back when
    /// the patched document no longer decodes as `T`.
    ///
    /// # Errors
    /// - `NotFound` when no document has this identifier; nothing is written.
    /// - `Conflict` on unique-key violation.
    /// - `InvalidId`, `Validation`, `Storage` as for `create`.
    /// - `Inconsistent` when the backend commits a document that does not
    ///   decode as `T`.
    pub fn update_one_by_id<P>(
        &self,
        id: &str,
        patch: &P,
        options: &UpdateOptions,
    ) -> RepoResult<T, S::Error>
    where
        P: Serialize + ?Sized,
    {
        let id = self.parse_write_id(id, "update")?;
        let mut patch = self.input_object(patch, "update")?;

        let ignored: Vec<String> = patch
            .keys()
            .filter(|key| is_envelope_field(key))
            .cloned()
            .collect();
        for key in &ignored {
            patch.remove(key);
        }
        if !ignored.is_empty() {
            self.sink.debug(&format!(
                "{} id={} ignored_fields={}",
                self.event("update", "strip"),
                id,
                ignored.join(",")
            ));
        }

        let projection = options.projection.as_deref();
        // The full document must stay a valid `T`; the projection only
        // shapes what is returned.
        let mut guard = |record: &StoredRecord| -> Result<(), String> {
            record.decode::<T>().map_err(|err| err.to_string())?;
            if let Some(fields) = projection {
                record
                    .project(fields)
                    .decode::<T>()
                    .map_err(|err| format!("projection cannot form a document: {err}"))?;
            }
            Ok(())
        };

        let outcome = self
            .store
            .find_one_and_update(id, &patch, now_epoch_ms(), &mut guard)
            .map_err(|err| self.write_failure("update", Some(id), err))?;

        match outcome {
            UpdateOutcome::Updated(record) => {
                let updated_at = record.updated_at;
                let shaped = match projection {
                    Some(fields) => record.project(fields),
                    None => record,
                };
                match shaped.decode::<T>() {
                    Ok(document) => {
                        self.sink.info(&format!(
                            "{} id={} updated_at={}",
                            self.event("update", "ok"),
                            id,
                            updated_at
                        ));
                        Ok(document)
                    }
                    Err(err) => {
                        self.sink.error(
                            &format!("{} id={}", self.event("update", "inconsistent"), id),
                            Some(&err),
                        );
                        Err(RepoError::Inconsistent(format!(
                            "store committed a document that does not decode: {err}"
                        )))
                    }
                }
            }
            UpdateOutcome::Missing => {
                self.sink
                    .warn(&format!("{} id={}", self.event("update", "not_found"), id), None);
                Err(RepoError::NotFound(id))
            }
            UpdateOutcome::Rejected(reason) => Err(self.rejected("update", reason)),
        }
    }

    /// Deletes a document and returns the store's acknowledgement.
    ///
    /// Removing an identifier that no longer exists acknowledges `false`.
    pub fn remove_one_by_id(&self, id: &str) -> RepoResult<bool, S::Error> {
        let id = self.parse_write_id(id, "remove")?;
        match self.store.delete_by_id(id) {
            Ok(acknowledged) => {
                self.sink.info(&format!(
                    "{} id={} acknowledged={}",
                    self.event("remove", "ok"),
                    id,
                    acknowledged
                ));
                Ok(acknowledged)
            }
            Err(err) => Err(self.storage_failure("remove", err)),
        }
    }

    pub fn count(&self, filter: &Filter) -> RepoResult<u64, S::Error> {
        self.store
            .count(filter)
            .map_err(|err| self.storage_failure("count", err))
    }

    /// Returns `true` iff `ids` is non-empty, every entry is a well-formed
    /// identifier and every distinct identifier resolves to a document.
    ///
    /// Duplicates are collapsed before lookup, so `[a, a]` is valid when `a`
    /// exists. Any failure yields `false`.
    pub fn validate_object_ids<I>(&self, ids: &[I]) -> bool
    where
        I: AsRef<str>,
    {
        if ids.is_empty() {
            self.sink.debug(&self.event("validate_ids", "empty"));
            return false;
        }

        let mut distinct = BTreeSet::new();
        for raw in ids {
            match raw.as_ref().parse::<DocumentId>() {
                Ok(id) => {
                    distinct.insert(id);
                }
                Err(err) => {
                    self.sink
                        .warn(&self.event("validate_ids", "invalid_id"), Some(&err));
                    return false;
                }
            }
        }

        let distinct: Vec<DocumentId> = distinct.into_iter().collect();
        match self.store.count_ids(&distinct) {
            Ok(found) => found == distinct.len() as u64,
            Err(err) => {
                self.sink.error(&self.event("validate_ids", "error"), Some(&err));
                false
            }
        }
    }

    fn event(&self, operation: &str, status: &str) -> String {
        format!(
            "event=document_{operation} module=repo status={status} collection={}",
            self.store.collection()
        )
    }

    fn input_object<F>(&self, value: &F, operation: &str) -> RepoResult<Map<String, Value>, S::Error>
    where
        F: Serialize + ?Sized,
    {
        match serde_json::to_value(value) {
            Ok(Value::Object(object)) => Ok(object),
            Ok(other) => Err(self.rejected(
                operation,
                format!("input must be a JSON object, got `{other}`"),
            )),
            Err(err) => Err(self.rejected(operation, format!("input cannot be serialized: {err}"))),
        }
    }

    fn timestamp_input(
        &self,
        field: &str,
        value: Option<Value>,
    ) -> RepoResult<Option<Timestamp>, S::Error> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(number)) => match number.as_i64() {
                Some(millis) => Ok(Some(millis)),
                None => Err(self.rejected(
                    "create",
                    format!("`{field}` must be integer epoch milliseconds"),
                )),
            },
            Some(other) => Err(self.rejected(
                "create",
                format!("`{field}` must be integer epoch milliseconds, got {other}"),
            )),
        }
    }

    fn parse_write_id(&self, id: &str, operation: &str) -> RepoResult<DocumentId, S::Error> {
        id.parse::<DocumentId>().map_err(|err| {
            self.sink.warn(&self.event(operation, "invalid_id"), Some(&err));
            RepoError::InvalidId(err)
        })
    }

    fn rejected(&self, operation: &str, reason: String) -> RepoError<S::Error> {
        self.sink.warn(
            &format!("{} reason={}", self.event(operation, "invalid"), reason),
            None,
        );
        RepoError::Validation(reason)
    }

    fn write_failure(
        &self,
        operation: &str,
        id: Option<DocumentId>,
        err: S::Error,
    ) -> RepoError<S::Error> {
        match (self.store.classify(&err), id) {
            (ErrorClass::DuplicateKey, _) => {
                self.sink.warn(&self.event(operation, "conflict"), Some(&err));
                RepoError::Conflict(CONFLICT_MESSAGE.to_string())
            }
            (ErrorClass::NotFound, Some(id)) => {
                self.sink.warn(&self.event(operation, "not_found"), Some(&err));
                RepoError::NotFound(id)
            }
            _ => self.storage_failure(operation, err),
        }
    }

    fn storage_failure(&self, operation: &str, err: S::Error) -> RepoError<S::Error> {
        self.sink.error(&self.event(operation, "error"), Some(&err));
        RepoError::Storage(err)
    }
}
