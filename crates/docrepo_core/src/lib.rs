//! Generic document repository over SQLite.
//!
//! A `DocumentRepository<T, S>` gives every collection the same CRUD and
//! validation surface, while a `DocumentStore` backend owns persistence and
//! classifies its own errors. `SqliteDocumentStore` is the bundled backend.

pub mod db;
pub mod log_sink;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod store;

pub use log_sink::{FacadeSink, LogSink, NoopSink};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::document::{
    now_epoch_ms, Document, DocumentId, InvalidDocumentId, JsonDocument, Timestamp,
    CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD,
};
pub use query::{Filter, QueryError, QueryOptions, SaveOptions, SortKey, SortOrder, UpdateOptions};
pub use repo::document_repo::{DocumentRepository, RepoError, RepoResult, CONFLICT_MESSAGE};
pub use store::{
    DocumentStore, ErrorClass, SqliteDocumentStore, StoreError, StoreResult, StoredRecord,
    UpdateGuard, UpdateOutcome,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
