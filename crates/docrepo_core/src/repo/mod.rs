//! Repository layer: typed, backend-agnostic document access.
//!
//! # Responsibility
//! - Expose CRUD and validation use-cases over any `DocumentStore`.
//! - Isolate callers from backend error vocabularies.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`Conflict`, `NotFound`) in
//!   addition to pass-through storage errors.

pub mod document_repo;
