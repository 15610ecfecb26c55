//! Document model shared by the repository and storage layers.
//!
//! # Responsibility
//! - Define the capability set a stored type must satisfy.
//! - Keep identifier and timestamp conventions in one place.
//!
//! # Invariants
//! - Every stored document is identified by a stable `DocumentId`.

pub mod document;
