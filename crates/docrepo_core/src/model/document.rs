//! Document capability trait and envelope types.
//!
//! # Responsibility
//! - Define what a type must offer to be stored by the generic repository.
//! - Own the stable identifier type and the envelope field names.
//!
//! # Invariants
//! - `_id` is assigned once at creation and never rewritten.
//! - `createdAt` and `updatedAt` are Unix epoch milliseconds.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Envelope field carrying the document identifier.
pub const ID_FIELD: &str = "_id";
/// Envelope field carrying the creation timestamp.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Envelope field carrying the last-update timestamp.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Unix epoch milliseconds.
pub type Timestamp = i64;

/// Stable identifier for a stored document.
///
/// Backed by a UUID so malformed identifiers are rejected at parse time
/// instead of silently matching nothing in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = InvalidDocumentId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| InvalidDocumentId {
                value: value.to_string(),
            })
    }
}

/// Raised when a string cannot be converted into a [`DocumentId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDocumentId {
    pub value: String,
}

impl Display for InvalidDocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid document id `{}`", self.value)
    }
}

impl Error for InvalidDocumentId {}

/// Capability set required by the generic repository.
///
/// Implementors serialize their identifier as `_id` and their timestamps as
/// `createdAt`/`updatedAt`; every other field is free-form.
pub trait Document: Serialize + DeserializeOwned {
    fn id(&self) -> DocumentId;
    fn created_at(&self) -> Timestamp;
    fn updated_at(&self) -> Timestamp;
}

/// Schemaless document used where no concrete Rust type exists (CLI, tooling).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDocument {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
    #[serde(rename = "updatedAt")]
    pub updated_at: Timestamp,
    /// All user-defined fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document for JsonDocument {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }

    fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}

/// Returns `true` for the three fields owned by the repository envelope.
pub fn is_envelope_field(name: &str) -> bool {
    matches!(name, ID_FIELD | CREATED_AT_FIELD | UPDATED_AT_FIELD)
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as Timestamp)
        .unwrap_or(0)
}
