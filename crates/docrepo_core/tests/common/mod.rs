#![allow(dead_code)]

use docrepo_core::{Document, DocumentId, LogSink, Timestamp};
use log::Level;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Mutex;

/// Typed collection document used across integration tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
    #[serde(rename = "updatedAt")]
    pub updated_at: Timestamp,
}

impl Document for Person {
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

/// Sink that keeps every message for assertions.
#[derive(Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(Level, String)>>,
}

impl RecordingSink {
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn has(&self, level: Level, needle: &str) -> bool {
        self.entries()
            .iter()
            .any(|(logged, message)| *logged == level && message.contains(needle))
    }
}

impl LogSink for RecordingSink {
    fn log(&self, level: Level, message: &str, context: Option<&dyn Display>) {
        let message = match context {
            Some(context) => format!("{message} context={context}"),
            None => message.to_string(),
        };
        self.entries.lock().unwrap().push((level, message));
    }
}
