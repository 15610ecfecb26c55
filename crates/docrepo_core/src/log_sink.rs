//! Injectable logging capability for repositories.
//!
//! # Responsibility
//! - Give components a leveled diagnostic channel without a global logger.
//! - Bridge to the `log` facade when the host wants file/console output.
//!
//! # Invariants
//! - Sinks are side channels only; nothing reads them for control flow.
//! - A sink never panics and never fails the calling operation.

use log::Level;
use std::fmt::Display;

/// Leveled text sink with an optional structured context payload.
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, message: &str, context: Option<&dyn Display>);

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message, None);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message, None);
    }

    fn warn(&self, message: &str, context: Option<&dyn Display>) {
        self.log(Level::Warn, message, context);
    }

    fn error(&self, message: &str, context: Option<&dyn Display>) {
        self.log(Level::Error, message, context);
    }
}

/// Discards everything. Default sink for repositories.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn log(&self, _level: Level, _message: &str, _context: Option<&dyn Display>) {}
}

/// Forwards to the `log` facade under a fixed target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacadeSink {
    target: String,
}

impl FacadeSink {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// Scopes the target to the short name of `T` (`Person` rather than
    /// `my_app::model::Person`).
    pub fn for_type<T: ?Sized>() -> Self {
        Self::new(short_type_name::<T>())
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl LogSink for FacadeSink {
    fn log(&self, level: Level, message: &str, context: Option<&dyn Display>) {
        match context {
            Some(context) => {
                log::log!(target: self.target.as_str(), level, "{message} context={context}")
            }
            None => log::log!(target: self.target.as_str(), level, "{message}"),
        }
    }
}

fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
