//! Legacy file-logger capability
//!
//! Hosts written against a per-file logger API (an id, an ident prefix, a
//! priority mask, open/close/flush, observers) keep calling that API; the
//! [`StderrFileLogger`] implementation turns every call into a structured
//! record on stderr instead of a line in a file.

pub mod drivers;
pub mod file_shim;

pub use drivers::{DriverArgs, DriverConstructor, LegacyConf, LegacyDrivers};
pub use file_shim::{StderrFileLogger, LEGACY_CHANNEL};

use crate::core::{interpolate, LegacyPriority, LogContext, PearPriority, PriorityMask};
use std::sync::Arc;

/// A log call announced to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Priority as the caller passed it
    pub original: LegacyPriority,
    /// Priority after normalization
    pub priority: PearPriority,
    pub message: String,
}

/// Listener attached to a legacy logger
pub trait LogObserver: Send + Sync {
    fn id(&self) -> &str;

    /// Least severe priority this observer wants to hear about
    fn priority(&self) -> PearPriority {
        PearPriority::Info
    }

    fn notify(&self, event: &LogEvent);
}

/// Message payload accepted by legacy loggers
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyMessage {
    Text(String),
    /// `{placeholder}` template rendered against its own context
    Template { template: String, context: LogContext },
    /// Arbitrary structured payload
    Value(serde_json::Value),
}

impl LegacyMessage {
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        LegacyMessage::Text(err.to_string())
    }

    /// Final message text
    pub fn render(&self) -> String {
        match self {
            LegacyMessage::Text(text) => text.clone(),
            LegacyMessage::Template { template, context } => interpolate(template, context),
            LegacyMessage::Value(serde_json::Value::String(s)) => s.clone(),
            LegacyMessage::Value(value) => value.to_string(),
        }
    }
}

impl From<&str> for LegacyMessage {
    fn from(s: &str) -> Self {
        LegacyMessage::Text(s.to_string())
    }
}

impl From<String> for LegacyMessage {
    fn from(s: String) -> Self {
        LegacyMessage::Text(s)
    }
}

impl From<serde_json::Value> for LegacyMessage {
    fn from(value: serde_json::Value) -> Self {
        LegacyMessage::Value(value)
    }
}

/// The per-file logger API legacy hosts program against
pub trait LegacyLogger: Send + Sync {
    /// Unique instance token
    fn id(&self) -> &str;

    fn ident(&self) -> &str;
    fn set_ident(&mut self, ident: String);

    /// Default priority for calls that pass none
    fn priority(&self) -> PearPriority;
    fn set_priority(&mut self, priority: PearPriority);

    fn mask(&self) -> PriorityMask;
    fn set_mask(&mut self, mask: PriorityMask);

    fn is_open(&self) -> bool;
    fn open(&mut self) -> bool;
    fn close(&mut self) -> bool;
    fn flush(&mut self) -> bool;

    /// Log a message; returns `false` when the priority is masked out
    fn log(&self, message: LegacyMessage, priority: LegacyPriority) -> bool;

    fn attach(&mut self, observer: Arc<dyn LogObserver>) -> bool;
    fn detach(&mut self, observer_id: &str) -> bool;

    fn is_masked(&self, priority: PearPriority) -> bool {
        self.mask().contains(priority)
    }

    fn emerg(&self, message: LegacyMessage) -> bool {
        self.log(message, PearPriority::Emerg.into())
    }

    fn alert(&self, message: LegacyMessage) -> bool {
        self.log(message, PearPriority::Alert.into())
    }

    fn crit(&self, message: LegacyMessage) -> bool {
        self.log(message, PearPriority::Crit.into())
    }

    fn err(&self, message: LegacyMessage) -> bool {
        self.log(message, PearPriority::Err.into())
    }

    fn warning(&self, message: LegacyMessage) -> bool {
        self.log(message, PearPriority::Warning.into())
    }

    fn notice(&self, message: LegacyMessage) -> bool {
        self.log(message, PearPriority::Notice.into())
    }

    fn info(&self, message: LegacyMessage) -> bool {
        self.log(message, PearPriority::Info.into())
    }

    fn debug(&self, message: LegacyMessage) -> bool {
        self.log(message, PearPriority::Debug.into())
    }
}
