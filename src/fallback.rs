//! Last-resort JSON writer
//!
//! [`FallbackEmitter`] depends on nothing but `serde_json` and the output
//! stream. It is used whenever the structured path cannot deliver a record,
//! and it never returns an error or unwinds into its caller.

use crate::core::{
    error::panic_message, stderr_writer, LogRecord, MakeWriter, Result, TimestampFormat,
};
use std::io::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Written verbatim when a record cannot be serialized at all
const SERIALIZATION_FAILURE_LINE: &str = r#"{"message":"fallback serialization failed","context":{},"level":400,"level_name":"ERROR","channel":"fallback","datetime":"","extra":{}}"#;

/// Which path delivered a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Primary,
    Fallback,
}

#[derive(Clone)]
pub struct FallbackEmitter {
    make_writer: MakeWriter,
}

impl FallbackEmitter {
    /// Emitter writing to the process standard error stream
    pub fn stderr() -> Self {
        Self::with_writer(stderr_writer())
    }

    pub fn with_writer(make_writer: MakeWriter) -> Self {
        Self { make_writer }
    }

    /// Fixed-shape JSON object for a record
    pub fn to_value(record: &LogRecord) -> serde_json::Value {
        let mut json_obj = serde_json::Map::new();
        json_obj.insert(
            "message".to_string(),
            serde_json::Value::String(record.message.clone()),
        );
        json_obj.insert("context".to_string(), record.context.to_json_value());
        json_obj.insert(
            "level".to_string(),
            serde_json::Value::Number(record.level.weight().into()),
        );
        json_obj.insert(
            "level_name".to_string(),
            serde_json::Value::String(record.level.to_str().to_string()),
        );
        json_obj.insert(
            "channel".to_string(),
            serde_json::Value::String(record.channel.clone()),
        );
        json_obj.insert(
            "datetime".to_string(),
            serde_json::Value::String(TimestampFormat::Iso8601.format(&record.datetime)),
        );
        json_obj.insert(
            "extra".to_string(),
            serde_json::Value::Object(serde_json::Map::new()),
        );
        serde_json::Value::Object(json_obj)
    }

    /// Write one record as a JSON line.
    ///
    /// A fresh stream handle is opened and dropped per call. Failures are
    /// swallowed; if the record cannot be serialized a minimal error line is
    /// written instead.
    pub fn emit(&self, record: &LogRecord) {
        let line = catch_unwind(AssertUnwindSafe(|| serde_json::to_string(&Self::to_value(record))))
            .ok()
            .and_then(|serialized| serialized.ok())
            .unwrap_or_else(|| SERIALIZATION_FAILURE_LINE.to_string());

        let _ = self.write_line(&line);
    }

    fn write_line(&self, line: &str) -> Result<()> {
        catch_unwind(AssertUnwindSafe(|| -> Result<()> {
            let mut handle = (self.make_writer)();
            handle.write_all(format!("{line}\n").as_bytes())?;
            handle.flush()?;
            Ok(())
        }))
        .unwrap_or_else(|payload| Err(crate::LoggerError::other(panic_message(payload.as_ref()))))
    }

    /// Run `primary`; if it fails or panics, emit `fallback()` instead.
    ///
    /// `fallback` is only evaluated on failure, so callers can build a
    /// cheaper record for the degraded path.
    pub fn attempt<P, F>(&self, primary: P, fallback: F) -> Delivery
    where
        P: FnOnce() -> Result<()>,
        F: FnOnce() -> LogRecord,
    {
        match catch_unwind(AssertUnwindSafe(primary)) {
            Ok(Ok(())) => Delivery::Primary,
            Ok(Err(_)) | Err(_) => {
                self.emit(&fallback());
                Delivery::Fallback
            }
        }
    }
}

impl Default for FallbackEmitter {
    fn default() -> Self {
        Self::stderr()
    }
}

impl std::fmt::Debug for FallbackEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackEmitter").finish_non_exhaustive()
    }
}
