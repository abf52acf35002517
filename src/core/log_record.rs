//! Log record structure

use super::log_context::LogContext;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The unit of structured output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub message: String,
    pub context: LogContext,
    pub level: LogLevel,
    pub channel: String,
    pub datetime: DateTime<Utc>,
    /// Fields added by processors; always empty on the fallback path
    #[serde(default)]
    pub extra: LogContext,
}

impl LogRecord {
    pub fn new(level: LogLevel, channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: LogContext::new(),
            level,
            channel: channel.into(),
            datetime: Utc::now(),
            extra: LogContext::new(),
        }
    }

    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_datetime(mut self, datetime: DateTime<Utc>) -> Self {
        self.datetime = datetime;
        self
    }
}
