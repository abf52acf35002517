//! Timestamp formatting utilities
//!
//! Every `datetime` written to stderr is ISO 8601 with an explicit offset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Default display format for legacy loggers (`2025-01-08 10:30:45+0000`)
pub const DEFAULT_LEGACY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use container_logs::core::TimestampFormat;
/// use chrono::Utc;
///
/// let stamp = TimestampFormat::Iso8601.format(&Utc::now());
/// assert!(stamp.ends_with("+00:00"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// Seconds precision with offset: `2025-01-08T10:30:45+00:00`
    ///
    /// Used by the fallback emitter.
    Iso8601,

    /// Microsecond precision with offset: `2025-01-08T10:30:45.123456+00:00`
    ///
    /// Used by the JSON formatter on the primary path.
    #[default]
    Iso8601Micros,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    /// Format a `DateTime<Utc>` according to this format.
    ///
    /// A custom format chrono cannot render falls back to `Iso8601` instead
    /// of panicking.
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            TimestampFormat::Iso8601Micros => {
                datetime.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
            }
            TimestampFormat::Custom(format_str) => {
                let mut out = String::new();
                if write!(out, "{}", datetime.format(format_str)).is_err() {
                    return TimestampFormat::Iso8601.format(datetime);
                }
                out
            }
        }
    }
}
