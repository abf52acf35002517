//! JSON line formatter for the primary output path

use super::log_record::LogRecord;
use super::timestamp::TimestampFormat;
use super::error::Result;

/// Formats records as one JSON object per line.
///
/// Key order: `message`, `context`, `level`, `level_name`, `channel`,
/// `datetime`, `extra`.
///
/// # Example
///
/// ```
/// use container_logs::core::{JsonFormatter, LogLevel, LogRecord};
///
/// let record = LogRecord::new(LogLevel::Warning, "app.debug", "disk almost full");
/// let line = JsonFormatter::new().format(&record).unwrap();
/// assert!(line.starts_with(r#"{"message":"disk almost full","context":{}"#));
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    timestamp_format: TimestampFormat,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Build the JSON object for a record
    pub fn to_value(&self, record: &LogRecord) -> serde_json::Value {
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
            serde_json::Value::String(self.timestamp_format.format(&record.datetime)),
        );
        json_obj.insert("extra".to_string(), record.extra.to_json_value());
        serde_json::Value::Object(json_obj)
    }

    /// Render a record as a single line (no trailing newline)
    pub fn format(&self, record: &LogRecord) -> Result<String> {
        Ok(serde_json::to_string(&self.to_value(record))?)
    }
}
