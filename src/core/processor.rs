//! Record processors
//!
//! Processors run on every record a channel logger accepts, before any
//! appender sees it.

use super::log_context::{FieldValue, LogContext};
use super::log_record::LogRecord;

pub trait Processor: Send + Sync {
    fn process(&self, record: LogRecord) -> LogRecord;
    fn name(&self) -> &str;
}

/// Substitutes `{key}` placeholders in the message with context values
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderProcessor;

impl PlaceholderProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Processor for PlaceholderProcessor {
    fn process(&self, mut record: LogRecord) -> LogRecord {
        record.message = interpolate(&record.message, &record.context);
        record
    }

    fn name(&self) -> &str {
        "placeholder"
    }
}

/// Replace every `{key}` whose key exists in `context`.
///
/// Unknown placeholders are left untouched.
pub fn interpolate(message: &str, context: &LogContext) -> String {
    if !message.contains('{') || context.is_empty() {
        return message.to_string();
    }

    let mut out = String::with_capacity(message.len());
    let mut rest = message;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match context.get(key) {
                    Some(value) if !key.contains('{') => {
                        out.push_str(&render_placeholder(value));
                        rest = &after[close + 1..];
                    }
                    _ => {
                        out.push('{');
                        rest = after;
                    }
                }
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn render_placeholder(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => String::new(),
        FieldValue::Array(_) => format!("array{}", value.to_json_value()),
        FieldValue::Object(_) => format!("object{}", value.to_json_value()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;

    #[test]
    fn test_replaces_known_keys() {
        let ctx = LogContext::new()
            .with_field("user", "alice")
            .with_field("count", 3);
        assert_eq!(
            interpolate("{user} sent {count} messages", &ctx),
            "alice sent 3 messages"
        );
    }

    #[test]
    fn test_leaves_unknown_placeholders() {
        let ctx = LogContext::new().with_field("user", "alice");
        assert_eq!(interpolate("{user} in {room}", &ctx), "alice in {room}");
        assert_eq!(interpolate("dangling {user", &ctx), "dangling {user");
        assert_eq!(interpolate("{{user}}", &ctx), "{alice}");
    }

    #[test]
    fn test_value_rendering() {
        let ctx = LogContext::new()
            .with_field("none", FieldValue::Null)
            .with_field("flag", true)
            .with_field("list", vec![1, 2]);
        assert_eq!(interpolate("[{none}] {flag} {list}", &ctx), "[] true array[1,2]");
    }

    #[test]
    fn test_processor_rewrites_message_only() {
        let record = LogRecord::new(LogLevel::Info, "app", "hello {name}")
            .with_context(LogContext::new().with_field("name", "bob"));
        let processed = PlaceholderProcessor::new().process(record);
        assert_eq!(processed.message, "hello bob");
        assert_eq!(processed.context.len(), 1);
    }
}
