//! Appender trait for log output destinations

use super::{error::Result, log_level::LogLevel, log_record::LogRecord};

pub trait Appender: Send + Sync {
    fn append(&mut self, record: &LogRecord) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;

    /// Lowest level this appender writes
    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }

    fn handles(&self, level: LogLevel) -> bool {
        level >= self.min_level()
    }
}
