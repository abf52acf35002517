//! Stream appender: one JSON line per record

use crate::core::{
    stderr_writer, Appender, JsonFormatter, LogLevel, LogRecord, LoggerError, MakeWriter, Result,
    TimestampFormat,
};
use parking_lot::Mutex;
use std::io::Write;

/// Writes JSON lines to a stream, normally stderr
pub struct StreamAppender {
    writer: Mutex<Box<dyn Write + Send>>,
    min_level: LogLevel,
    formatter: JsonFormatter,
}

impl StreamAppender {
    /// Append to whatever stream `make_writer` opens
    pub fn new(make_writer: MakeWriter, min_level: LogLevel) -> Self {
        Self {
            writer: Mutex::new(make_writer()),
            min_level,
            formatter: JsonFormatter::new(),
        }
    }

    pub fn stderr(min_level: LogLevel) -> Self {
        Self::new(stderr_writer(), min_level)
    }

    /// Set the timestamp format used in the `datetime` field
    ///
    /// # Examples
    ///
    /// ```
    /// use container_logs::appenders::StreamAppender;
    /// use container_logs::{LogLevel, TimestampFormat};
    ///
    /// let appender = StreamAppender::stderr(LogLevel::Debug)
    ///     .with_timestamp_format(TimestampFormat::Iso8601);
    /// ```
    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.formatter = self.formatter.with_timestamp_format(format);
        self
    }
}

impl Appender for StreamAppender {
    fn append(&mut self, record: &LogRecord) -> Result<()> {
        let mut line = self.formatter.format(record)?;
        line.push('\n');

        let writer = self.writer.get_mut();
        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| LoggerError::appender("stream", e.to_string()))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.get_mut().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "stream"
    }

    fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogContext, SharedBuffer};
    use std::io;
    use std::sync::Arc;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writes_one_line_per_record() -> Result<()> {
        let buffer = SharedBuffer::new();
        let mut appender = StreamAppender::new(buffer.make_writer(), LogLevel::Debug);

        for i in 0..3 {
            let record = LogRecord::new(LogLevel::Info, "app", format!("Iteration {}", i))
                .with_context(LogContext::new().with_field("iteration", i));
            appender.append(&record)?;
        }
        appender.flush()?;

        let lines = buffer.json_lines()?;
        assert_eq!(lines.len(), 3);
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line["context"]["iteration"], i as i64);
            assert_eq!(line["level_name"], "INFO");
        }
        Ok(())
    }

    #[test]
    fn test_min_level_gate() {
        let appender = StreamAppender::new(SharedBuffer::new().make_writer(), LogLevel::Warning);
        assert!(!appender.handles(LogLevel::Notice));
        assert!(appender.handles(LogLevel::Warning));
        assert!(appender.handles(LogLevel::Emergency));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let make_writer: MakeWriter =
            Arc::new(|| -> Box<dyn Write + Send> { Box::new(ClosedPipe) });
        let mut appender = StreamAppender::new(make_writer, LogLevel::Debug);
        let record = LogRecord::new(LogLevel::Error, "app", "lost");
        assert!(matches!(
            appender.append(&record),
            Err(LoggerError::AppenderFailed { .. })
        ));
    }
}
