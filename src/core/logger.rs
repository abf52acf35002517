//! Channel-scoped structured logger

use super::{
    appender::Appender,
    error::{panic_message, LoggerError, Result},
    log_context::LogContext,
    log_level::LogLevel,
    log_record::LogRecord,
    processor::Processor,
};
use parking_lot::Mutex;
use std::cell::Cell;

thread_local! {
    static DISPATCH_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Marks the current thread as inside the bridge's write path.
///
/// A panic hook runs before unwinding releases any lock, so while a guard is
/// alive the hook must not re-enter a logger or the channel registry.
#[derive(Debug)]
pub struct DispatchGuard(());

impl DispatchGuard {
    pub fn enter() -> Self {
        let _ = DISPATCH_DEPTH.try_with(|depth| depth.set(depth.get() + 1));
        Self(())
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        let _ = DISPATCH_DEPTH.try_with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// True while this thread holds a [`DispatchGuard`].
///
/// Also true once thread-local storage is torn down, since nothing about
/// the thread's locks can be known then.
pub fn dispatch_in_progress() -> bool {
    DISPATCH_DEPTH.try_with(|depth| depth.get() > 0).unwrap_or(true)
}

/// A channel-scoped logger with per-level methods
///
/// Implemented by [`ChannelLogger`] and by the manager's built-in fallback
/// logger, so callers never need to know which one they received.
pub trait StructuredLogger: Send + Sync {
    /// Fully qualified channel name, e.g. `app.debug`
    fn channel(&self) -> &str;

    fn log(&self, level: LogLevel, message: &str, context: LogContext) -> Result<()>;

    /// True for stand-ins that write through the fallback emitter
    fn is_fallback(&self) -> bool {
        false
    }

    fn debug(&self, message: &str, context: LogContext) -> Result<()> {
        self.log(LogLevel::Debug, message, context)
    }

    fn info(&self, message: &str, context: LogContext) -> Result<()> {
        self.log(LogLevel::Info, message, context)
    }

    fn notice(&self, message: &str, context: LogContext) -> Result<()> {
        self.log(LogLevel::Notice, message, context)
    }

    fn warning(&self, message: &str, context: LogContext) -> Result<()> {
        self.log(LogLevel::Warning, message, context)
    }

    fn error(&self, message: &str, context: LogContext) -> Result<()> {
        self.log(LogLevel::Error, message, context)
    }

    fn critical(&self, message: &str, context: LogContext) -> Result<()> {
        self.log(LogLevel::Critical, message, context)
    }

    fn alert(&self, message: &str, context: LogContext) -> Result<()> {
        self.log(LogLevel::Alert, message, context)
    }

    fn emergency(&self, message: &str, context: LogContext) -> Result<()> {
        self.log(LogLevel::Emergency, message, context)
    }
}

pub struct ChannelLogger {
    name: String,
    processors: Vec<Box<dyn Processor>>,
    appenders: Mutex<Vec<Box<dyn Appender>>>,
}

impl ChannelLogger {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            processors: Vec::new(),
            appenders: Mutex::new(Vec::new()),
        }
    }

    pub fn push_processor(&mut self, processor: Box<dyn Processor>) {
        self.processors.push(processor);
    }

    pub fn add_appender(&mut self, appender: Box<dyn Appender>) {
        self.appenders.get_mut().push(appender);
    }

    pub fn appender_count(&self) -> usize {
        self.appenders.lock().len()
    }

    /// True if at least one appender would write a record at `level`
    pub fn is_handling(&self, level: LogLevel) -> bool {
        self.appenders.lock().iter().any(|a| a.handles(level))
    }

    pub fn flush(&self) -> Result<()> {
        let mut appenders = self.appenders.lock();
        for appender in appenders.iter_mut() {
            appender.flush()?;
        }
        Ok(())
    }

    /// Write a record to every appender that handles its level
    ///
    /// **Per-Appender Panic Isolation**: each appender call is wrapped in
    /// `catch_unwind`; a panic is reported as an error instead of unwinding
    /// into the caller. Every appender is tried; the first failure is returned.
    fn dispatch(appenders: &mut [Box<dyn Appender>], record: &LogRecord) -> Result<()> {
        let mut first_error = None;

        for appender in appenders.iter_mut().filter(|a| a.handles(record.level)) {
            let append_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                appender.append(record)
            }));

            let error = match append_result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(panic_info) => {
                    LoggerError::appender_panic(appender.name(), panic_message(panic_info.as_ref()))
                }
            };
            first_error.get_or_insert(error);
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl StructuredLogger for ChannelLogger {
    fn channel(&self) -> &str {
        &self.name
    }

    fn log(&self, level: LogLevel, message: &str, context: LogContext) -> Result<()> {
        let _guard = DispatchGuard::enter();
        let mut appenders = self.appenders.lock();
        if !appenders.iter().any(|a| a.handles(level)) {
            return Ok(());
        }

        let mut record = LogRecord::new(level, self.name.as_str(), message).with_context(context);
        for processor in &self.processors {
            record = processor.process(record);
        }

        Self::dispatch(&mut appenders, &record)
    }
}

impl std::fmt::Debug for ChannelLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelLogger")
            .field("name", &self.name)
            .field("processors", &self.processors.len())
            .field("appenders", &self.appender_count())
            .finish()
    }
}

/// Builder for constructing a ChannelLogger with a fluent API
///
/// # Example
/// ```
/// use container_logs::prelude::*;
///
/// let logger = ChannelLogger::builder("app.debug")
///     .processor(PlaceholderProcessor::new())
///     .appender(StreamAppender::stderr(LogLevel::Info))
///     .build();
/// assert_eq!(logger.channel(), "app.debug");
/// ```
pub struct ChannelLoggerBuilder {
    name: String,
    processors: Vec<Box<dyn Processor>>,
    appenders: Vec<Box<dyn Appender>>,
}

impl ChannelLoggerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            processors: Vec::new(),
            appenders: Vec::new(),
        }
    }

    /// Add a processor; processors run in insertion order
    #[must_use = "builder methods return a new value"]
    pub fn processor<P: Processor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Add an appender
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    pub fn build(self) -> ChannelLogger {
        let mut logger = ChannelLogger::new(self.name);
        for processor in self.processors {
            logger.push_processor(processor);
        }
        for appender in self.appenders {
            logger.add_appender(appender);
        }
        logger
    }
}

impl ChannelLogger {
    /// Create a builder for ChannelLogger
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ChannelLoggerBuilder {
        ChannelLoggerBuilder::new(name)
    }
}
