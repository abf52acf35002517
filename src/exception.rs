//! Unhandled error capture
//!
//! An [`ExceptionInterceptor`] turns an error the host could not handle into
//! one `ERROR` record on the `exception` channel. The Rust-side equivalent of
//! "unhandled" is a panic, so [`install_panic_hook`] wires the interceptor in
//! ahead of whatever hook was installed before.

use crate::core::{error::panic_message, DispatchGuard, LogContext, LogLevel, LogRecord};
use crate::fallback::Delivery;
use crate::manager::LogManager;
use std::any::Any;
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt::Write as _;
use std::panic::Location;
use std::sync::Arc;

/// Channel unhandled errors are written to
pub const EXCEPTION_CHANNEL: &str = "exception";

/// Class reported for panics
pub const PANIC_CLASS: &str = "panic";

/// Structured fields extracted from an unhandled error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnhandledException {
    pub message: String,
    pub class: String,
    pub code: i64,
    pub file: String,
    pub line: u32,
    pub trace: String,
}

impl UnhandledException {
    pub fn new(message: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            class: class.into(),
            code: 0,
            file: String::new(),
            line: 0,
            trace: String::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = trace.into();
        self
    }

    /// Capture an error raised at `location`.
    ///
    /// The class is the error's type name without its module path. The
    /// trace lists the `source()` chain followed by a backtrace.
    pub fn from_error<E: Error + 'static>(err: &E, location: &Location<'_>) -> Self {
        let mut trace = String::new();
        let mut source = err.source();
        while let Some(cause) = source {
            let _ = writeln!(trace, "Caused by: {cause}");
            source = cause.source();
        }

        Self::new(err.to_string(), short_type_name::<E>())
            .with_location(location.file(), location.line())
            .with_trace(trace + &capture_backtrace())
            .ensure_trace()
    }

    /// Capture a panic payload and where it was raised
    pub fn from_panic(payload: &(dyn Any + Send), location: Option<&Location<'_>>) -> Self {
        let mut exception =
            Self::new(panic_message(payload), PANIC_CLASS).with_trace(capture_backtrace());
        if let Some(location) = location {
            exception = exception.with_location(location.file(), location.line());
        }
        exception.ensure_trace()
    }

    fn ensure_trace(mut self) -> Self {
        if self.trace.trim().is_empty() {
            self.trace = format!("#0 {}({})", self.file, self.line);
        }
        self
    }

    /// Record context; the fallback path leaves out the trace
    pub fn context(&self, include_trace: bool) -> LogContext {
        let context = LogContext::new()
            .with_field("exception_class", self.class.as_str())
            .with_field("code", self.code)
            .with_field("file", self.file.as_str())
            .with_field("line", self.line);
        if include_trace {
            context.with_field("trace", self.trace.as_str())
        } else {
            context
        }
    }
}

fn capture_backtrace() -> String {
    Backtrace::force_capture().to_string()
}

/// `a::b::Wrapper<c::D>` becomes `Wrapper<c::D>`
fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let (path, generics) = match full.find('<') {
        Some(idx) => full.split_at(idx),
        None => (full, ""),
    };
    let base = path.rsplit("::").next().unwrap_or(path);
    format!("{base}{generics}")
}

/// Event raised by the host when an error goes unhandled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnhandledExceptionEvent {
    pub exception: UnhandledException,
}

impl UnhandledExceptionEvent {
    pub fn new(exception: UnhandledException) -> Self {
        Self { exception }
    }
}

impl From<UnhandledException> for UnhandledExceptionEvent {
    fn from(exception: UnhandledException) -> Self {
        Self::new(exception)
    }
}

#[derive(Debug, Clone)]
pub struct ExceptionInterceptor {
    manager: Arc<LogManager>,
}

impl ExceptionInterceptor {
    pub fn new(manager: Arc<LogManager>) -> Self {
        Self { manager }
    }

    /// Interceptor writing through the process-wide manager
    pub fn global() -> Self {
        Self::new(LogManager::global())
    }

    pub fn manager(&self) -> &Arc<LogManager> {
        &self.manager
    }

    /// Write the exception once, falling back to the bare emitter
    pub fn handle(&self, event: &UnhandledExceptionEvent) -> Delivery {
        let _guard = DispatchGuard::enter();
        let exception = &event.exception;
        self.manager.deliver(
            EXCEPTION_CHANNEL,
            LogLevel::Error,
            &exception.message,
            exception.context(true),
            || exception.context(false),
        )
    }

    /// Write the exception with the bare emitter, touching no logger
    pub fn emit_fallback(&self, exception: &UnhandledException) -> Delivery {
        let record = LogRecord::new(
            LogLevel::Error,
            self.manager.channel_name(EXCEPTION_CHANNEL),
            exception.message.as_str(),
        )
        .with_context(exception.context(false));
        self.manager.fallback().emit(&record);
        self.manager.metrics().record_fallback();
        Delivery::Fallback
    }

    /// Capture `err` at the caller's location and handle it
    #[track_caller]
    pub fn report<E: Error + 'static>(&self, err: &E) -> Delivery {
        let exception = UnhandledException::from_error(err, Location::caller());
        self.handle(&exception.into())
    }
}

/// Route panics through `interceptor`, then through the previous hook.
///
/// A panic raised while this thread is inside a logger or building a channel
/// goes straight to the fallback emitter, since the locks held there are not
/// released until after the hook returns.
#[cfg(feature = "panic-hook")]
pub fn install_panic_hook(interceptor: Arc<ExceptionInterceptor>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let exception = UnhandledException::from_panic(info.payload(), info.location());
        if crate::core::dispatch_in_progress() {
            interceptor.emit_fallback(&exception);
        } else {
            interceptor.handle(&exception.into());
        }
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SharedBuffer;
    use crate::fallback::FallbackEmitter;
    use std::fmt;
    use std::io;

    #[derive(Debug)]
    struct RuntimeError(&'static str);

    impl fmt::Display for RuntimeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl Error for RuntimeError {}

    #[derive(Debug)]
    struct QueryFailed {
        source: RuntimeError,
    }

    impl fmt::Display for QueryFailed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("query failed")
        }
    }

    impl Error for QueryFailed {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.source)
        }
    }

    struct Closed;

    impl io::Write for Closed {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn boom() -> UnhandledExceptionEvent {
        UnhandledException::new("boom", "RuntimeError")
            .with_code(0)
            .with_location("a.ext", 42)
            .with_trace("#0 a.ext(42): main()")
            .into()
    }

    #[test]
    fn test_primary_record() {
        let buffer = SharedBuffer::new();
        let manager = Arc::new(LogManager::builder().writer(buffer.make_writer()).build());
        let interceptor = ExceptionInterceptor::new(manager);

        assert_eq!(interceptor.handle(&boom()), Delivery::Primary);

        let lines = buffer.json_lines().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["channel"], "app.exception");
        assert_eq!(lines[0]["message"], "boom");
        assert_eq!(lines[0]["level_name"], "ERROR");
        assert_eq!(
            lines[0]["context"],
            serde_json::json!({
                "exception_class": "RuntimeError",
                "code": 0,
                "file": "a.ext",
                "line": 42,
                "trace": "#0 a.ext(42): main()",
            })
        );
    }

    #[test]
    fn test_forced_failure_falls_back_without_trace() {
        let fallback = SharedBuffer::new();
        let manager = Arc::new(
            LogManager::builder()
                .writer(Arc::new(|| -> Box<dyn io::Write + Send> { Box::new(Closed) }))
                .fallback(FallbackEmitter::with_writer(fallback.make_writer()))
                .build(),
        );
        let interceptor = ExceptionInterceptor::new(Arc::clone(&manager));

        assert_eq!(interceptor.handle(&boom()), Delivery::Fallback);

        let lines = fallback.json_lines().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["message"], "boom");
        assert_eq!(lines[0]["level_name"], "ERROR");
        assert_eq!(lines[0]["level"], 400);
        assert_eq!(lines[0]["channel"], "app.exception");
        assert_eq!(
            lines[0]["context"],
            serde_json::json!({
                "exception_class": "RuntimeError",
                "code": 0,
                "file": "a.ext",
                "line": 42,
            })
        );
        assert_eq!(manager.metrics().fallback_deliveries(), 1);
    }

    #[test]
    fn test_emit_fallback_skips_the_channel() {
        let buffer = SharedBuffer::new();
        let manager = Arc::new(LogManager::builder().writer(buffer.make_writer()).build());
        let interceptor = ExceptionInterceptor::new(Arc::clone(&manager));

        assert_eq!(interceptor.emit_fallback(&boom().exception), Delivery::Fallback);

        assert!(!manager.is_cached(EXCEPTION_CHANNEL));
        assert_eq!(manager.metrics().fallback_deliveries(), 1);
        let lines = buffer.json_lines().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["channel"], "app.exception");
        assert!(lines[0]["context"].get("trace").is_none());
    }

    #[test]
    fn test_from_error_fields() {
        let location = Location::caller();
        let exception = UnhandledException::from_error(&RuntimeError("boom"), location);

        assert_eq!(exception.message, "boom");
        assert_eq!(exception.class, "RuntimeError");
        assert_eq!(exception.code, 0);
        assert_eq!(exception.file, location.file());
        assert_eq!(exception.line, location.line());
        assert!(!exception.trace.is_empty());
    }

    #[test]
    fn test_trace_includes_source_chain() {
        let err = QueryFailed {
            source: RuntimeError("connection reset"),
        };
        let exception = UnhandledException::from_error(&err, Location::caller());
        assert_eq!(exception.class, "QueryFailed");
        assert!(exception.trace.starts_with("Caused by: connection reset\n"));
    }

    #[test]
    fn test_report_uses_caller_location() {
        let buffer = SharedBuffer::new();
        let manager = Arc::new(LogManager::builder().writer(buffer.make_writer()).build());
        let interceptor = ExceptionInterceptor::new(manager);

        let line = line!() + 1;
        interceptor.report(&RuntimeError("late failure"));

        let lines = buffer.json_lines().unwrap();
        assert_eq!(lines[0]["context"]["line"], line);
        assert_eq!(lines[0]["context"]["exception_class"], "RuntimeError");
        assert!(lines[0]["context"]["file"].as_str().unwrap().ends_with("exception.rs"));
    }

    #[test]
    fn test_from_panic_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("index out of bounds");
        let exception = UnhandledException::from_panic(payload.as_ref(), None);
        assert_eq!(exception.message, "index out of bounds");
        assert_eq!(exception.class, PANIC_CLASS);
        assert!(!exception.trace.is_empty());

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        let location = Location::caller();
        let exception = UnhandledException::from_panic(payload.as_ref(), Some(location));
        assert_eq!(exception.message, "owned message");
        assert_eq!(exception.line, location.line());
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<RuntimeError>(), "RuntimeError");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec<alloc::string::String>");
        assert_eq!(short_type_name::<u8>(), "u8");
    }
}
