//! Logging macros for ergonomic message formatting.
//!
//! These macros format their arguments like `format!` and hand the result to
//! a [`StructuredLogger`](crate::StructuredLogger) with an empty context,
//! returning the logger's `Result`.
//!
//! # Examples
//!
//! ```
//! use container_logs::prelude::*;
//! use container_logs::{context, info};
//!
//! let buffer = SharedBuffer::new();
//! let manager = LogManager::builder().writer(buffer.make_writer()).build();
//! let logger = manager.get_log("worker");
//!
//! info!(logger, "Server listening on port {}", 8080).unwrap();
//! logger
//!     .warning("Queue {queue} is backing up", context! { "queue" => "mail" })
//!     .unwrap();
//!
//! assert_eq!(buffer.lines().len(), 2);
//! ```

/// Build a [`LogContext`](crate::LogContext) from `key => value` pairs.
///
/// # Examples
///
/// ```
/// use container_logs::context;
///
/// let ctx = context! { "user_id" => 42, "action" => "login" };
/// assert_eq!(ctx.len(), 2);
/// assert!(context! {}.is_empty());
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::LogContext::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::LogContext::new()$(.with_field($key, $value))+
    };
}

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use container_logs::prelude::*;
/// # let buffer = SharedBuffer::new();
/// # let logger = LogManager::builder().writer(buffer.make_writer()).build().default_log();
/// use container_logs::log;
/// log!(logger, LogLevel::Info, "Simple message").unwrap();
/// log!(logger, LogLevel::Error, "Error code: {}", 500).unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        use $crate::StructuredLogger as _;
        $logger.log($level, &format!($($arg)+), $crate::LogContext::new())
    }};
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a notice-level message.
#[macro_export]
macro_rules! notice {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Notice, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use container_logs::prelude::*;
/// # let buffer = SharedBuffer::new();
/// # let logger = LogManager::builder().writer(buffer.make_writer()).build().default_log();
/// use container_logs::error;
/// let path = "/var/lib/app/state";
/// error!(logger, "Failed to open {}", path).unwrap();
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $($arg)+)
    };
}

/// Log an alert-level message.
#[macro_export]
macro_rules! alert {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Alert, $($arg)+)
    };
}

/// Log an emergency-level message.
#[macro_export]
macro_rules! emergency {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Emergency, $($arg)+)
    };
}
