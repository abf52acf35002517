//! # Container Logs
//!
//! Redirects a host application's channel logging onto a single stream of
//! JSON lines on standard error, the way container platforms expect to
//! collect it.
//!
//! ## Features
//!
//! - **Channel registry**: one cached structured logger per channel name
//! - **Legacy shim**: per-file loggers keep their API but write to stderr
//! - **Always delivers**: any failure in the structured path falls back to a
//!   dependency-free JSON writer
//! - **Unhandled errors**: errors and panics become `ERROR` records on the
//!   `exception` channel
//!
//! ## Example
//!
//! ```
//! use container_logs::prelude::*;
//!
//! let buffer = SharedBuffer::new();
//! let manager = LogManager::builder().writer(buffer.make_writer()).build();
//!
//! manager
//!     .get_log("cron")
//!     .info("Ran {jobs} jobs", LogContext::new().with_field("jobs", 3))
//!     .unwrap();
//!
//! let line = &buffer.json_lines().unwrap()[0];
//! assert_eq!(line["channel"], "app.cron");
//! assert_eq!(line["message"], "Ran 3 jobs");
//! ```

pub mod appenders;
pub mod core;
pub mod exception;
pub mod fallback;
pub mod legacy;
pub mod macros;
pub mod manager;

pub mod prelude {
    pub use crate::appenders::StreamAppender;
    pub use crate::core::{
        Appender, ChannelLogger, FieldValue, JsonFormatter, LegacyPriority, LogContext, LogLevel,
        LogRecord, LoggerError, PearPriority, PlaceholderProcessor, PriorityMask, Processor,
        Result, SharedBuffer, StructuredLogger, TimestampFormat,
    };
    pub use crate::exception::{ExceptionInterceptor, UnhandledException, UnhandledExceptionEvent};
    pub use crate::fallback::{Delivery, FallbackEmitter};
    pub use crate::legacy::{LegacyDrivers, LegacyLogger, LegacyMessage, StderrFileLogger};
    pub use crate::manager::{ChannelFactory, LogManager};
}

pub use crate::appenders::StreamAppender;
pub use crate::core::{
    Appender, BridgeMetrics, ChannelLogger, FieldValue, JsonFormatter, LegacyPriority,
    LogContext, LogLevel, LogRecord, LoggerError, PearPriority, PriorityMask, Result,
    SharedBuffer, StructuredLogger, TimestampFormat,
};
#[cfg(feature = "panic-hook")]
pub use crate::exception::install_panic_hook;
pub use crate::exception::{ExceptionInterceptor, UnhandledException, UnhandledExceptionEvent};
pub use crate::fallback::{Delivery, FallbackEmitter};
pub use crate::legacy::{LegacyDrivers, LegacyLogger, LegacyMessage, StderrFileLogger};
pub use crate::manager::{ChannelFactory, LogManager, LogManagerBuilder, StderrJsonFactory};

/// Logger for `channel` from the process-wide manager
pub fn get_log(channel: &str) -> std::sync::Arc<dyn StructuredLogger> {
    LogManager::global().get_log(channel)
}
