//! Core logger types and traits

pub mod appender;
pub mod error;
pub mod formatter;
pub mod log_context;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod processor;
pub mod severity;
pub mod timestamp;
pub mod writer;

pub use appender::Appender;
pub use error::{LoggerError, Result};
pub use formatter::JsonFormatter;
pub use log_context::{FieldValue, LogContext};
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use logger::{
    dispatch_in_progress, ChannelLogger, ChannelLoggerBuilder, DispatchGuard, StructuredLogger,
};
pub use metrics::BridgeMetrics;
pub use processor::{interpolate, PlaceholderProcessor, Processor};
pub use severity::{
    to_canonical, to_legacy_numeric, to_weight, LegacyPriority, PearPriority, PriorityMask,
};
pub use timestamp::{TimestampFormat, DEFAULT_LEGACY_TIME_FORMAT};
pub use writer::{stderr_writer, MakeWriter, SharedBuffer};
