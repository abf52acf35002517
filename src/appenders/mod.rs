//! Appender implementations

pub mod stream;

pub use stream::StreamAppender;

// Re-export trait for convenience
pub use crate::core::Appender;
