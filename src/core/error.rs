//! Error types for the logging bridge

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The structured logging capability could not be constructed
    #[error("{component} unavailable: {message}")]
    Unavailable { component: String, message: String },

    /// Appender returned an error while writing a record
    #[error("Appender '{appender}' failed: {message}")]
    AppenderFailed { appender: String, message: String },

    /// Appender panicked while writing a record
    #[error("Appender '{appender}' panicked: {message}")]
    AppenderPanicked { appender: String, message: String },

    /// Level name outside the canonical set
    #[error("Invalid log level: '{0}'")]
    UnknownLevel(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an unavailable-capability error
    pub fn unavailable(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Unavailable {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an appender failure error
    pub fn appender(appender: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::AppenderFailed {
            appender: appender.into(),
            message: message.into(),
        }
    }

    /// Create an appender panic error
    pub fn appender_panic(appender: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::AppenderPanicked {
            appender: appender.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}

/// Render a panic payload captured by `catch_unwind`
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
