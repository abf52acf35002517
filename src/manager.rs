//! Channel registry
//!
//! [`LogManager`] hands out one structured logger per channel name, building
//! it on first request and caching it for the life of the process. If a
//! logger cannot be built, the caller gets a [`BuiltinLogger`] that writes
//! through the fallback emitter instead; `get_log` itself never fails.

use crate::core::{
    error::panic_message, stderr_writer, ChannelLogger, DispatchGuard, LogContext, LogLevel,
    LogRecord, LoggerError, MakeWriter, PlaceholderProcessor, Result, StructuredLogger,
};
use crate::appenders::StreamAppender;
use crate::core::BridgeMetrics;
use crate::fallback::{Delivery, FallbackEmitter};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

/// Environment variable holding the process-wide minimum level
pub const LEVEL_ENV_VAR: &str = "CONTAINER_LOGS_LEVEL";

/// Channel requested when the caller does not name one
pub const DEFAULT_CHANNEL: &str = "default";

/// Prefix shared by every channel name written to the stream
pub const DEFAULT_NAMESPACE: &str = "app";

static GLOBAL: OnceLock<Arc<LogManager>> = OnceLock::new();

/// Builds the structured logger for a channel
pub trait ChannelFactory: Send + Sync {
    fn create(&self, channel_name: &str, min_level: LogLevel) -> Result<ChannelLogger>;
}

/// Placeholder interpolation, one JSON stream appender
pub struct StderrJsonFactory {
    make_writer: MakeWriter,
}

impl StderrJsonFactory {
    pub fn new() -> Self {
        Self::with_writer(stderr_writer())
    }

    pub fn with_writer(make_writer: MakeWriter) -> Self {
        Self { make_writer }
    }
}

impl Default for StderrJsonFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelFactory for StderrJsonFactory {
    fn create(&self, channel_name: &str, min_level: LogLevel) -> Result<ChannelLogger> {
        Ok(ChannelLogger::builder(channel_name)
            .processor(PlaceholderProcessor::new())
            .appender(StreamAppender::new(Arc::clone(&self.make_writer), min_level))
            .build())
    }
}

/// Where the minimum level comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelSetting {
    Fixed(LogLevel),
    /// Read from an environment variable each time a channel is built
    Env(String),
}

impl LevelSetting {
    /// Absent or invalid values resolve to `Debug`
    pub fn resolve(&self) -> LogLevel {
        match self {
            LevelSetting::Fixed(level) => *level,
            LevelSetting::Env(var) => std::env::var(var)
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(LogLevel::Debug),
        }
    }
}

impl Default for LevelSetting {
    fn default() -> Self {
        LevelSetting::Fixed(LogLevel::Debug)
    }
}

/// Minimal logger used when the structured path cannot be built
///
/// Every call goes straight to the fallback emitter.
#[derive(Debug, Clone)]
pub struct BuiltinLogger {
    channel: String,
    min_level: LogLevel,
    emitter: FallbackEmitter,
}

impl BuiltinLogger {
    pub fn new(channel: impl Into<String>, min_level: LogLevel, emitter: FallbackEmitter) -> Self {
        Self {
            channel: channel.into(),
            min_level,
            emitter,
        }
    }
}

impl StructuredLogger for BuiltinLogger {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn log(&self, level: LogLevel, message: &str, context: LogContext) -> Result<()> {
        if level >= self.min_level {
            self.emitter.emit(
                &LogRecord::new(level, self.channel.as_str(), message).with_context(context),
            );
        }
        Ok(())
    }

    fn is_fallback(&self) -> bool {
        true
    }
}

pub struct LogManager {
    channels: RwLock<HashMap<String, Arc<dyn StructuredLogger>>>,
    factory: Arc<dyn ChannelFactory>,
    level: LevelSetting,
    namespace: String,
    fallback: FallbackEmitter,
    metrics: Arc<BridgeMetrics>,
}

impl LogManager {
    /// Manager writing to stderr at `Debug`
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for LogManager
    ///
    /// # Example
    /// ```
    /// use container_logs::prelude::*;
    ///
    /// let manager = LogManager::builder()
    ///     .min_level(LogLevel::Info)
    ///     .namespace("billing")
    ///     .build();
    /// assert_eq!(manager.channel_name("default"), "billing");
    /// assert_eq!(manager.channel_name("cron"), "billing.cron");
    /// ```
    #[must_use]
    pub fn builder() -> LogManagerBuilder {
        LogManagerBuilder::new()
    }

    /// The process-wide manager, configured from [`LEVEL_ENV_VAR`]
    pub fn global() -> Arc<LogManager> {
        Arc::clone(GLOBAL.get_or_init(|| {
            Arc::new(
                LogManager::builder()
                    .level_from_env(LEVEL_ENV_VAR)
                    .build(),
            )
        }))
    }

    /// Find or create the logger for `channel`.
    ///
    /// The first construction to be cached wins; later calls return that
    /// instance. Construction runs without the registry lock held, so racing
    /// callers may each build one and all but the first are dropped. If
    /// construction fails or panics, a [`BuiltinLogger`] is returned and
    /// nothing is cached, so a later call may still succeed.
    pub fn get_log(&self, channel: &str) -> Arc<dyn StructuredLogger> {
        if let Some(logger) = self.channels.read().get(channel) {
            return Arc::clone(logger);
        }

        let channel_name = self.channel_name(channel);
        match self.build_channel(&channel_name) {
            Ok(logger) => {
                let logger: Arc<dyn StructuredLogger> = Arc::new(logger);
                let mut channels = self.channels.write();
                Arc::clone(channels.entry(channel.to_string()).or_insert(logger))
            }
            Err(_) => {
                self.metrics.record_builtin();
                Arc::new(BuiltinLogger::new(
                    channel_name,
                    self.level.resolve(),
                    self.fallback.clone(),
                ))
            }
        }
    }

    /// Logger for the `default` channel
    pub fn default_log(&self) -> Arc<dyn StructuredLogger> {
        self.get_log(DEFAULT_CHANNEL)
    }

    fn build_channel(&self, channel_name: &str) -> Result<ChannelLogger> {
        let _guard = DispatchGuard::enter();
        let min_level = self.level.resolve();
        catch_unwind(AssertUnwindSafe(|| self.factory.create(channel_name, min_level)))
            .unwrap_or_else(|payload| {
                Err(LoggerError::unavailable(
                    "ChannelFactory",
                    panic_message(payload.as_ref()),
                ))
            })
    }

    /// Stream-facing name: the namespace alone for `default`, otherwise
    /// `namespace.channel`
    pub fn channel_name(&self, channel: &str) -> String {
        if channel == DEFAULT_CHANNEL {
            self.namespace.clone()
        } else {
            format!("{}.{}", self.namespace, channel)
        }
    }

    /// Write one record on `channel`, falling back to the bare emitter with
    /// `fallback_context()` on any failure.
    ///
    /// A write that went through a [`BuiltinLogger`] already reached the
    /// fallback emitter and is reported as [`Delivery::Fallback`].
    pub fn deliver<C>(
        &self,
        channel: &str,
        level: LogLevel,
        message: &str,
        context: LogContext,
        fallback_context: C,
    ) -> Delivery
    where
        C: FnOnce() -> LogContext,
    {
        let mut via_builtin = false;
        let delivery = self.fallback.attempt(
            || {
                let logger = self.get_log(channel);
                via_builtin = logger.is_fallback();
                logger.log(level, message, context)
            },
            || {
                LogRecord::new(level, self.channel_name(channel), message)
                    .with_context(fallback_context())
            },
        );

        match delivery {
            Delivery::Primary if !via_builtin => {
                self.metrics.record_primary();
                Delivery::Primary
            }
            Delivery::Primary | Delivery::Fallback => {
                self.metrics.record_fallback();
                Delivery::Fallback
            }
        }
    }

    pub fn fallback(&self) -> &FallbackEmitter {
        &self.fallback
    }

    pub fn metrics(&self) -> &BridgeMetrics {
        &self.metrics
    }

    pub fn is_cached(&self, channel: &str) -> bool {
        self.channels.read().contains_key(channel)
    }

    /// Names of cached channels, sorted
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop every cached logger; the next `get_log` rebuilds
    pub fn reset(&self) {
        self.channels.write().clear();
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogManager")
            .field("namespace", &self.namespace)
            .field("level", &self.level)
            .field("channels", &self.channels())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing LogManager with a fluent API
pub struct LogManagerBuilder {
    level: LevelSetting,
    namespace: String,
    make_writer: MakeWriter,
    fallback: Option<FallbackEmitter>,
    factory: Option<Arc<dyn ChannelFactory>>,
}

impl LogManagerBuilder {
    pub fn new() -> Self {
        Self {
            level: LevelSetting::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            make_writer: stderr_writer(),
            fallback: None,
            factory: None,
        }
    }

    /// Set a fixed minimum level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.level = LevelSetting::Fixed(level);
        self
    }

    /// Read the minimum level from `var` whenever a channel is built
    #[must_use = "builder methods return a new value"]
    pub fn level_from_env(mut self, var: impl Into<String>) -> Self {
        self.level = LevelSetting::Env(var.into());
        self
    }

    /// Prefix for channel names; blank values keep the default
    #[must_use = "builder methods return a new value"]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        if !namespace.trim().is_empty() {
            self.namespace = namespace;
        }
        self
    }

    /// Stream used by both the default factory and the fallback emitter
    #[must_use = "builder methods return a new value"]
    pub fn writer(mut self, make_writer: MakeWriter) -> Self {
        self.make_writer = make_writer;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn fallback(mut self, fallback: FallbackEmitter) -> Self {
        self.fallback = Some(fallback);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn factory(mut self, factory: Arc<dyn ChannelFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn build(self) -> LogManager {
        let make_writer = self.make_writer;
        LogManager {
            channels: RwLock::new(HashMap::new()),
            factory: self.factory.unwrap_or_else(|| {
                Arc::new(StderrJsonFactory::with_writer(Arc::clone(&make_writer)))
            }),
            level: self.level,
            namespace: self.namespace,
            fallback: self
                .fallback
                .unwrap_or_else(|| FallbackEmitter::with_writer(make_writer)),
            metrics: Arc::new(BridgeMetrics::new()),
        }
    }
}

impl Default for LogManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
