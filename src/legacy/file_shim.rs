//! File logger that never touches a file

use super::{LegacyConf, LegacyLogger, LegacyMessage, LogEvent, LogObserver};
use crate::core::{
    LegacyPriority, LogContext, PearPriority, PriorityMask, TimestampFormat,
    DEFAULT_LEGACY_TIME_FORMAT,
};
use crate::manager::LogManager;
use std::path::Path;
use std::sync::Arc;

/// Channel every legacy call is written to
pub const LEGACY_CHANNEL: &str = "debug";

/// Stand-in for a per-file logger: records go to the manager's `debug`
/// channel, or straight to the fallback emitter if that fails.
pub struct StderrFileLogger {
    id: String,
    filename: String,
    ident: String,
    priority: PearPriority,
    mask: PriorityMask,
    time_format: TimestampFormat,
    opened: bool,
    observers: Vec<Arc<dyn LogObserver>>,
    manager: Arc<LogManager>,
}

impl StderrFileLogger {
    /// Logger bound to the process-wide manager
    pub fn new(
        filename: impl Into<String>,
        ident: impl Into<String>,
        conf: &LegacyConf,
        level: PearPriority,
    ) -> Self {
        Self::with_manager(LogManager::global(), filename, ident, conf, level)
    }

    pub fn with_manager(
        manager: Arc<LogManager>,
        filename: impl Into<String>,
        ident: impl Into<String>,
        conf: &LegacyConf,
        level: PearPriority,
    ) -> Self {
        let time_format = conf
            .get("timeFormat")
            .filter(|format| !format.is_empty())
            .map_or_else(
                || TimestampFormat::Custom(DEFAULT_LEGACY_TIME_FORMAT.to_string()),
                |format| TimestampFormat::Custom(format.clone()),
            );

        Self {
            id: format!("{:032x}", rand::random::<u128>()),
            filename: filename.into(),
            ident: ident.into(),
            priority: level,
            mask: PriorityMask::max(level),
            time_format,
            opened: false,
            observers: Vec::new(),
            manager,
        }
    }

    /// Display-only target name
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Display-only time format from the `timeFormat` option
    pub fn time_format(&self) -> &TimestampFormat {
        &self.time_format
    }

    fn basename(&self) -> String {
        Path::new(&self.filename)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.filename.clone())
    }

    fn announce(&self, event: &LogEvent) {
        for observer in &self.observers {
            if event.priority <= observer.priority() {
                observer.notify(event);
            }
        }
    }
}

impl LegacyLogger for StderrFileLogger {
    fn id(&self) -> &str {
        &self.id
    }

    fn ident(&self) -> &str {
        &self.ident
    }

    fn set_ident(&mut self, ident: String) {
        self.ident = ident;
    }

    fn priority(&self) -> PearPriority {
        self.priority
    }

    fn set_priority(&mut self, priority: PearPriority) {
        self.priority = priority;
    }

    fn mask(&self) -> PriorityMask {
        self.mask
    }

    fn set_mask(&mut self, mask: PriorityMask) {
        self.mask = mask;
    }

    fn is_open(&self) -> bool {
        self.opened
    }

    fn open(&mut self) -> bool {
        self.opened = true;
        true
    }

    fn close(&mut self) -> bool {
        self.opened = false;
        true
    }

    fn flush(&mut self) -> bool {
        true
    }

    fn log(&self, message: LegacyMessage, priority: LegacyPriority) -> bool {
        let resolved = priority.resolve(self.priority);
        if !self.is_masked(resolved) {
            self.manager.metrics().record_filtered();
            return false;
        }

        let message = message.render();
        let level = resolved.routed_level();
        let context = LogContext::new()
            .with_field("ident", self.ident.as_str())
            .with_field("file", self.basename());

        self.manager.deliver(LEGACY_CHANNEL, level, &message, context.clone(), || context);

        self.announce(&LogEvent {
            original: priority,
            priority: resolved,
            message,
        });

        true
    }

    fn attach(&mut self, observer: Arc<dyn LogObserver>) -> bool {
        if self.observers.iter().any(|o| o.id() == observer.id()) {
            return false;
        }
        self.observers.push(observer);
        true
    }

    fn detach(&mut self, observer_id: &str) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| o.id() != observer_id);
        self.observers.len() != before
    }
}

impl Drop for StderrFileLogger {
    fn drop(&mut self) {
        if self.opened {
            self.close();
        }
    }
}

impl std::fmt::Debug for StderrFileLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StderrFileLogger")
            .field("id", &self.id)
            .field("filename", &self.filename)
            .field("ident", &self.ident)
            .field("priority", &self.priority)
            .field("mask", &self.mask)
            .field("opened", &self.opened)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SharedBuffer;
    use parking_lot::Mutex;

    fn capture(level: PearPriority) -> (StderrFileLogger, SharedBuffer, Arc<LogManager>) {
        let buffer = SharedBuffer::new();
        let manager = Arc::new(LogManager::builder().writer(buffer.make_writer()).build());
        let logger = StderrFileLogger::with_manager(
            Arc::clone(&manager),
            "/var/www/files/civicrm/ConfigAndLog/CiviCRM.abc123.log",
            "civicrm",
            &LegacyConf::new(),
            level,
        );
        (logger, buffer, manager)
    }

    struct Recorder {
        id: String,
        threshold: PearPriority,
        events: Mutex<Vec<LogEvent>>,
    }

    impl LogObserver for Recorder {
        fn id(&self) -> &str {
            &self.id
        }

        fn priority(&self) -> PearPriority {
            self.threshold
        }

        fn notify(&self, event: &LogEvent) {
            self.events.lock().push(event.clone());
        }
    }

    #[test]
    fn test_ids_are_unique_hex() {
        let (a, _, _) = capture(PearPriority::Debug);
        let (b, _, _) = capture(PearPriority::Debug);
        assert_eq!(a.id().len(), 32);
        assert!(a.id().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_open_close_flush_only_toggle_state() {
        let (mut logger, buffer, _) = capture(PearPriority::Debug);
        assert!(!logger.is_open());
        assert!(logger.open());
        assert!(logger.is_open());
        assert!(logger.flush());
        assert!(logger.close());
        assert!(!logger.is_open());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_writes_context_with_ident_and_basename() {
        let (logger, buffer, _) = capture(PearPriority::Debug);
        assert!(logger.log("cache cleared".into(), LegacyPriority::Unset));

        let lines = buffer.json_lines().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["channel"], "app.debug");
        assert_eq!(lines[0]["message"], "cache cleared");
        assert_eq!(lines[0]["level_name"], "DEBUG");
        assert_eq!(
            lines[0]["context"],
            serde_json::json!({ "ident": "civicrm", "file": "CiviCRM.abc123.log" })
        );
    }

    #[test]
    fn test_mask_filters_less_severe() {
        let (logger, buffer, manager) = capture(PearPriority::Warning);

        assert!(!logger.log("noise".into(), PearPriority::Debug.into()));
        assert!(buffer.is_empty());
        assert_eq!(manager.metrics().filtered(), 1);

        assert!(logger.log("real problem".into(), PearPriority::Err.into()));
        let lines = buffer.json_lines().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level_name"], "ERROR");
    }

    #[test]
    fn test_string_priorities() {
        let (logger, buffer, _) = capture(PearPriority::Debug);
        logger.log("by name".into(), "error".into());
        logger.log("short name".into(), "warning".into());
        logger.log("unknown name".into(), "LOUD".into());

        let names: Vec<String> = buffer
            .json_lines()
            .unwrap()
            .iter()
            .map(|l| l["level_name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["ERROR", "WARNING", "INFO"]);
    }

    #[test]
    fn test_most_severe_priorities_route_as_critical() {
        let (logger, buffer, _) = capture(PearPriority::Debug);
        logger.emerg("down".into());
        logger.alert("paging".into());

        for line in buffer.json_lines().unwrap() {
            assert_eq!(line["level_name"], "CRITICAL");
            assert_eq!(line["level"], 500);
        }
    }

    #[test]
    fn test_set_mask_overrides_threshold() {
        let (mut logger, buffer, _) = capture(PearPriority::Debug);
        logger.set_mask(PriorityMask::single(PearPriority::Notice));

        assert!(!logger.err("masked".into()));
        assert!(logger.notice("only notices".into()));
        assert_eq!(buffer.lines().len(), 1);
    }

    #[test]
    fn test_observers_notified_on_both_paths() {
        let (mut logger, _, _) = capture(PearPriority::Debug);
        let recorder = Arc::new(Recorder {
            id: "audit".to_string(),
            threshold: PearPriority::Warning,
            events: Mutex::new(Vec::new()),
        });
        assert!(logger.attach(recorder.clone()));
        assert!(!logger.attach(recorder.clone()));

        logger.log("kept".into(), "err".into());
        logger.log("below observer threshold".into(), "info".into());

        let events = recorder.events.lock().clone();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].priority, PearPriority::Err);
        assert_eq!(events[0].original, LegacyPriority::Name("err".to_string()));
        assert_eq!(events[0].message, "kept");

        assert!(logger.detach("audit"));
        assert!(!logger.detach("audit"));
    }

    #[test]
    fn test_primary_failure_falls_back_once() {
        struct Closed;
        impl std::io::Write for Closed {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let fallback = SharedBuffer::new();
        let manager = Arc::new(
            LogManager::builder()
                .writer(Arc::new(|| -> Box<dyn std::io::Write + Send> { Box::new(Closed) }))
                .fallback(crate::fallback::FallbackEmitter::with_writer(fallback.make_writer()))
                .build(),
        );
        let logger = StderrFileLogger::with_manager(
            manager.clone(),
            "x.log",
            "civicrm",
            &LegacyConf::new(),
            PearPriority::Debug,
        );

        assert!(logger.warning("disk nearly full".into()));

        let lines = fallback.json_lines().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["channel"], "app.debug");
        assert_eq!(lines[0]["level_name"], "WARNING");
        assert_eq!(lines[0]["context"]["file"], "x.log");
        assert_eq!(manager.metrics().fallback_deliveries(), 1);
        assert_eq!(manager.metrics().primary_deliveries(), 0);
        assert_eq!(manager.get_log(LEGACY_CHANNEL).channel(), "app.debug");
    }

    #[test]
    fn test_time_format_option() {
        let buffer = SharedBuffer::new();
        let manager = Arc::new(LogManager::builder().writer(buffer.make_writer()).build());

        let mut conf = LegacyConf::new();
        conf.insert("timeFormat".to_string(), "%H:%M".to_string());
        let custom =
            StderrFileLogger::with_manager(manager.clone(), "a.log", "", &conf, PearPriority::Info);
        assert_eq!(custom.time_format(), &TimestampFormat::Custom("%H:%M".to_string()));

        let default = StderrFileLogger::with_manager(
            manager,
            "a.log",
            "",
            &LegacyConf::new(),
            PearPriority::Info,
        );
        assert_eq!(
            default.time_format(),
            &TimestampFormat::Custom(DEFAULT_LEGACY_TIME_FORMAT.to_string())
        );
    }
}
