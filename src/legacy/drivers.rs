//! Driver registry for legacy loggers
//!
//! Legacy hosts ask for a logger by handler name (`"file"`, `"console"`, ...).
//! The registry decides which implementation answers; installing the stderr
//! shim under `"file"` is what reroutes per-file logging onto stderr.

use super::{LegacyLogger, StderrFileLogger};
use crate::core::PearPriority;
use crate::manager::LogManager;
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

/// Handler options, e.g. `timeFormat`
pub type LegacyConf = HashMap<String, String>;

/// Arguments handed to a driver constructor
#[derive(Debug, Clone)]
pub struct DriverArgs {
    pub name: String,
    pub ident: String,
    pub conf: LegacyConf,
    pub level: PearPriority,
}

pub type DriverConstructor = Arc<dyn Fn(DriverArgs) -> Box<dyn LegacyLogger> + Send + Sync>;

#[derive(Default)]
pub struct LegacyDrivers {
    drivers: RwLock<HashMap<String, DriverConstructor>>,
}

impl LegacyDrivers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose `file` driver writes through `manager`
    pub fn with_stderr_shim(manager: Arc<LogManager>) -> Self {
        let drivers = Self::new();
        drivers.install(
            "file",
            Arc::new(move |args: DriverArgs| -> Box<dyn LegacyLogger> {
                Box::new(StderrFileLogger::with_manager(
                    Arc::clone(&manager),
                    args.name,
                    args.ident,
                    &args.conf,
                    args.level,
                ))
            }),
        );
        drivers
    }

    /// Register `constructor` unless `handler` is already taken.
    ///
    /// Returns `true` if this call installed it.
    pub fn install(&self, handler: &str, constructor: DriverConstructor) -> bool {
        match self.drivers.write().entry(handler.to_lowercase()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(constructor);
                true
            }
        }
    }

    /// Register `constructor`, returning the one it displaced
    pub fn replace(
        &self,
        handler: &str,
        constructor: DriverConstructor,
    ) -> Option<DriverConstructor> {
        self.drivers.write().insert(handler.to_lowercase(), constructor)
    }

    pub fn is_installed(&self, handler: &str) -> bool {
        self.drivers.read().contains_key(&handler.to_lowercase())
    }

    /// Build a logger for `handler`; `None` if no driver answers to it
    pub fn create(
        &self,
        handler: &str,
        name: impl Into<String>,
        ident: impl Into<String>,
        conf: LegacyConf,
        level: PearPriority,
    ) -> Option<Box<dyn LegacyLogger>> {
        let constructor = self.drivers.read().get(&handler.to_lowercase()).cloned()?;
        Some(constructor(DriverArgs {
            name: name.into(),
            ident: ident.into(),
            conf,
            level,
        }))
    }

    pub fn handlers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.drivers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for LegacyDrivers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyDrivers")
            .field("handlers", &self.handlers())
            .finish()
    }
}
