//! Legacy priority normalization
//!
//! Legacy callers pass priorities as numeric constants (`0` = emergency ..
//! `7` = debug), as string names, or not at all. Everything funnels through
//! [`LegacyPriority`] and resolves to a [`PearPriority`] and from there to a
//! canonical [`LogLevel`]. Unknown values resolve to `info`.

use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Legacy numeric priority (lower is more severe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PearPriority {
    Emerg = 0,
    Alert = 1,
    Crit = 2,
    Err = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl PearPriority {
    pub const ALL: [PearPriority; 8] = [
        PearPriority::Emerg,
        PearPriority::Alert,
        PearPriority::Crit,
        PearPriority::Err,
        PearPriority::Warning,
        PearPriority::Notice,
        PearPriority::Info,
        PearPriority::Debug,
    ];

    pub fn from_numeric(value: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|p| i64::from(*p as u8) == value)
    }

    /// Case-sensitive lookup. Accepts the short legacy names and the long
    /// canonical spellings callers also pass (`"error"`, `"critical"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "emerg" | "emergency" => Some(PearPriority::Emerg),
            "alert" => Some(PearPriority::Alert),
            "crit" | "critical" => Some(PearPriority::Crit),
            "err" | "error" => Some(PearPriority::Err),
            "warning" => Some(PearPriority::Warning),
            "notice" => Some(PearPriority::Notice),
            "info" => Some(PearPriority::Info),
            "debug" => Some(PearPriority::Debug),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> i64 {
        i64::from(*self as u8)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PearPriority::Emerg => "emerg",
            PearPriority::Alert => "alert",
            PearPriority::Crit => "crit",
            PearPriority::Err => "err",
            PearPriority::Warning => "warning",
            PearPriority::Notice => "notice",
            PearPriority::Info => "info",
            PearPriority::Debug => "debug",
        }
    }

    /// Lossless mapping onto the canonical scale
    pub fn to_level(&self) -> LogLevel {
        match self {
            PearPriority::Emerg => LogLevel::Emergency,
            PearPriority::Alert => LogLevel::Alert,
            PearPriority::Crit => LogLevel::Critical,
            PearPriority::Err => LogLevel::Error,
            PearPriority::Warning => LogLevel::Warning,
            PearPriority::Notice => LogLevel::Notice,
            PearPriority::Info => LogLevel::Info,
            PearPriority::Debug => LogLevel::Debug,
        }
    }

    /// Level written to a channel on behalf of a legacy caller.
    ///
    /// Emergency and alert collapse to critical, so the three most severe
    /// legacy priorities all land on the same level.
    pub fn routed_level(&self) -> LogLevel {
        self.to_level().min(LogLevel::Critical)
    }

    pub fn from_level(level: LogLevel) -> Self {
        match level {
            LogLevel::Emergency => PearPriority::Emerg,
            LogLevel::Alert => PearPriority::Alert,
            LogLevel::Critical => PearPriority::Crit,
            LogLevel::Error => PearPriority::Err,
            LogLevel::Warning => PearPriority::Warning,
            LogLevel::Notice => PearPriority::Notice,
            LogLevel::Info => PearPriority::Info,
            LogLevel::Debug => PearPriority::Debug,
        }
    }
}

impl fmt::Display for PearPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A priority as handed over by a legacy caller
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LegacyPriority {
    Numeric(i64),
    Name(String),
    #[default]
    Unset,
}

impl LegacyPriority {
    /// Resolve to a legacy priority, using `default` when unset.
    /// Unrecognized numbers and names resolve to `Info`.
    pub fn resolve(&self, default: PearPriority) -> PearPriority {
        match self {
            LegacyPriority::Numeric(n) => {
                PearPriority::from_numeric(*n).unwrap_or(PearPriority::Info)
            }
            LegacyPriority::Name(name) => {
                PearPriority::from_name(name).unwrap_or(PearPriority::Info)
            }
            LegacyPriority::Unset => default,
        }
    }
}

impl From<PearPriority> for LegacyPriority {
    fn from(p: PearPriority) -> Self {
        LegacyPriority::Numeric(p.as_numeric())
    }
}

impl From<i64> for LegacyPriority {
    fn from(n: i64) -> Self {
        LegacyPriority::Numeric(n)
    }
}

impl From<i32> for LegacyPriority {
    fn from(n: i32) -> Self {
        LegacyPriority::Numeric(i64::from(n))
    }
}

impl From<&str> for LegacyPriority {
    fn from(s: &str) -> Self {
        LegacyPriority::Name(s.to_string())
    }
}

impl From<String> for LegacyPriority {
    fn from(s: String) -> Self {
        LegacyPriority::Name(s)
    }
}

impl<T: Into<LegacyPriority>> From<Option<T>> for LegacyPriority {
    fn from(value: Option<T>) -> Self {
        value.map_or(LegacyPriority::Unset, Into::into)
    }
}

/// Normalize any legacy priority to a canonical level
pub fn to_canonical(priority: &LegacyPriority) -> LogLevel {
    priority.resolve(PearPriority::Info).to_level()
}

/// Canonical level to its legacy numeric constant
pub fn to_legacy_numeric(level: LogLevel) -> i64 {
    PearPriority::from_level(level).as_numeric()
}

/// Canonical level to its JSON weight
pub fn to_weight(level: LogLevel) -> u16 {
    level.weight()
}

/// Bitset over legacy priorities; bit `p` enables priority `p`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriorityMask(u32);

impl PriorityMask {
    /// Only `priority`
    pub fn single(priority: PearPriority) -> Self {
        PriorityMask(1 << (priority as u8))
    }

    /// `priority` and everything more severe
    pub fn max(priority: PearPriority) -> Self {
        PriorityMask((1 << (priority as u8 + 1)) - 1)
    }

    /// `priority` and everything less severe
    pub fn min(priority: PearPriority) -> Self {
        PriorityMask(Self::all().0 & !((1 << (priority as u8)) - 1))
    }

    pub fn all() -> Self {
        Self::max(PearPriority::Debug)
    }

    pub fn none() -> Self {
        PriorityMask(0)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, priority: PearPriority) -> bool {
        self.0 & Self::single(priority).0 != 0
    }
}

impl Default for PriorityMask {
    fn default() -> Self {
        Self::all()
    }
}
