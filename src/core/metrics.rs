//! Delivery counters for the logging bridge
//!
//! The bridge writes nothing but JSON records to stderr, so its own health
//! is observable only through these counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for primary/fallback delivery
///
/// # Example
///
/// ```
/// use container_logs::BridgeMetrics;
///
/// let metrics = BridgeMetrics::new();
/// metrics.record_primary();
/// metrics.record_fallback();
///
/// assert_eq!(metrics.primary_deliveries(), 1);
/// assert_eq!(metrics.fallback_rate(), 50.0);
/// ```
#[derive(Debug)]
pub struct BridgeMetrics {
    /// Records written through a channel logger
    primary_deliveries: AtomicU64,

    /// Records written by the fallback emitter after a primary failure
    fallback_deliveries: AtomicU64,

    /// Legacy calls rejected by a priority mask
    filtered: AtomicU64,

    /// Times `get_log` handed out a built-in logger
    builtin_loggers: AtomicU64,
}

impl BridgeMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            primary_deliveries: AtomicU64::new(0),
            fallback_deliveries: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            builtin_loggers: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn primary_deliveries(&self) -> u64 {
        self.primary_deliveries.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn fallback_deliveries(&self) -> u64 {
        self.fallback_deliveries.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn builtin_loggers(&self) -> u64 {
        self.builtin_loggers.load(Ordering::Relaxed)
    }

    /// Record a primary delivery, returning the previous count
    #[inline]
    pub fn record_primary(&self) -> u64 {
        self.primary_deliveries.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_fallback(&self) -> u64 {
        self.fallback_deliveries.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_builtin(&self) -> u64 {
        self.builtin_loggers.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of deliveries that needed the fallback path (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been delivered.
    pub fn fallback_rate(&self) -> f64 {
        let fallback = self.fallback_deliveries() as f64;
        let total = self.primary_deliveries() as f64 + fallback;
        if total == 0.0 {
            0.0
        } else {
            (fallback / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.primary_deliveries.store(0, Ordering::Relaxed);
        self.fallback_deliveries.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.builtin_loggers.store(0, Ordering::Relaxed);
    }
}

impl Default for BridgeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for BridgeMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            primary_deliveries: AtomicU64::new(self.primary_deliveries()),
            fallback_deliveries: AtomicU64::new(self.fallback_deliveries()),
            filtered: AtomicU64::new(self.filtered()),
            builtin_loggers: AtomicU64::new(self.builtin_loggers()),
        }
    }
}
