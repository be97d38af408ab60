//! Per-session counters for loads, writes and preview rebuilds.
//!
//! Each session owns its own counters; nothing is shared between sessions.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for one translation session.
#[derive(Debug, Default)]
pub struct SessionMetrics {
    /// Translation loads that were applied to the session
    translation_loads: AtomicUsize,

    /// Loads whose result was discarded because the locale changed meanwhile
    stale_loads_discarded: AtomicUsize,

    /// Locale or translation loads that failed
    load_failures: AtomicUsize,

    /// Field writes sent to the content store
    field_writes: AtomicUsize,

    /// Field writes that failed
    write_failures: AtomicUsize,

    /// Writes skipped because a newer edit of the same row was already issued
    superseded_writes: AtomicUsize,

    /// Preview rebuilds executed, immediate and debounced
    preview_rebuilds: AtomicUsize,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_translation_load(&self) {
        self.translation_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_load(&self) {
        self.stale_loads_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_field_write(&self) {
        self.field_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_superseded_write(&self) {
        self.superseded_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_preview_rebuild(&self) {
        self.preview_rebuilds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn preview_rebuilds(&self) -> usize {
        self.preview_rebuilds.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let writes = self.field_writes.load(Ordering::Relaxed);
        let failures = self.write_failures.load(Ordering::Relaxed);
        let write_success_rate = if writes > 0 {
            ((writes - failures) as f64 / writes as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            translation_loads: self.translation_loads.load(Ordering::Relaxed),
            stale_loads_discarded: self.stale_loads_discarded.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            field_writes: writes,
            write_failures: failures,
            write_success_rate,
            superseded_writes: self.superseded_writes.load(Ordering::Relaxed),
            preview_rebuilds: self.preview_rebuilds(),
        }
    }
}

/// Snapshot of a session's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub translation_loads: usize,
    pub stale_loads_discarded: usize,
    pub load_failures: usize,
    pub field_writes: usize,
    pub write_failures: usize,
    /// Write success rate as a percentage (0-100)
    pub write_success_rate: f64,
    pub superseded_writes: usize,
    pub preview_rebuilds: usize,
}
