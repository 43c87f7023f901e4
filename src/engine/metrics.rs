//! KEEPSAKE - Engine Metrics & Observability
//! Atomic counters for staged operations, commits and load health.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::container::LoadReport;

/// Atomic operation counters for the Keepsake engine.
///
/// All counters use `Ordering::Relaxed`; they are for observability only.
#[derive(Debug)]
pub struct EngineMetrics {
    /// Regions staged by `add_region`.
    pub regions_added: AtomicU64,
    /// Regions staged by `replace_region`.
    pub regions_replaced: AtomicU64,
    /// Deletions staged by `remove_region`.
    pub regions_removed: AtomicU64,
    /// Directory operations refused because of a failed precondition.
    pub rejected_ops: AtomicU64,
    /// Successful saves that rewrote the file.
    pub saves: AtomicU64,
    /// Successful restores.
    pub restores: AtomicU64,
    /// Zones read into regions across all loads.
    pub zones_loaded: AtomicU64,
    /// Zones skipped as unreadable across all loads.
    pub zones_skipped: AtomicU64,
    /// Entries discarded inside readable zones across all loads.
    pub entries_discarded: AtomicU64,
    engine_started: Instant,
}

impl EngineMetrics {
    /// Create a new metrics instance with all counters at zero.
    pub fn new() -> Self {
        Self {
            regions_added: AtomicU64::new(0),
            regions_replaced: AtomicU64::new(0),
            regions_removed: AtomicU64::new(0),
            rejected_ops: AtomicU64::new(0),
            saves: AtomicU64::new(0),
            restores: AtomicU64::new(0),
            zones_loaded: AtomicU64::new(0),
            zones_skipped: AtomicU64::new(0),
            entries_discarded: AtomicU64::new(0),
            engine_started: Instant::now(),
        }
    }

    pub fn record_add(&self) {
        self.regions_added.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_replace(&self) {
        self.regions_replaced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remove(&self) {
        self.regions_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected_ops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_restore(&self) {
        self.restores.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold the counts of one container load into the totals.
    pub fn record_load(&self, report: &LoadReport) {
        self.zones_loaded
            .fetch_add(report.zones_loaded as u64, Ordering::Relaxed);
        self.zones_skipped
            .fetch_add(report.zones_skipped as u64, Ordering::Relaxed);
        self.entries_discarded
            .fetch_add(report.entries_discarded as u64, Ordering::Relaxed);
    }

    /// Get engine uptime in seconds.
    pub fn uptime_secs(&self) -> f64 {
        self.engine_started.elapsed().as_secs_f64()
    }

    /// Total staged directory operations (adds + replaces + removes).
    pub fn staged_ops(&self) -> u64 {
        self.regions_added.load(Ordering::Relaxed)
            + self.regions_replaced.load(Ordering::Relaxed)
            + self.regions_removed.load(Ordering::Relaxed)
    }

    /// Format metrics as a human-readable report.
    pub fn report(&self) -> String {
        format!(
            "\n═══ KEEPSAKE Engine Metrics ═══\n\
             Staged:\n\
               added:     {}\n\
               replaced:  {}\n\
               removed:   {}\n\
               rejected:  {}\n\
             Commits:\n\
               saves:     {}\n\
               restores:  {}\n\
             Loads:\n\
               zones loaded:      {}\n\
               zones skipped:     {}\n\
               entries discarded: {}\n\
             Uptime: {:.2}s",
            self.regions_added.load(Ordering::Relaxed),
            self.regions_replaced.load(Ordering::Relaxed),
            self.regions_removed.load(Ordering::Relaxed),
            self.rejected_ops.load(Ordering::Relaxed),
            self.saves.load(Ordering::Relaxed),
            self.restores.load(Ordering::Relaxed),
            self.zones_loaded.load(Ordering::Relaxed),
            self.zones_skipped.load(Ordering::Relaxed),
            self.entries_discarded.load(Ordering::Relaxed),
            self.uptime_secs(),
        )
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_operations() {
        let m = EngineMetrics::new();

        m.record_add();
        m.record_add();
        m.record_replace();
        m.record_remove();
        m.record_rejected();
        m.record_save();

        assert_eq!(m.regions_added.load(Ordering::Relaxed), 2);
        assert_eq!(m.rejected_ops.load(Ordering::Relaxed), 1);
        assert_eq!(m.saves.load(Ordering::Relaxed), 1);
        assert_eq!(m.staged_ops(), 4);
    }

    #[test]
    fn test_record_load() {
        let m = EngineMetrics::new();
        let report = LoadReport {
            declared_version: "1.0.0".into(),
            zones_loaded: 3,
            zones_skipped: 1,
            entries_discarded: 2,
        };
        m.record_load(&report);
        m.record_load(&report);
        assert_eq!(m.zones_loaded.load(Ordering::Relaxed), 6);
        assert_eq!(m.zones_skipped.load(Ordering::Relaxed), 2);
        assert_eq!(m.entries_discarded.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn test_report_format() {
        let m = EngineMetrics::default();
        let report = m.report();
        assert!(report.contains("saves:"));
        assert!(report.contains("zones skipped:"));
    }
}
