// Session metrics module
//
// Lightweight counters for the long-lived session workers

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Session-wide worker counters
///
/// Uses atomic operations so the hotkey, visibility and relay workers can
/// record without locks. Logged once on shutdown.
#[derive(Debug)]
pub struct SessionMetrics {
    pub hotkey_presses: AtomicU64,
    pub hides_emitted: AtomicU64,
    pub searches_launched: AtomicU64,
    pub batches_relayed: AtomicU64,

    /// Batches discarded because a newer search had started
    pub stale_batches_dropped: AtomicU64,

    start_time: Instant,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            hotkey_presses: AtomicU64::new(0),
            hides_emitted: AtomicU64::new(0),
            searches_launched: AtomicU64::new(0),
            batches_relayed: AtomicU64::new(0),
            stale_batches_dropped: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_hotkey_press(&self) {
        self.hotkey_presses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hide(&self) {
        self.hides_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_search_launched(&self) {
        self.searches_launched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_relayed(&self) {
        self.batches_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_batch(&self) {
        self.stale_batches_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Window: {} hotkey presses, {} hides",
            self.hotkey_presses.load(Ordering::Relaxed),
            self.hides_emitted.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Search: {} launched, {} batches relayed, {} stale batches dropped",
            self.searches_launched.load(Ordering::Relaxed),
            self.batches_relayed.load(Ordering::Relaxed),
            self.stale_batches_dropped.load(Ordering::Relaxed)
        );
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = SessionMetrics::new();
        assert_eq!(metrics.hotkey_presses.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.batches_relayed.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_counters() {
        let metrics = SessionMetrics::new();

        metrics.record_hotkey_press();
        metrics.record_hide();
        metrics.record_hide();
        metrics.record_search_launched();
        metrics.record_batch_relayed();
        metrics.record_stale_batch();

        assert_eq!(metrics.hotkey_presses.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.hides_emitted.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.searches_launched.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.batches_relayed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.stale_batches_dropped.load(Ordering::Relaxed), 1);
    }
}
