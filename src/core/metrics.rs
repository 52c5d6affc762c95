//! Logger metrics for observability
//!
//! Counters for records accepted, written, dropped, and for writer failures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters describing logger health.
///
/// `Clone` takes a snapshot.
///
/// # Example
///
/// ```
/// use fanlog::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_enqueued();
/// metrics.record_dropped();
///
/// assert_eq!(metrics.enqueued(), 1);
/// assert_eq!(metrics.dropped_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records accepted into the queue
    enqueued: AtomicU64,

    /// Records taken off the queue and fanned out
    dispatched: AtomicU64,

    /// Records rejected because the logger was stopping or the queue was full
    dropped_count: AtomicU64,

    /// Times a producer found the queue full
    queue_full_events: AtomicU64,

    /// Writer calls that returned an error
    write_failures: AtomicU64,

    /// Writer calls that panicked
    writer_panics: AtomicU64,

    /// Filter predicates that panicked; each counts as a miss
    filter_panics: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            writer_panics: AtomicU64::new(0),
            filter_panics: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn writer_panics(&self) -> u64 {
        self.writer_panics.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filter_panics(&self) -> u64 {
        self.filter_panics.load(Ordering::Relaxed)
    }

    /// Returns the previous value, like the other `record_*` methods.
    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_writer_panic(&self) -> u64 {
        self.writer_panics.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filter_panic(&self) -> u64 {
        self.filter_panics.fetch_add(1, Ordering::Relaxed)
    }

    /// Percentage (0.0 - 100.0) of submitted records that were dropped.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.enqueued() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued()),
            dispatched: AtomicU64::new(self.dispatched()),
            dropped_count: AtomicU64::new(self.dropped_count()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            write_failures: AtomicU64::new(self.write_failures()),
            writer_panics: AtomicU64::new(self.writer_panics()),
            filter_panics: AtomicU64::new(self.filter_panics()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.enqueued(), 0);
        assert_eq!(metrics.dispatched(), 0);
        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.write_failures(), 0);
        assert_eq!(metrics.writer_panics(), 0);
        assert_eq!(metrics.filter_panics(), 0);
    }

    #[test]
    fn test_record_returns_previous_value() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_dropped(), 0);
        assert_eq!(metrics.record_dropped(), 1);
        assert_eq!(metrics.dropped_count(), 2);
    }

    #[test]
    fn test_drop_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.drop_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_enqueued();
        }
        for _ in 0..10 {
            metrics.record_dropped();
        }
        let rate = metrics.drop_rate();
        assert!((9.9..=10.1).contains(&rate), "Drop rate was {}", rate);
    }

    #[test]
    fn test_clone_is_snapshot() {
        let metrics = LoggerMetrics::new();
        metrics.record_dispatched();
        let snapshot = metrics.clone();
        metrics.record_dispatched();
        assert_eq!(snapshot.dispatched(), 1);
        assert_eq!(metrics.dispatched(), 2);
    }
}
