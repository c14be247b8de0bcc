//! Logger metrics for observability
//!
//! Counters describing what happened to emissions after they passed the
//! level gate: delivered, dropped, or failed in a transport.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// Shared by a logger and all of its children.
///
/// # Example
///
/// ```
/// use rust_log_layer::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_emitted();
/// metrics.record_lazy_failure();
///
/// assert_eq!(metrics.emitted(), 1);
/// assert_eq!(metrics.dropped_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Emissions that reached the dispatcher
    emitted: AtomicU64,

    /// Emissions dropped because a lazy value failed to resolve
    lazy_failures: AtomicU64,

    /// Emissions with no eligible transport after routing
    unrouted: AtomicU64,

    /// Individual transport deliveries that completed
    deliveries: AtomicU64,

    /// Individual transport deliveries that failed or panicked
    transport_failures: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            emitted: AtomicU64::new(0),
            lazy_failures: AtomicU64::new(0),
            unrouted: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            transport_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn lazy_failures(&self) -> u64 {
        self.lazy_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn unrouted(&self) -> u64 {
        self.unrouted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn deliveries(&self) -> u64 {
        self.deliveries.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn transport_failures(&self) -> u64 {
        self.transport_failures.load(Ordering::Relaxed)
    }

    /// Emissions that never reached any transport
    pub fn dropped_count(&self) -> u64 {
        self.lazy_failures() + self.unrouted()
    }

    #[inline]
    pub fn record_emitted(&self) -> u64 {
        self.emitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_lazy_failure(&self) -> u64 {
        self.lazy_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_unrouted(&self) -> u64 {
        self.unrouted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivery(&self) -> u64 {
        self.deliveries.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_transport_failure(&self) -> u64 {
        self.transport_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed deliveries as a percentage (0.0 - 100.0) of attempted ones
    ///
    /// Returns 0.0 if nothing was delivered yet.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.transport_failures() as f64;
        let total = self.deliveries() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.emitted.store(0, Ordering::Relaxed);
        self.lazy_failures.store(0, Ordering::Relaxed);
        self.unrouted.store(0, Ordering::Relaxed);
        self.deliveries.store(0, Ordering::Relaxed);
        self.transport_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            emitted: AtomicU64::new(self.emitted()),
            lazy_failures: AtomicU64::new(self.lazy_failures()),
            unrouted: AtomicU64::new(self.unrouted()),
            deliveries: AtomicU64::new(self.deliveries()),
            transport_failures: AtomicU64::new(self.transport_failures()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.emitted(), 0);
        assert_eq!(metrics.dropped_count(), 0);
        assert_eq!(metrics.deliveries(), 0);
        assert_eq!(metrics.transport_failures(), 0);
    }

    #[test]
    fn test_record_returns_previous() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.record_emitted(), 0);
        assert_eq!(metrics.record_emitted(), 1);
        assert_eq!(metrics.emitted(), 2);
    }

    #[test]
    fn test_dropped_count_sums_causes() {
        let metrics = LoggerMetrics::new();
        metrics.record_lazy_failure();
        metrics.record_unrouted();
        metrics.record_unrouted();
        assert_eq!(metrics.dropped_count(), 3);
    }

    #[test]
    fn test_failure_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.failure_rate(), 0.0);

        for _ in 0..90 {
            metrics.record_delivery();
        }
        for _ in 0..10 {
            metrics.record_transport_failure();
        }
        let rate = metrics.failure_rate();
        assert!((9.9..=10.1).contains(&rate), "Failure rate was {}", rate);
    }

    #[test]
    fn test_metrics_reset_and_clone() {
        let metrics = LoggerMetrics::new();
        metrics.record_delivery();
        let snapshot = metrics.clone();

        metrics.reset();
        assert_eq!(metrics.deliveries(), 0);
        assert_eq!(snapshot.deliveries(), 1);
    }
}
