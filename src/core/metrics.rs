//! Logger metrics for observability
//!
//! Counters shared between a logger and its async pipeline: delivered
//! lines, lines a sink failed on, pushes the pipeline refused, producers that
//! had to wait for the drain thread, and buffer swaps.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use dualbuf_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_dropped();
/// metrics.record_logged();
///
/// assert_eq!(metrics.dropped_count(), 1);
/// assert_eq!(metrics.total_logged(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Lines where at least one sink failed
    dropped_count: AtomicU64,

    /// Lines delivered to every sink
    total_logged: AtomicU64,

    /// Pushes refused by the pipeline (capacity exceeded or closed)
    rejected_count: AtomicU64,

    /// Pushes that waited for the drain thread to free space
    block_events: AtomicU64,

    /// Producer/consumer buffer exchanges performed by the drain thread
    swap_count: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            dropped_count: AtomicU64::new(0),
            total_logged: AtomicU64::new(0),
            rejected_count: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
            swap_count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.block_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn swap_count(&self) -> u64 {
        self.swap_count.load(Ordering::Relaxed)
    }

    /// Record a line a sink failed on; returns the previous count
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.rejected_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.block_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_swap(&self) -> u64 {
        self.swap_count.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of lost lines (sink failures and rejected pushes) as a
    /// percentage (0.0 - 100.0). Returns 0.0 if nothing was processed.
    pub fn drop_rate(&self) -> f64 {
        let lost = (self.dropped_count() + self.rejected_count()) as f64;
        let total = self.total_logged() as f64 + lost;
        if total == 0.0 {
            0.0
        } else {
            (lost / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.dropped_count.store(0, Ordering::Relaxed);
        self.total_logged.store(0, Ordering::Relaxed);
        self.rejected_count.store(0, Ordering::Relaxed);
        self.block_events.store(0, Ordering::Relaxed);
        self.swap_count.store(0, Ordering::Relaxed);
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
            dropped_count: AtomicU64::new(self.dropped_count()),
            total_logged: AtomicU64::new(self.total_logged()),
            rejected_count: AtomicU64::new(self.rejected_count()),
            block_events: AtomicU64::new(self.block_events()),
            swap_count: AtomicU64::new(self.swap_count()),
        }
    }
}
