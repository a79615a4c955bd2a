// Robot activity metrics
//
// Lightweight counters describing how the primitives were exercised during a run

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Robot activity counters
///
/// Uses atomic operations so caller threads and the UI thread can record
/// without locks. A single instance is shared (`Arc`) by every primitive of a
/// [`Robot`](crate::ui::Robot) and can be logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Queries marshalled onto the UI thread
    pub queries: AtomicU64,

    /// Tasks marshalled onto the UI thread
    pub tasks: AtomicU64,

    /// Actions run inline because the caller already was the UI thread
    pub inline_executions: AtomicU64,

    /// Panics captured on the UI thread and resumed on the caller
    pub captured_panics: AtomicU64,

    /// Idle barriers that had to wait for a backlog
    pub idle_waits: AtomicU64,

    /// Total time spent blocked in idle barriers, in microseconds
    pub idle_wait_us: AtomicU64,

    /// Condition evaluations performed by polling waits
    pub condition_polls: AtomicU64,

    /// Waits that ended in a timeout
    pub wait_timeouts: AtomicU64,

    /// Element lookups performed by the locator
    pub lookups: AtomicU64,

    /// Element lookups that matched nothing
    pub lookup_misses: AtomicU64,

    /// Scroll requests issued to bring an element into view
    pub scrolls: AtomicU64,

    /// Primitive gesture steps executed
    pub gesture_steps: AtomicU64,

    /// Gestures that ran to completion
    pub gestures_completed: AtomicU64,

    /// Gestures that were aborted
    pub gestures_aborted: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            queries: AtomicU64::new(0),
            tasks: AtomicU64::new(0),
            inline_executions: AtomicU64::new(0),
            captured_panics: AtomicU64::new(0),
            idle_waits: AtomicU64::new(0),
            idle_wait_us: AtomicU64::new(0),
            condition_polls: AtomicU64::new(0),
            wait_timeouts: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
            lookup_misses: AtomicU64::new(0),
            scrolls: AtomicU64::new(0),
            gesture_steps: AtomicU64::new(0),
            gestures_completed: AtomicU64::new(0),
            gestures_aborted: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task(&self) {
        self.tasks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inline_execution(&self) {
        self.inline_executions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_captured_panic(&self) {
        self.captured_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_idle_wait(&self, waited: Duration) {
        self.idle_waits.fetch_add(1, Ordering::Relaxed);
        self.idle_wait_us
            .fetch_add(waited.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_condition_poll(&self) {
        self.condition_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_wait_timeout(&self) {
        self.wait_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup(&self, found: bool) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if !found {
            self.lookup_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_scroll(&self) {
        self.scrolls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gesture_step(&self) {
        self.gesture_steps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gesture_completed(&self) {
        self.gestures_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gesture_aborted(&self) {
        self.gestures_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average time spent in an idle barrier that had to wait, in milliseconds
    pub fn avg_idle_wait_ms(&self) -> f64 {
        let total = self.idle_wait_us.load(Ordering::Relaxed);
        let count = self.idle_waits.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64 / 1000.0
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Robot Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "UI thread: {} queries, {} tasks, {} inline, {} panics",
            self.queries.load(Ordering::Relaxed),
            self.tasks.load(Ordering::Relaxed),
            self.inline_executions.load(Ordering::Relaxed),
            self.captured_panics.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Idle waits: {} (avg {:.2}ms), condition polls: {}, timeouts: {}",
            self.idle_waits.load(Ordering::Relaxed),
            self.avg_idle_wait_ms(),
            self.condition_polls.load(Ordering::Relaxed),
            self.wait_timeouts.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Lookups: {} ({} misses), scrolls: {}",
            self.lookups.load(Ordering::Relaxed),
            self.lookup_misses.load(Ordering::Relaxed),
            self.scrolls.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Gestures: {} completed, {} aborted, {} steps",
            self.gestures_completed.load(Ordering::Relaxed),
            self.gestures_aborted.load(Ordering::Relaxed),
            self.gesture_steps.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.queries.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.gesture_steps.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_lookups() {
        let metrics = Metrics::new();

        metrics.record_lookup(true);
        metrics.record_lookup(false);
        metrics.record_lookup(true);

        assert_eq!(metrics.lookups.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.lookup_misses.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_avg_idle_wait() {
        let metrics = Metrics::new();
        assert_eq!(metrics.avg_idle_wait_ms(), 0.0);

        metrics.record_idle_wait(Duration::from_millis(2));
        metrics.record_idle_wait(Duration::from_millis(4));

        assert_eq!(metrics.idle_waits.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.avg_idle_wait_ms(), 3.0);
    }

    #[test]
    fn test_counters_from_many_threads() {
        let metrics = std::sync::Arc::new(Metrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = metrics.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        metrics.record_query();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.queries.load(Ordering::Relaxed), 400);
    }
}
