//! Bounded waiting for UI state.
//!
//! A [`Condition`] is a named, side-effect free predicate over UI state.
//! [`Pause`] evaluates it on the UI thread (through the [`UiExecutor`]) until it
//! holds or the timeout elapses. An already satisfied condition returns without
//! sleeping, whatever the timeout. A condition that never holds fails with
//! [`RobotError::WaitTimedOut`] no earlier than the timeout and no later than
//! one poll interval after it.

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{PreconditionFailure, Result, RobotError};
use crate::metrics::Metrics;
use crate::ui::executor::UiExecutor;

/// How long a wait may last
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timeout(Duration);

impl Timeout {
    pub const fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub const fn millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    pub const fn secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub const fn duration(self) -> Duration {
        self.0
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0.as_millis())
    }
}

type Predicate = Arc<dyn Fn() -> Result<bool> + Send + Sync>;

/// A described predicate, evaluated on the UI thread
///
/// The predicate may run many times and must not change UI state.
#[derive(Clone)]
pub struct Condition {
    description: String,
    predicate: Predicate,
}

impl Condition {
    pub fn new<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn() -> Result<bool> + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Holds once `read()` returns `target`
    ///
    /// A `target` outside `bounds` can never be reached and is rejected with
    /// [`PreconditionFailure::ValueOutOfBounds`] before any waiting happens.
    pub fn value_reached<T, F>(
        description: impl Into<String>,
        read: F,
        target: T,
        bounds: RangeInclusive<T>,
    ) -> Result<Self>
    where
        T: PartialOrd + fmt::Display + Send + Sync + 'static,
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        if !bounds.contains(&target) {
            return Err(PreconditionFailure::ValueOutOfBounds {
                value: target.to_string(),
                min: bounds.start().to_string(),
                max: bounds.end().to_string(),
            }
            .into());
        }
        let description = format!("{} to reach {}", description.into(), target);
        Ok(Self::new(description, move || Ok(read()? == target)))
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Evaluate once on the current thread
    pub fn test(&self) -> Result<bool> {
        (self.predicate)()
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Evaluate `check` until it returns `true` or `timeout` elapses
///
/// The first evaluation happens immediately; between evaluations the caller
/// sleeps `interval`, shortened so the final evaluation lands on the deadline.
/// Returns `Ok(false)` on timeout. Errors from `check` end the wait at once.
pub(crate) fn poll_until<F>(timeout: Duration, interval: Duration, mut check: F) -> Result<bool>
where
    F: FnMut() -> Result<bool>,
{
    let start = Instant::now();
    loop {
        if check()? {
            return Ok(true);
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Ok(false);
        }
        thread::sleep(interval.min(timeout - elapsed));
    }
}

/// Polling waits bound to one UI thread
#[derive(Clone)]
pub struct Pause {
    executor: UiExecutor,
    poll_interval: Duration,
    default_timeout: Timeout,
    metrics: Arc<Metrics>,
}

impl Pause {
    pub fn new(
        executor: UiExecutor,
        poll_interval: Duration,
        default_timeout: Timeout,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            executor,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            default_timeout,
            metrics,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn default_timeout(&self) -> Timeout {
        self.default_timeout
    }

    /// Block until `condition` holds, or fail with a timeout naming it
    pub fn await_until(&self, condition: &Condition, timeout: impl Into<Timeout>) -> Result<()> {
        let timeout = timeout.into();
        let start = Instant::now();
        let reached = poll_until(timeout.duration(), self.poll_interval, || {
            self.evaluate(condition)
        })?;
        if reached {
            tracing::debug!(
                "Condition '{}' met after {:?}",
                condition.description(),
                start.elapsed()
            );
            return Ok(());
        }
        self.timed_out(condition.description(), timeout)
    }

    /// [`await_until`](Self::await_until) with the configured default timeout
    pub fn await_condition(&self, condition: &Condition) -> Result<()> {
        self.await_until(condition, self.default_timeout)
    }

    /// Block until every condition holds within one polling round
    pub fn await_all(&self, conditions: &[Condition], timeout: impl Into<Timeout>) -> Result<()> {
        let timeout = timeout.into();
        if conditions.is_empty() {
            return Ok(());
        }
        let reached = poll_until(timeout.duration(), self.poll_interval, || {
            for condition in conditions {
                if !self.evaluate(condition)? {
                    return Ok(false);
                }
            }
            Ok(true)
        })?;
        if reached {
            return Ok(());
        }
        let descriptions: Vec<&str> = conditions.iter().map(Condition::description).collect();
        self.timed_out(&descriptions.join(" and "), timeout)
    }

    /// Async form of [`await_until`](Self::await_until) for tokio callers
    ///
    /// Sleeping happens on the tokio timer; each evaluation blocks a
    /// `spawn_blocking` thread while the UI thread answers.
    pub async fn await_until_async(
        &self,
        condition: &Condition,
        timeout: impl Into<Timeout>,
    ) -> Result<()> {
        let timeout = timeout.into();
        let start = Instant::now();
        loop {
            let pause = self.clone();
            let check = condition.clone();
            let reached = match tokio::task::spawn_blocking(move || pause.evaluate(&check)).await {
                Ok(result) => result?,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => return Err(RobotError::EventLoopStopped),
            };
            if reached {
                return Ok(());
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout.duration() {
                return self.timed_out(condition.description(), timeout);
            }
            tokio::time::sleep(self.poll_interval.min(timeout.duration() - elapsed)).await;
        }
    }

    fn evaluate(&self, condition: &Condition) -> Result<bool> {
        self.metrics.record_condition_poll();
        let polled = condition.clone();
        self.executor.query(move || polled.test())
    }

    fn timed_out(&self, description: &str, timeout: Timeout) -> Result<()> {
        self.metrics.record_wait_timeout();
        tracing::warn!("Timed out after {} waiting for {}", timeout, description);
        Err(RobotError::wait_timed_out(description, timeout.duration()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RobotSettings;
    use crate::ui::bridge::Dispatcher;
    use crate::ui::headless::HeadlessToolkit;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pause() -> (Arc<HeadlessToolkit>, Pause) {
        let toolkit = HeadlessToolkit::start(&RobotSettings::default()).unwrap();
        let metrics = Arc::new(Metrics::new());
        let executor = UiExecutor::new(toolkit.clone(), metrics.clone());
        let pause = Pause::new(executor, Duration::from_millis(10), Timeout::secs(1), metrics);
        (toolkit, pause)
    }

    #[test]
    fn test_satisfied_condition_returns_with_zero_timeout() {
        let (_toolkit, pause) = pause();
        let condition = Condition::new("always", || Ok(true));

        let start = Instant::now();
        pause.await_until(&condition, Timeout::millis(0)).unwrap();

        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_timeout_carries_description() {
        let (_toolkit, pause) = pause();
        let condition = Condition::new("the dialog to close", || Ok(false));

        let err = pause.await_until(&condition, Timeout::millis(30)).unwrap_err();

        assert!(err.is_timeout());
        assert!(err.to_string().contains("the dialog to close"));
    }

    #[test]
    fn test_predicate_error_ends_wait() {
        let (_toolkit, pause) = pause();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let condition = Condition::new("failing", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(RobotError::WidgetUnavailable(9))
        });

        let err = pause.await_until(&condition, Timeout::secs(5)).unwrap_err();

        assert!(matches!(err, RobotError::WidgetUnavailable(9)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_predicate_runs_on_ui_thread() {
        let (toolkit, pause) = pause();
        let on_ui = toolkit.clone();
        let condition = Condition::new("on ui thread", move || Ok(on_ui.is_dispatch_thread()));

        pause.await_until(&condition, Timeout::millis(100)).unwrap();
    }

    #[test]
    fn test_value_reached_rejects_unreachable_target() {
        let err = Condition::value_reached("slider", || Ok(0), 150, 0..=100).unwrap_err();

        assert!(matches!(
            err,
            RobotError::Precondition(PreconditionFailure::ValueOutOfBounds { .. })
        ));
        assert_eq!(err.to_string(), "Precondition failed: Value 150 should be between 0 and 100");
    }

    #[test]
    fn test_await_all_needs_every_condition() {
        let (_toolkit, pause) = pause();
        let ready = Condition::new("ready", || Ok(true));
        let never = Condition::new("never", || Ok(false));

        pause.await_all(&[ready.clone()], Timeout::millis(20)).unwrap();
        let err = pause.await_all(&[ready, never], Timeout::millis(20)).unwrap_err();

        assert!(err.to_string().contains("ready and never"));
    }

    #[test]
    fn test_poll_until_counts_evaluations() {
        let mut calls = 0;
        let reached = poll_until(Duration::from_millis(200), Duration::from_millis(1), || {
            calls += 1;
            Ok(calls == 3)
        })
        .unwrap();

        assert!(reached);
        assert_eq!(calls, 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_async_wait_observes_change() {
        let (_toolkit, pause) = pause();
        let flag = Arc::new(AtomicUsize::new(0));
        let reader = flag.clone();
        let condition = Condition::new("flag set", move || Ok(reader.load(Ordering::SeqCst) == 1));

        let setter = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            flag.store(1, Ordering::SeqCst);
        });

        pause
            .await_until_async(&condition, Timeout::secs(2))
            .await
            .unwrap();
        setter.await.unwrap();
    }

    #[test]
    fn test_async_wait_times_out_on_current_thread_runtime() {
        let (_toolkit, pause) = pause();
        let condition = Condition::new("never", || Ok(false));

        let result = tokio_test::block_on(pause.await_until_async(&condition, Timeout::millis(30)));

        tokio_test::assert_err!(&result);
        assert!(result.unwrap_err().is_timeout());
    }
}
