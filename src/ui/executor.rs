// UiExecutor - runs closures on the UI thread and hands the outcome back
//
// The caller blocks until the UI thread has run the closure. Values and
// returned errors travel back unchanged; a panic on the UI thread is caught
// there and resumed on the caller with its original payload.

use crossbeam::channel::{self, RecvTimeoutError};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::{Result, RobotError};
use crate::metrics::Metrics;
use crate::ui::bridge::Dispatcher;

/// Whether an action only reads UI state or also mutates it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Query,
    Task,
}

/// A closure destined for the UI thread
pub trait GuiAction: Send + 'static {
    type Output: Send + 'static;

    fn kind(&self) -> ActionKind;

    fn execute(self) -> Result<Self::Output>;
}

/// Reads a value from UI state; must not have side effects visible before it returns
pub struct Query<T> {
    body: Box<dyn FnOnce() -> Result<T> + Send>,
}

impl<T: Send + 'static> Query<T> {
    pub fn new<F>(body: F) -> Self
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        Self {
            body: Box::new(body),
        }
    }
}

impl<T: Send + 'static> GuiAction for Query<T> {
    type Output = T;

    fn kind(&self) -> ActionKind {
        ActionKind::Query
    }

    fn execute(self) -> Result<T> {
        (self.body)()
    }
}

/// Mutates UI state and produces nothing
pub struct Task {
    body: Box<dyn FnOnce() -> Result<()> + Send>,
}

impl Task {
    pub fn new<F>(body: F) -> Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        Self {
            body: Box::new(body),
        }
    }
}

impl GuiAction for Task {
    type Output = ();

    fn kind(&self) -> ActionKind {
        ActionKind::Task
    }

    fn execute(self) -> Result<()> {
        (self.body)()
    }
}

/// What the UI thread produced for one action; consumed once by the caller
pub enum ExecutionOutcome<T> {
    Value(T),
    Failed(RobotError),
    Panicked {
        payload: Box<dyn Any + Send>,
        thread: Option<String>,
    },
}

impl<T> ExecutionOutcome<T> {
    /// Run `body` on the current thread, capturing errors and panics
    pub fn capture(body: impl FnOnce() -> Result<T>) -> Self {
        match panic::catch_unwind(AssertUnwindSafe(body)) {
            Ok(Ok(value)) => ExecutionOutcome::Value(value),
            Ok(Err(err)) => ExecutionOutcome::Failed(err),
            Err(payload) => ExecutionOutcome::Panicked {
                payload,
                thread: thread::current().name().map(str::to_string),
            },
        }
    }

    /// Hand the outcome to the caller, resuming a captured panic on this thread
    pub fn into_result(self) -> Result<T> {
        match self {
            ExecutionOutcome::Value(value) => Ok(value),
            ExecutionOutcome::Failed(err) => Err(err),
            ExecutionOutcome::Panicked { payload, .. } => panic::resume_unwind(payload),
        }
    }
}

/// Marshals closures onto the UI thread of a [`Dispatcher`]
///
/// Cheap to clone; clones share the dispatcher and metrics.
///
/// # Example
/// ```ignore
/// let executor = UiExecutor::new(toolkit.clone(), metrics);
/// let count = executor.query(move || list.with(|l| l.element_count()))?;
/// executor.task(move || list.with_mut(|l| l.clear_selection()))?;
/// ```
#[derive(Clone)]
pub struct UiExecutor {
    dispatcher: Arc<dyn Dispatcher>,
    response_timeout: Option<Duration>,
    metrics: Arc<Metrics>,
}

impl UiExecutor {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, metrics: Arc<Metrics>) -> Self {
        Self {
            dispatcher,
            response_timeout: Some(Duration::from_secs(30)),
            metrics,
        }
    }

    /// Bound how long a caller waits for the UI thread; `None` waits forever
    pub fn with_response_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout
    }

    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    pub fn is_dispatch_thread(&self) -> bool {
        self.dispatcher.is_dispatch_thread()
    }

    /// Run a read-only closure on the UI thread and return its value
    pub fn query<T, F>(&self, body: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        self.run(Query::new(body))
    }

    /// Run a side-effecting closure on the UI thread
    pub fn task<F>(&self, body: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.run(Task::new(body))
    }

    /// Run `action` on the UI thread and block until it has completed
    ///
    /// On the UI thread itself the action runs inline. Elsewhere it is queued
    /// and the caller waits for the outcome, bounded by the response timeout.
    /// A timeout only releases the caller: an action that already started
    /// still runs to completion and its outcome is discarded.
    pub fn run<A: GuiAction>(&self, action: A) -> Result<A::Output> {
        match action.kind() {
            ActionKind::Query => self.metrics.record_query(),
            ActionKind::Task => self.metrics.record_task(),
        }

        if self.dispatcher.is_dispatch_thread() {
            self.metrics.record_inline_execution();
            return action.execute();
        }

        let (outcome_tx, outcome_rx) = channel::bounded::<ExecutionOutcome<A::Output>>(1);
        self.dispatcher.invoke_later(Box::new(move || {
            let outcome = ExecutionOutcome::capture(|| action.execute());
            // Nobody is listening if the caller already timed out
            let _ = outcome_tx.send(outcome);
        }))?;

        let outcome = match self.response_timeout {
            Some(limit) => outcome_rx.recv_timeout(limit).map_err(|e| match e {
                RecvTimeoutError::Timeout => {
                    tracing::warn!("UI thread did not complete action within {:?}", limit);
                    RobotError::UiThreadUnresponsive { waited: limit }
                }
                RecvTimeoutError::Disconnected => RobotError::EventLoopStopped,
            })?,
            None => outcome_rx
                .recv()
                .map_err(|_| RobotError::EventLoopStopped)?,
        };

        if let ExecutionOutcome::Panicked { thread, .. } = &outcome {
            self.metrics.record_captured_panic();
            tracing::error!(
                "UI action panicked on thread {}; resuming on caller",
                thread.as_deref().unwrap_or("<unnamed>")
            );
        }

        outcome.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreconditionFailure;
    use crate::models::RobotSettings;
    use crate::ui::bridge::UiJob;
    use crate::ui::headless::HeadlessToolkit;
    use std::sync::Mutex;
    use std::sync::atomic::Ordering;

    fn executor() -> (Arc<HeadlessToolkit>, UiExecutor) {
        let toolkit = HeadlessToolkit::start(&RobotSettings::default()).unwrap();
        let executor = UiExecutor::new(toolkit.clone(), Arc::new(Metrics::new()));
        (toolkit, executor)
    }

    /// Accepts jobs and never runs them
    struct StalledDispatcher {
        parked: Mutex<Vec<UiJob>>,
    }

    impl Dispatcher for StalledDispatcher {
        fn is_dispatch_thread(&self) -> bool {
            false
        }

        fn invoke_later(&self, job: UiJob) -> Result<()> {
            self.parked.lock().unwrap().push(job);
            Ok(())
        }

        fn pending_events(&self) -> usize {
            self.parked.lock().unwrap().len()
        }
    }

    /// Drops every job without running it
    struct DroppingDispatcher;

    impl Dispatcher for DroppingDispatcher {
        fn is_dispatch_thread(&self) -> bool {
            false
        }

        fn invoke_later(&self, job: UiJob) -> Result<()> {
            drop(job);
            Ok(())
        }

        fn pending_events(&self) -> usize {
            0
        }
    }

    #[test]
    fn test_query_runs_on_ui_thread() {
        let (toolkit, executor) = executor();
        let toolkit_ref = toolkit.clone();

        let on_ui = executor
            .query(move || Ok(toolkit_ref.is_dispatch_thread()))
            .unwrap();

        assert!(on_ui);
        assert!(!toolkit.is_dispatch_thread());
    }

    #[test]
    fn test_error_is_returned_unchanged() {
        let (_toolkit, executor) = executor();

        let err = executor
            .task(|| Err(PreconditionFailure::NotEnabled("button".into()).into()))
            .unwrap_err();

        assert!(matches!(
            err,
            RobotError::Precondition(PreconditionFailure::NotEnabled(ref w)) if w == "button"
        ));
    }

    #[test]
    fn test_panic_payload_is_resumed_on_caller() {
        let (_toolkit, executor) = executor();

        let caught = panic::catch_unwind(AssertUnwindSafe(|| {
            executor.task(|| panic!("widget exploded")).ok();
        }))
        .unwrap_err();

        assert_eq!(caught.downcast_ref::<&str>(), Some(&"widget exploded"));
        assert_eq!(executor.metrics.captured_panics.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_ui_thread_survives_a_panicking_action() {
        let (_toolkit, executor) = executor();
        let _ = panic::catch_unwind(AssertUnwindSafe(|| executor.task(|| panic!("boom"))));

        assert_eq!(executor.query(|| Ok(41 + 1)).unwrap(), 42);
    }

    #[test]
    fn test_inline_execution_from_ui_thread_does_not_deadlock() {
        let (_toolkit, executor) = executor();
        let nested = executor.clone();

        let value = executor
            .query(move || nested.query(|| Ok("inner")))
            .unwrap();

        assert_eq!(value, "inner");
        assert_eq!(executor.metrics.inline_executions.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_unresponsive_ui_thread_is_a_timeout() {
        let dispatcher = Arc::new(StalledDispatcher {
            parked: Mutex::new(Vec::new()),
        });
        let executor = UiExecutor::new(dispatcher, Arc::new(Metrics::new()))
            .with_response_timeout(Some(Duration::from_millis(50)));

        let err = executor.query(|| Ok(1)).unwrap_err();

        assert!(matches!(err, RobotError::UiThreadUnresponsive { .. }));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_dropped_job_reports_stopped_event_loop() {
        let executor = UiExecutor::new(Arc::new(DroppingDispatcher), Arc::new(Metrics::new()));

        let err = executor.task(|| Ok(())).unwrap_err();

        assert!(matches!(err, RobotError::EventLoopStopped));
    }

    #[test]
    fn test_submission_order_is_preserved_for_one_caller() {
        let (_toolkit, executor) = executor();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..20 {
            let log = log.clone();
            executor
                .task(move || {
                    log.lock().unwrap().push(i);
                    Ok(())
                })
                .unwrap();
        }

        assert_eq!(*log.lock().unwrap(), (0..20).collect::<Vec<_>>());
    }
}
