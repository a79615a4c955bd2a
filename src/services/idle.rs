// IdleBarrier - synchronisation point between injected input and state reads
//
// Input is posted onto the UI thread asynchronously. Before reading widget
// state the caller waits until every event queued at the time of the call has
// been processed. Events queued afterwards are not waited for.

use crossbeam::channel::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{PreconditionFailure, Result, RobotError};
use crate::metrics::Metrics;
use crate::ui::bridge::Dispatcher;

/// Waits for the UI thread's event backlog to drain
#[derive(Clone)]
pub struct IdleBarrier {
    dispatcher: Arc<dyn Dispatcher>,
    idle_timeout: Duration,
    metrics: Arc<Metrics>,
}

impl IdleBarrier {
    pub fn new(
        dispatcher: Arc<dyn Dispatcher>,
        idle_timeout: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            dispatcher,
            idle_timeout,
            metrics,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Block until the events pending at the time of the call are processed
    ///
    /// A marker job is queued behind the current backlog and the caller waits
    /// for it to run. Returns at once when nothing is pending. Calling this
    /// from the UI thread would wait for itself and is rejected.
    pub fn wait_for_idle(&self) -> Result<()> {
        if self.dispatcher.is_dispatch_thread() {
            return Err(PreconditionFailure::OnDispatchThread.into());
        }
        let backlog = self.dispatcher.pending_events();
        if backlog == 0 {
            return Ok(());
        }

        let start = Instant::now();
        let (marker_tx, marker_rx) = channel::bounded::<()>(1);
        self.dispatcher.invoke_later(Box::new(move || {
            let _ = marker_tx.send(());
        }))?;

        marker_rx
            .recv_timeout(self.idle_timeout)
            .map_err(|e| match e {
                RecvTimeoutError::Timeout => {
                    tracing::warn!(
                        "UI thread still busy after {:?} ({} events were pending)",
                        self.idle_timeout,
                        backlog
                    );
                    RobotError::UiThreadUnresponsive {
                        waited: self.idle_timeout,
                    }
                }
                RecvTimeoutError::Disconnected => RobotError::EventLoopStopped,
            })?;

        let waited = start.elapsed();
        self.metrics.record_idle_wait(waited);
        tracing::debug!("UI thread idle after {:?} ({} events drained)", waited, backlog);
        Ok(())
    }
}
