// Dispatcher - the seam between caller threads and a toolkit's UI thread
//
// Every toolkit the robot drives has exactly one thread that may touch widget
// state. The bridge abstracts the two things the robot needs from it:
// - posting a closure onto that thread's event queue
// - knowing whether the current thread is that thread
//
// The headless toolkit (ui::headless) is the built-in implementation; the
// slint event loop is available behind the `slint` feature.

use crate::error::Result;

/// A unit of work posted onto the UI thread
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Access to a toolkit's single UI thread
///
/// Implementations only schedule work; they never create threads on behalf of
/// the caller and never run a job more than once.
pub trait Dispatcher: Send + Sync {
    /// Whether the calling thread is the UI thread
    fn is_dispatch_thread(&self) -> bool;

    /// Queue `job` behind every event already pending on the UI thread
    ///
    /// Returns [`RobotError::EventLoopStopped`](crate::RobotError::EventLoopStopped)
    /// when the event loop no longer accepts work; the job is dropped unrun.
    fn invoke_later(&self, job: UiJob) -> Result<()>;

    /// Events queued on the UI thread that have not finished processing
    fn pending_events(&self) -> usize;
}

/// UI-thread access to a widget from a `Send + Sync` handle
///
/// Handles can be cloned into closures that run on the UI thread; resolving
/// them anywhere else fails with
/// [`PreconditionFailure::OffDispatchThread`](crate::error::PreconditionFailure::OffDispatchThread)
/// (or an equivalent toolkit error).
pub trait WidgetAccess: Clone + Send + Sync + 'static {
    type Target: ?Sized;

    fn with_mut<R>(&self, f: impl FnOnce(&mut Self::Target) -> R) -> Result<R>;

    fn with<R>(&self, f: impl FnOnce(&Self::Target) -> R) -> Result<R> {
        self.with_mut(|target| f(&*target))
    }
}

#[cfg(feature = "slint")]
pub use slint_backend::SlintDispatcher;

#[cfg(feature = "slint")]
mod slint_backend {
    use super::{Dispatcher, UiJob, WidgetAccess};
    use crate::error::{PreconditionFailure, Result, RobotError};
    use slint::{ComponentHandle, Weak};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::{self, ThreadId};

    /// Dispatcher backed by the slint event loop
    ///
    /// Must be created on the thread that runs the slint event loop.
    pub struct SlintDispatcher {
        ui_thread: ThreadId,
        pending: Arc<AtomicUsize>,
    }

    impl SlintDispatcher {
        pub fn new() -> Self {
            Self {
                ui_thread: thread::current().id(),
                pending: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Default for SlintDispatcher {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Dispatcher for SlintDispatcher {
        fn is_dispatch_thread(&self) -> bool {
            thread::current().id() == self.ui_thread
        }

        fn invoke_later(&self, job: UiJob) -> Result<()> {
            let pending = self.pending.clone();
            pending.fetch_add(1, Ordering::SeqCst);
            let queued = pending.clone();
            slint::invoke_from_event_loop(move || {
                job();
                queued.fetch_sub(1, Ordering::SeqCst);
            })
            .map_err(|e| {
                pending.fetch_sub(1, Ordering::SeqCst);
                tracing::warn!("Failed to queue job to slint event loop: {:?}", e);
                RobotError::EventLoopStopped
            })
        }

        fn pending_events(&self) -> usize {
            self.pending.load(Ordering::SeqCst)
        }
    }

    // Weak::upgrade only succeeds on the event loop thread, which is exactly
    // the confinement the robot needs.
    impl<T: ComponentHandle + 'static> WidgetAccess for Weak<T> {
        type Target = T;

        fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
            let mut component = self
                .upgrade()
                .ok_or(RobotError::Precondition(PreconditionFailure::OffDispatchThread))?;
            Ok(f(&mut component))
        }
    }
}
