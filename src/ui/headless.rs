// Headless toolkit - an in-process single-writer UI thread
//
// The toolkit owns one named thread that drains a FIFO event queue. Widgets
// live in that thread's registry and nowhere else. It implements Dispatcher,
// so every primitive in the crate can drive it exactly like a real event loop.

use crossbeam::channel::{self, Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use crate::error::{Result, RobotError};
use crate::models::{MouseButton, Point, RobotSettings};
use crate::services::gestures::InputDriver;
use crate::ui::bridge::{Dispatcher, UiJob};
use crate::ui::executor::UiExecutor;
use crate::ui::registry::{self, InputEvent};

const UI_THREAD_NAME: &str = "ui-thread";

enum UiEvent {
    Job(UiJob),
    Shutdown,
}

/// A headless UI toolkit with a real single-writer event loop
///
/// Dropping the last handle stops the event loop and releases every widget.
pub struct HeadlessToolkit {
    sender: Sender<UiEvent>,
    pending: Arc<AtomicUsize>,
    stopped: AtomicBool,
    ui_thread: ThreadId,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl HeadlessToolkit {
    /// Spawn the UI thread and install an empty widget registry on it
    pub fn start(settings: &RobotSettings) -> Result<Arc<Self>> {
        let (sender, receiver) = channel::unbounded();
        let pending = Arc::new(AtomicUsize::new(0));
        let drag_threshold = settings.drag_threshold();

        let loop_pending = pending.clone();
        let handle = thread::Builder::new()
            .name(UI_THREAD_NAME.to_string())
            .spawn(move || run_event_loop(receiver, loop_pending, drag_threshold))
            .map_err(|e| {
                tracing::error!("Failed to spawn headless UI thread: {}", e);
                RobotError::EventLoopStopped
            })?;

        tracing::info!("Headless toolkit started (drag threshold {}px)", drag_threshold);
        Ok(Arc::new(Self {
            sender,
            pending,
            stopped: AtomicBool::new(false),
            ui_thread: handle.thread().id(),
            handle: Mutex::new(Some(handle)),
        }))
    }

    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    /// Stop accepting work, let the UI thread finish its queue and join it
    ///
    /// Jobs queued behind the shutdown request are dropped unrun. Called on the
    /// UI thread itself, the thread is asked to stop but not joined.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.sender.send(UiEvent::Shutdown);
        if self.is_dispatch_thread() {
            return;
        }
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("Headless UI thread terminated abnormally");
            }
        }
        tracing::info!("Headless toolkit stopped");
    }
}

impl Dispatcher for HeadlessToolkit {
    fn is_dispatch_thread(&self) -> bool {
        thread::current().id() == self.ui_thread
    }

    fn invoke_later(&self, job: UiJob) -> Result<()> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(RobotError::EventLoopStopped);
        }
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.sender.send(UiEvent::Job(job)).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            RobotError::EventLoopStopped
        })
    }

    fn pending_events(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

impl Drop for HeadlessToolkit {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_event_loop(receiver: Receiver<UiEvent>, pending: Arc<AtomicUsize>, drag_threshold: i32) {
    registry::install(drag_threshold);
    tracing::debug!("Headless UI thread running");

    for event in receiver.iter() {
        match event {
            UiEvent::Job(job) => {
                // A panicking job must not take the UI thread down with it
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                    tracing::error!("UI job panicked: {}", panic_message(payload.as_ref()));
                }
                pending.fetch_sub(1, Ordering::SeqCst);
            }
            UiEvent::Shutdown => break,
        }
    }

    registry::uninstall();
    tracing::debug!("Headless UI thread exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

/// Simulated native input for the headless toolkit
///
/// Events are posted onto the UI thread and return once queued; the routed
/// widget sees them when the UI thread gets to them.
#[derive(Clone)]
pub struct HeadlessInput {
    executor: UiExecutor,
}

impl HeadlessInput {
    pub fn new(executor: UiExecutor) -> Self {
        Self { executor }
    }

    fn post(&self, event: InputEvent) -> Result<()> {
        tracing::trace!("Posting {:?}", event);
        self.executor.dispatcher().invoke_later(Box::new(move || {
            if let Err(e) = registry::dispatch(event) {
                tracing::warn!("Dropped input event {:?}: {}", event, e);
            }
        }))
    }

    /// Where the UI thread last saw the pointer
    pub fn pointer_location(&self) -> Result<Point> {
        self.executor.query(registry::pointer_location)
    }
}

impl InputDriver for HeadlessInput {
    fn move_to(&self, at: Point) -> Result<()> {
        self.post(InputEvent::Moved(at))
    }

    fn press(&self, button: MouseButton) -> Result<()> {
        self.post(InputEvent::Pressed(button))
    }

    fn release(&self, button: MouseButton) -> Result<()> {
        self.post(InputEvent::Released(button))
    }

    fn type_keys(&self, text: &str) -> Result<()> {
        text.chars().try_for_each(|ch| self.post(InputEvent::KeyTyped(ch)))
    }

    fn is_dragging(&self) -> Result<bool> {
        self.executor.query(registry::is_dragging)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use crate::services::pause::poll_until;
    use std::time::Duration;

    #[test]
    fn test_jobs_run_on_named_ui_thread() {
        let toolkit = HeadlessToolkit::start(&RobotSettings::default()).unwrap();
        let (tx, rx) = channel::bounded(1);

        toolkit
            .invoke_later(Box::new(move || {
                let _ = tx.send(thread::current().name().map(str::to_string));
            }))
            .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some(UI_THREAD_NAME));
        assert!(!toolkit.is_dispatch_thread());
    }

    #[test]
    fn test_pending_events_drop_to_zero() {
        let toolkit = HeadlessToolkit::start(&RobotSettings::default()).unwrap();
        let (tx, rx) = channel::bounded(0);

        toolkit
            .invoke_later(Box::new(move || {
                let _ = rx.recv();
            }))
            .unwrap();
        assert_eq!(toolkit.pending_events(), 1);

        tx.send(()).unwrap();
        let drained = poll_until(Duration::from_secs(5), Duration::from_millis(1), || {
            Ok(toolkit.pending_events() == 0)
        })
        .unwrap();
        assert!(drained);
    }

    #[test]
    fn test_raw_job_panic_keeps_loop_alive() {
        let toolkit = HeadlessToolkit::start(&RobotSettings::default()).unwrap();
        toolkit.invoke_later(Box::new(|| panic!("raw job"))).unwrap();

        let executor = UiExecutor::new(toolkit.clone(), Arc::new(Metrics::new()));
        assert_eq!(executor.query(|| Ok(7)).unwrap(), 7);
    }

    #[test]
    fn test_stopped_toolkit_rejects_work() {
        let toolkit = HeadlessToolkit::start(&RobotSettings::default()).unwrap();
        toolkit.shutdown();

        assert!(!toolkit.is_running());
        let err = toolkit.invoke_later(Box::new(|| {})).unwrap_err();
        assert!(matches!(err, RobotError::EventLoopStopped));
    }

    #[test]
    fn test_input_reaches_registry() {
        let toolkit = HeadlessToolkit::start(&RobotSettings::default()).unwrap();
        let executor = UiExecutor::new(toolkit.clone(), Arc::new(Metrics::new()));
        let input = HeadlessInput::new(executor);

        input.move_to(Point::new(3, 4)).unwrap();

        assert_eq!(input.pointer_location().unwrap(), Point::new(3, 4));
        assert!(!input.is_dragging().unwrap());
    }
}
