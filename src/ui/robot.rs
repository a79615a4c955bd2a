// Robot - wires the cross-thread primitives to one UI thread
//
// This module contains the Robot which owns, for a single Dispatcher:
// - UiExecutor (closures on the UI thread)
// - IdleBarrier (wait for posted input to be processed)
// - Pause (bounded polling waits)
// - RetryingLocator (element lookup in collection-like widgets)
// - GestureSequencer (composite pointer input)
//
// Drivers are built on top of a Robot and never talk to the toolkit directly.

use std::sync::Arc;

use crate::error::Result;
use crate::metrics::Metrics;
use crate::models::{MouseButton, Point, RobotSettings};
use crate::services::gestures::{Gesture, GestureSequencer, InputDriver};
use crate::services::idle::IdleBarrier;
use crate::services::locator::RetryingLocator;
use crate::services::pause::{Pause, Timeout};
use crate::state::GestureTracker;
use crate::ui::bridge::Dispatcher;
use crate::ui::executor::UiExecutor;
use crate::ui::headless::{HeadlessInput, HeadlessToolkit};
use crate::ui::registry::Widget;
use crate::widgets::Component;

/// Entry point for driving a UI from test code
///
/// Cheap to clone; clones share the UI thread, metrics and gesture tracker.
///
/// # Example
/// ```ignore
/// let robot = Robot::headless(RobotSettings::default())?;
/// let list = robot.add_widget(|| ListBox::new("names", bounds, 20, ["A", "B"]))?;
/// CollectionDriver::new(&robot).select_item(&list, value("B"))?;
/// robot.metrics().log_summary();
/// ```
#[derive(Clone)]
pub struct Robot {
    executor: UiExecutor,
    idle: IdleBarrier,
    pause: Pause,
    locator: RetryingLocator,
    sequencer: GestureSequencer,
    input: Arc<dyn InputDriver>,
    tracker: GestureTracker,
    settings: RobotSettings,
    metrics: Arc<Metrics>,
}

impl Robot {
    /// Build a robot for `dispatcher`, injecting input through `input`
    pub fn new(
        dispatcher: Arc<dyn Dispatcher>,
        input: Arc<dyn InputDriver>,
        settings: RobotSettings,
    ) -> Self {
        let metrics = Arc::new(Metrics::new());
        let executor = UiExecutor::new(dispatcher, metrics.clone())
            .with_response_timeout(settings.ui_response_timeout());
        Self::assemble(executor, input, settings, metrics)
    }

    /// Start a headless toolkit and a robot driving it
    ///
    /// The toolkit stops once the robot and all its clones are dropped.
    pub fn headless(settings: RobotSettings) -> Result<Self> {
        let toolkit = HeadlessToolkit::start(&settings)?;
        let metrics = Arc::new(Metrics::new());
        let executor = UiExecutor::new(toolkit, metrics.clone())
            .with_response_timeout(settings.ui_response_timeout());
        let input: Arc<dyn InputDriver> = Arc::new(HeadlessInput::new(executor.clone()));
        Ok(Self::assemble(executor, input, settings, metrics))
    }

    fn assemble(
        executor: UiExecutor,
        input: Arc<dyn InputDriver>,
        settings: RobotSettings,
        metrics: Arc<Metrics>,
    ) -> Self {
        let idle = IdleBarrier::new(
            executor.dispatcher().clone(),
            settings.idle_timeout(),
            metrics.clone(),
        );
        let pause = Pause::new(
            executor.clone(),
            settings.poll_interval(),
            Timeout::from(settings.wait_timeout()),
            metrics.clone(),
        );
        let locator = RetryingLocator::new(executor.clone(), metrics.clone());
        let tracker = GestureTracker::new();
        let sequencer = GestureSequencer::new(
            input.clone(),
            idle.clone(),
            tracker.clone(),
            settings.clone(),
            metrics.clone(),
        );
        tracing::debug!("Robot assembled for platform {:?}", settings.platform());
        Self {
            executor,
            idle,
            pause,
            locator,
            sequencer,
            input,
            tracker,
            settings,
            metrics,
        }
    }

    pub fn executor(&self) -> &UiExecutor {
        &self.executor
    }

    pub fn pause(&self) -> &Pause {
        &self.pause
    }

    pub fn locator(&self) -> &RetryingLocator {
        &self.locator
    }

    pub fn sequencer(&self) -> &GestureSequencer {
        &self.sequencer
    }

    pub fn input(&self) -> &Arc<dyn InputDriver> {
        &self.input
    }

    pub fn tracker(&self) -> &GestureTracker {
        &self.tracker
    }

    pub fn settings(&self) -> &RobotSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Wait until input posted so far has been processed by the UI thread
    pub fn wait_for_idle(&self) -> Result<()> {
        self.idle.wait_for_idle()
    }

    /// Construct a widget on the UI thread and put it on the screen
    pub fn add_widget<T, F>(&self, factory: F) -> Result<Widget<T>>
    where
        T: Component,
        F: FnOnce() -> T + Send + 'static,
    {
        self.executor.query(move || Widget::register(factory()))
    }

    pub fn remove_widget<T: Component>(&self, widget: Widget<T>) -> Result<()> {
        self.executor.task(move || widget.unregister())
    }

    pub fn perform(&self, gesture: &Gesture) -> Result<()> {
        self.sequencer.perform(gesture)
    }

    /// Click once at a screen point and wait for the click to be processed
    pub fn click(&self, at: Point, button: MouseButton) -> Result<()> {
        self.perform(&Gesture::click(at, button, 1))
    }

    pub fn double_click(&self, at: Point) -> Result<()> {
        self.perform(&Gesture::click(at, MouseButton::Left, 2))
    }

    /// Type `text` into the focused widget and wait for it to be processed
    pub fn type_text(&self, text: &str) -> Result<()> {
        self.input.type_keys(text)?;
        self.wait_for_idle()
    }
}
