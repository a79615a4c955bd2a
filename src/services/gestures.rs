//! Composite input gestures.
//!
//! A [`Gesture`] is an ordered list of primitive [`GestureStep`]s in which every
//! press is matched by exactly one later release. [`GestureSequencer`] performs
//! the steps strictly in order through an [`InputDriver`], placing an idle
//! barrier after each step flagged as a synchronisation point. The first
//! failing step ends the gesture; later steps are never executed and nothing
//! is retried.
//!
//! Drag recognition depends on the platform: the pointer must move
//! `drag_threshold` pixels away from the press point, and the jitter sequence
//! that reliably starts a drag differs between Windows/macOS and X11.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::{GestureAbortReason, PreconditionFailure, Result, RobotError};
use crate::metrics::Metrics;
use crate::models::{GestureAction, GestureStep, MouseButton, Platform, Point, Rect, RobotSettings};
use crate::services::idle::IdleBarrier;
use crate::services::pause::poll_until;
use crate::state::GestureTracker;

/// Offset of the first drag-over move relative to the drop point
const DRAG_OVER_OFFSET: i32 = 4;

/// Posts native input events into the toolkit's event stream
///
/// Implementations return once the event is queued, not once it is processed;
/// callers synchronise with an [`IdleBarrier`].
#[cfg_attr(test, mockall::automock)]
pub trait InputDriver: Send + Sync {
    fn move_to(&self, at: Point) -> Result<()>;

    fn press(&self, button: MouseButton) -> Result<()>;

    fn release(&self, button: MouseButton) -> Result<()>;

    fn type_keys(&self, text: &str) -> Result<()>;

    /// Whether the toolkit currently considers a drag to be in effect
    fn is_dragging(&self) -> Result<bool>;
}

/// A validated sequence of primitive steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gesture {
    steps: Vec<GestureStep>,
}

impl Gesture {
    /// Validate that every press has exactly one matching release
    pub fn new(steps: Vec<GestureStep>) -> Result<Self> {
        let mut held = HashSet::new();
        for (index, step) in steps.iter().enumerate() {
            match step.action {
                GestureAction::Press(button) if !held.insert(button) => {
                    return Err(unbalanced(format!(
                        "step {index} presses {button} while it is already held"
                    )));
                }
                GestureAction::Release { button, .. } if !held.remove(&button) => {
                    return Err(unbalanced(format!(
                        "step {index} releases {button} which is not held"
                    )));
                }
                _ => {}
            }
        }
        if let Some(button) = held.into_iter().next() {
            return Err(unbalanced(format!("{button} is never released")));
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[GestureStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Click `times` times at `at`
    pub fn click(at: Point, button: MouseButton, times: u32) -> Self {
        let mut steps = vec![GestureStep::new(GestureAction::MoveTo(at))];
        for _ in 0..times {
            steps.push(GestureStep::new(GestureAction::Press(button)));
            steps.push(GestureStep::new(GestureAction::Release {
                button,
                require_drag: false,
            }));
        }
        if let Some(last) = steps.last_mut() {
            last.sync = true;
        }
        Self { steps }
    }

    /// Drag from `from` (inside `source`) and drop at `to`
    pub fn drag_and_drop(from: Point, source: Rect, to: Point, settings: &RobotSettings) -> Self {
        let mut steps = drag_steps(from, source, settings);
        steps.extend(drop_steps(to, settings));
        Self { steps }
    }

    /// Press at `grip`, move to `to` and release, e.g. to resize a window
    pub fn resize(grip: Point, to: Point) -> Self {
        Self::press_and_move(grip, to, MouseButton::Left)
    }

    /// Press `button` at `from`, move to `to`, release
    pub fn press_and_move(from: Point, to: Point, button: MouseButton) -> Self {
        Self {
            steps: vec![
                GestureStep::synced(GestureAction::MoveTo(from)),
                GestureStep::new(GestureAction::Press(button)),
                GestureStep::synced(GestureAction::MoveTo(to)),
                GestureStep::synced(GestureAction::Release {
                    button,
                    require_drag: false,
                }),
            ],
        }
    }
}

fn unbalanced(detail: String) -> RobotError {
    PreconditionFailure::UnbalancedGesture(detail).into()
}

/// Steps that press at `from` and jitter the pointer until a drag starts
///
/// The press is left held; [`drop_steps`] completes the gesture.
pub fn drag_steps(from: Point, source: Rect, settings: &RobotSettings) -> Vec<GestureStep> {
    let mut steps = vec![
        GestureStep::synced(GestureAction::MoveTo(from)),
        GestureStep::new(GestureAction::Press(MouseButton::Left)),
    ];
    let drag_delay = settings.drag_delay();
    if drag_delay > settings.delay_between_events() {
        steps.push(GestureStep::new(GestureAction::Wait(drag_delay)));
    }
    let threshold = settings.drag_threshold();
    let path = match settings.platform() {
        Platform::Windows | Platform::MacOs => jitter_inside(from, source, threshold),
        Platform::X11 => jitter_and_return(from, threshold),
    };
    steps.extend(path.into_iter().map(|p| GestureStep::new(GestureAction::MoveTo(p))));
    if let Some(last) = steps.last_mut() {
        last.sync = true;
    }
    steps
}

/// Steps that drag over `to` and release there once a drag is in effect
pub fn drop_steps(to: Point, settings: &RobotSettings) -> Vec<GestureStep> {
    let mut steps = vec![
        GestureStep::new(GestureAction::MoveTo(to.offset(-DRAG_OVER_OFFSET, 0))),
        GestureStep::new(GestureAction::MoveTo(to)),
    ];
    let drop_delay = settings.drop_delay();
    let between = settings.delay_between_events();
    if drop_delay > between {
        steps.push(GestureStep::new(GestureAction::Wait(drop_delay - between)));
    }
    steps.push(GestureStep::synced(GestureAction::Release {
        button: MouseButton::Left,
        require_drag: true,
    }));
    steps
}

/// Moves away from `from` while staying inside `source` where possible
fn jitter_inside(from: Point, source: Rect, threshold: i32) -> [Point; 4] {
    let local = source.to_local(from);
    let step = |coordinate: i32, dimension: i32| {
        if coordinate + threshold < dimension {
            threshold
        } else {
            0
        }
    };
    let mut dx = step(local.x, source.size.width);
    let dy = step(local.y, source.size.height);
    if dx == 0 && dy == 0 {
        dx = threshold;
    }
    [
        from.offset(dx / 4, dy / 4),
        from.offset(dx / 2, dy / 2),
        from.offset(dx, dy),
        from.offset(dx + 1, dy),
    ]
}

/// Moves out diagonally past the threshold and back to the press point
fn jitter_and_return(from: Point, threshold: i32) -> [Point; 4] {
    let half = threshold / 2;
    [
        from.offset(half, half),
        from.offset(threshold, threshold),
        from.offset(half, half),
        from,
    ]
}

/// Performs gestures step by step
#[derive(Clone)]
pub struct GestureSequencer {
    input: Arc<dyn InputDriver>,
    idle: IdleBarrier,
    tracker: GestureTracker,
    settings: RobotSettings,
    metrics: Arc<Metrics>,
}

impl GestureSequencer {
    pub fn new(
        input: Arc<dyn InputDriver>,
        idle: IdleBarrier,
        tracker: GestureTracker,
        settings: RobotSettings,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            input,
            idle,
            tracker,
            settings,
            metrics,
        }
    }

    pub fn tracker(&self) -> &GestureTracker {
        &self.tracker
    }

    /// Execute every step of `gesture` in order
    ///
    /// On failure the tracker is left `Aborted`, the remaining steps are
    /// skipped and the error of the failing step is returned unchanged.
    pub fn perform(&self, gesture: &Gesture) -> Result<()> {
        self.tracker.begin(gesture.len())?;
        tracing::debug!("Performing gesture of {} steps", gesture.len());

        for (index, step) in gesture.steps().iter().enumerate() {
            if let Err(err) = self.execute(index, step) {
                self.metrics.record_gesture_aborted();
                tracing::warn!("Gesture aborted at step {} ({}): {}", index, step.action, err);
                self.tracker.abort(index, err.to_string());
                return Err(err);
            }
            self.metrics.record_gesture_step();
            self.tracker.step_completed(index);
        }

        self.metrics.record_gesture_completed();
        self.tracker.finish();
        Ok(())
    }

    fn execute(&self, index: usize, step: &GestureStep) -> Result<()> {
        tracing::trace!("Gesture step {}: {}", index, step.action);
        match step.action {
            GestureAction::MoveTo(at) => {
                self.input.move_to(at)?;
                self.between_events();
            }
            GestureAction::Press(button) => {
                self.input.press(button)?;
                self.tracker.pressed();
                self.between_events();
            }
            GestureAction::Release {
                button,
                require_drag,
            } => {
                if require_drag {
                    self.await_drag(index)?;
                }
                self.input.release(button)?;
                self.tracker.released();
                self.between_events();
            }
            GestureAction::Wait(duration) => thread::sleep(duration),
        }
        if step.sync {
            self.idle.wait_for_idle()?;
        }
        Ok(())
    }

    /// Wait briefly for the toolkit to report a drag before releasing
    fn await_drag(&self, index: usize) -> Result<()> {
        let dragging = poll_until(
            self.settings.drag_detection_timeout(),
            self.settings.poll_interval(),
            || self.input.is_dragging(),
        )?;
        if !dragging {
            return Err(RobotError::GestureAborted {
                step: index,
                reason: GestureAbortReason::NoDragInEffect,
            });
        }
        self.tracker.dragging();
        Ok(())
    }

    fn between_events(&self) {
        let delay = self.settings.delay_between_events();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

/// Total time the `Wait` steps of a gesture will sleep
pub fn scripted_delay(gesture: &Gesture) -> Duration {
    gesture
        .steps()
        .iter()
        .filter_map(|step| match step.action {
            GestureAction::Wait(d) => Some(d),
            _ => None,
        })
        .sum()
}
