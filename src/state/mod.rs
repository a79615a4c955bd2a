// Gesture state tracking
//
// This module provides the GestureTracker which holds the phase of the gesture
// currently being performed behind Arc<RwLock<T>> and emits events so tests
// and tooling can observe gestures without polling.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

use crate::error::{PreconditionFailure, Result};

/// Phase of the gesture state machine
///
/// `Idle → Pressed → Dragging → Dropped | Aborted`. `Idle`, `Dropped` and
/// `Aborted` all accept a new gesture; it always restarts from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GesturePhase {
    Idle,
    Pressed,
    Dragging,
    Dropped,
    Aborted,
}

impl GesturePhase {
    /// A button is held by a gesture that has not ended
    pub fn is_active(self) -> bool {
        matches!(self, GesturePhase::Pressed | GesturePhase::Dragging)
    }
}

impl fmt::Display for GesturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GesturePhase::Idle => "idle",
            GesturePhase::Pressed => "pressed",
            GesturePhase::Dragging => "dragging",
            GesturePhase::Dropped => "dropped",
            GesturePhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Events emitted while gestures are performed
#[derive(Clone, Debug, PartialEq)]
pub enum GestureEvent {
    /// A gesture of `steps` primitive steps has started
    Started { steps: usize },

    /// The state machine moved between phases
    PhaseChanged {
        from: GesturePhase,
        to: GesturePhase,
    },

    /// Step `index` finished, including its idle barrier
    StepCompleted { index: usize },

    /// Every step ran; `phase` is where the gesture ended
    Finished { phase: GesturePhase },

    /// Step `step` failed and the remaining steps were skipped
    Aborted { step: usize, reason: String },
}

/// Snapshot of the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureStatus {
    pub phase: GesturePhase,
    pub steps_completed: usize,
    pub total_steps: usize,
    pub gestures_started: usize,
    /// Set from `begin` until `finish` or `abort`
    pub in_progress: bool,
}

impl Default for GestureStatus {
    fn default() -> Self {
        Self {
            phase: GesturePhase::Idle,
            steps_completed: 0,
            total_steps: 0,
            gestures_started: 0,
            in_progress: false,
        }
    }
}

/// Thread-safe gesture state machine with event emission
///
/// Clones share the same state and channel, so the
/// [`GestureSequencer`](crate::services::GestureSequencer) and any observer
/// can each hold one.
#[derive(Clone)]
pub struct GestureTracker {
    status: Arc<RwLock<GestureStatus>>,
    event_tx: broadcast::Sender<GestureEvent>,
}

impl GestureTracker {
    /// Create a tracker with a broadcast buffer of 100 events
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            status: Arc::new(RwLock::new(GestureStatus::default())),
            event_tx,
        }
    }

    pub fn snapshot(&self) -> GestureStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> GesturePhase {
        self.snapshot().phase
    }

    /// Subscribe to all future gesture events
    pub fn subscribe(&self) -> broadcast::Receiver<GestureEvent> {
        self.event_tx.subscribe()
    }

    /// Start a new gesture of `total_steps` steps from `Idle`
    ///
    /// Fails while another gesture has begun and not yet finished or aborted,
    /// whatever its phase.
    pub fn begin(&self, total_steps: usize) -> Result<()> {
        let mut events = Vec::new();
        {
            let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
            if status.in_progress || status.phase.is_active() {
                return Err(PreconditionFailure::GestureInProgress(status.phase.to_string()).into());
            }
            if status.phase != GesturePhase::Idle {
                events.push(GestureEvent::PhaseChanged {
                    from: status.phase,
                    to: GesturePhase::Idle,
                });
            }
            *status = GestureStatus {
                phase: GesturePhase::Idle,
                steps_completed: 0,
                total_steps,
                gestures_started: status.gestures_started + 1,
                in_progress: true,
            };
            events.push(GestureEvent::Started { steps: total_steps });
        }
        self.emit(events);
        Ok(())
    }

    pub fn pressed(&self) {
        self.transition(GesturePhase::Pressed);
    }

    pub fn dragging(&self) {
        self.transition(GesturePhase::Dragging);
    }

    /// A button came up: a drag becomes a drop, anything else returns to idle
    pub fn released(&self) {
        let next = match self.phase() {
            GesturePhase::Dragging => GesturePhase::Dropped,
            _ => GesturePhase::Idle,
        };
        self.transition(next);
    }

    pub fn step_completed(&self, index: usize) {
        {
            let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
            status.steps_completed = index + 1;
        }
        self.emit(vec![GestureEvent::StepCompleted { index }]);
    }

    pub fn finish(&self) {
        let phase = {
            let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
            status.in_progress = false;
            status.phase
        };
        self.emit(vec![GestureEvent::Finished { phase }]);
    }

    pub fn abort(&self, step: usize, reason: impl Into<String>) {
        self.transition(GesturePhase::Aborted);
        self.status
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .in_progress = false;
        self.emit(vec![GestureEvent::Aborted {
            step,
            reason: reason.into(),
        }]);
    }

    fn transition(&self, to: GesturePhase) {
        let from = {
            let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut status.phase, to)
        };
        if from != to {
            tracing::trace!("Gesture phase {} -> {}", from, to);
            self.emit(vec![GestureEvent::PhaseChanged { from, to }]);
        }
    }

    fn emit(&self, events: Vec<GestureEvent>) {
        for event in events {
            // No subscribers is fine
            let _ = self.event_tx.send(event);
        }
    }
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RobotError;

    #[test]
    fn test_new_tracker_is_idle() {
        let tracker = GestureTracker::new();
        let status = tracker.snapshot();

        assert_eq!(status.phase, GesturePhase::Idle);
        assert_eq!(status.gestures_started, 0);
    }

    #[test]
    fn test_drag_and_drop_phases() {
        let tracker = GestureTracker::new();
        let mut rx = tracker.subscribe();

        tracker.begin(3).unwrap();
        tracker.pressed();
        tracker.dragging();
        tracker.released();
        tracker.finish();

        assert_eq!(tracker.phase(), GesturePhase::Dropped);
        let events: Vec<GestureEvent> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            events,
            vec![
                GestureEvent::Started { steps: 3 },
                GestureEvent::PhaseChanged {
                    from: GesturePhase::Idle,
                    to: GesturePhase::Pressed
                },
                GestureEvent::PhaseChanged {
                    from: GesturePhase::Pressed,
                    to: GesturePhase::Dragging
                },
                GestureEvent::PhaseChanged {
                    from: GesturePhase::Dragging,
                    to: GesturePhase::Dropped
                },
                GestureEvent::Finished {
                    phase: GesturePhase::Dropped
                },
            ]
        );
    }

    #[test]
    fn test_click_returns_to_idle() {
        let tracker = GestureTracker::new();
        tracker.begin(2).unwrap();
        tracker.pressed();
        tracker.released();

        assert_eq!(tracker.phase(), GesturePhase::Idle);
    }

    #[test]
    fn test_begin_rejected_while_button_held() {
        let tracker = GestureTracker::new();
        tracker.begin(4).unwrap();
        tracker.pressed();

        let err = tracker.begin(1).unwrap_err();
        assert!(matches!(
            err,
            RobotError::Precondition(PreconditionFailure::GestureInProgress(ref phase))
                if phase == "pressed"
        ));
    }

    #[test]
    fn test_begin_rejected_until_gesture_finishes() {
        let tracker = GestureTracker::new();
        tracker.begin(3).unwrap();

        // Not pressed yet, but the gesture has begun
        let err = tracker.begin(1).unwrap_err();
        assert!(matches!(
            err,
            RobotError::Precondition(PreconditionFailure::GestureInProgress(ref phase))
                if phase == "idle"
        ));
        assert_eq!(tracker.snapshot().total_steps, 3);

        tracker.finish();
        assert!(!tracker.snapshot().in_progress);
        tracker.begin(1).unwrap();
    }

    #[test]
    fn test_aborted_gesture_restarts_from_idle() {
        let tracker = GestureTracker::new();
        tracker.begin(2).unwrap();
        tracker.pressed();
        tracker.abort(1, "There is no drag in effect");
        assert_eq!(tracker.phase(), GesturePhase::Aborted);

        tracker.begin(1).unwrap();

        let status = tracker.snapshot();
        assert_eq!(status.phase, GesturePhase::Idle);
        assert_eq!(status.gestures_started, 2);
        assert_eq!(status.steps_completed, 0);
    }

    #[test]
    fn test_step_completion_is_counted() {
        let tracker = GestureTracker::new();
        tracker.begin(3).unwrap();
        tracker.step_completed(0);
        tracker.step_completed(1);

        assert_eq!(tracker.snapshot().steps_completed, 2);
    }

    #[tokio::test]
    async fn test_subscribers_receive_abort() {
        let tracker = GestureTracker::new();
        let mut rx = tracker.subscribe();

        tracker.begin(1).unwrap();
        tracker.abort(0, "boom");

        assert_eq!(rx.recv().await.unwrap(), GestureEvent::Started { steps: 1 });
        assert_eq!(
            rx.recv().await.unwrap(),
            GestureEvent::PhaseChanged {
                from: GesturePhase::Idle,
                to: GesturePhase::Aborted
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            GestureEvent::Aborted {
                step: 0,
                reason: "boom".to_string()
            }
        );
    }
}
