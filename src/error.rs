//! Failure taxonomy shared by every primitive in the crate.
//!
//! Each variant belongs to exactly one [`FailureKind`] so test tooling can tell
//! infrastructure flakiness (timeouts) apart from genuine behavioural mismatches
//! (assertions, lookups).

use std::time::Duration;
use thiserror::Error;

use crate::services::format::format_contents;

/// Result alias used throughout the crate
pub type Result<T, E = RobotError> = std::result::Result<T, E>;

/// Errors raised while driving a UI through the robot
#[derive(Error, Debug)]
pub enum RobotError {
    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionFailure),

    #[error(transparent)]
    Lookup(#[from] LookupFailure),

    #[error("Timed out waiting for {description} after {timeout:?}")]
    WaitTimedOut {
        description: String,
        timeout: Duration,
    },

    #[error("UI thread did not respond within {waited:?}")]
    UiThreadUnresponsive { waited: Duration },

    #[error("Gesture aborted at step {step}: {reason}")]
    GestureAborted {
        step: usize,
        reason: GestureAbortReason,
    },

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("UI event loop has stopped")]
    EventLoopStopped,

    #[error("Widget #{0} is not registered with the UI thread")]
    WidgetUnavailable(u64),

    #[error("Widget #{0} is already borrowed by the running UI closure")]
    WidgetBusy(u64),
}

/// Failures detected before any input is injected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionFailure {
    #[error("Expected {0} to be enabled")]
    NotEnabled(String),

    #[error("Expected {0} to be showing on the screen")]
    NotShowing(String),

    #[error("Index {index} should be between 0 and {} (inclusive)", .count.saturating_sub(1))]
    IndexOutOfBounds { index: usize, count: usize },

    #[error("Value {value} should be between {min} and {max}")]
    ValueOutOfBounds { value: String, min: String, max: String },

    #[error("Cannot block on the UI thread from the UI thread itself")]
    OnDispatchThread,

    #[error("Widget state can only be accessed on the UI thread")]
    OffDispatchThread,

    #[error("Unbalanced gesture: {0}")]
    UnbalancedGesture(String),

    #[error("Another gesture is already in progress ({0})")]
    GestureInProgress(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// No element of a collection-like widget matched
///
/// Carries everything needed to diagnose the miss without re-reading the widget:
/// the widget description, the matcher description and the contents observed
/// at lookup time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Unable to find item matching the {matcher} among the {widget} contents {}",
    format_contents(.contents)
)]
pub struct LookupFailure {
    pub widget: String,
    pub matcher: String,
    pub contents: Vec<Option<String>>,
}

/// Reason a gesture was abandoned
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAbortReason {
    #[error("There is no drag in effect")]
    NoDragInEffect,

    #[error("Unable to complete the drop")]
    DropFailed,
}

/// Coarse classification of a [`RobotError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Precondition,
    Lookup,
    Timeout,
    GestureAbort,
    Assertion,
    Infrastructure,
}

impl RobotError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Precondition(_) => FailureKind::Precondition,
            Self::Lookup(_) => FailureKind::Lookup,
            Self::WaitTimedOut { .. } | Self::UiThreadUnresponsive { .. } => FailureKind::Timeout,
            Self::GestureAborted { .. } => FailureKind::GestureAbort,
            Self::Assertion(_) => FailureKind::Assertion,
            Self::EventLoopStopped | Self::WidgetUnavailable(_) | Self::WidgetBusy(_) => {
                FailureKind::Infrastructure
            }
        }
    }

    /// True for both condition timeouts and an unresponsive UI thread
    pub fn is_timeout(&self) -> bool {
        self.kind() == FailureKind::Timeout
    }

    pub(crate) fn wait_timed_out(description: impl Into<String>, timeout: Duration) -> Self {
        Self::WaitTimedOut {
            description: description.into(),
            timeout,
        }
    }
}
