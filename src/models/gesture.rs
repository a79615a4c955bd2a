use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MouseButton::Left => "left",
            MouseButton::Middle => "middle",
            MouseButton::Right => "right",
        };
        f.write_str(name)
    }
}

/// One primitive input operation of a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    MoveTo(Point),
    Press(MouseButton),
    /// Release a button. With `require_drag` set, the release waits (briefly)
    /// for a drag to be in effect and aborts the gesture if none is.
    Release {
        button: MouseButton,
        require_drag: bool,
    },
    Wait(Duration),
}

impl fmt::Display for GestureAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestureAction::MoveTo(p) => write!(f, "move to {p}"),
            GestureAction::Press(b) => write!(f, "press {b}"),
            GestureAction::Release {
                button,
                require_drag: true,
            } => write!(f, "drop with {button}"),
            GestureAction::Release { button, .. } => write!(f, "release {button}"),
            GestureAction::Wait(d) => write!(f, "wait {}ms", d.as_millis()),
        }
    }
}

/// A primitive action plus whether an idle barrier follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureStep {
    pub action: GestureAction,
    pub sync: bool,
}

impl GestureStep {
    pub const fn new(action: GestureAction) -> Self {
        Self {
            action,
            sync: false,
        }
    }

    pub const fn synced(action: GestureAction) -> Self {
        Self { action, sync: true }
    }
}
