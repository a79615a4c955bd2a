//! Services module - the cross-thread primitives a [`Robot`](crate::ui::Robot) is built from.
//!
//! None of these know which toolkit they drive: they only talk to a
//! [`Dispatcher`](crate::ui::Dispatcher) through a [`UiExecutor`](crate::ui::UiExecutor),
//! and to native input through an [`InputDriver`].
//!
//! # Components
//!
//! - [`IdleBarrier`]: blocks until input already posted to the UI thread has
//!   been processed. Refuses to run on the UI thread itself.
//! - [`Pause`]: bounded polling waits on a [`Condition`], evaluated on the UI
//!   thread. Times out with a [`RobotError::WaitTimedOut`](crate::RobotError::WaitTimedOut)
//!   naming the condition.
//! - [`RetryingLocator`]: finds the first element of a list, table, tree or
//!   menu accepted by a [`TextMatcher`], scrolls it into view and measures it.
//! - [`GestureSequencer`]: runs a balanced [`Gesture`] step by step,
//!   synchronizing with the UI thread where a step asks for it.
//!
//! # Usage Example
//!
//! ```ignore
//! use uirobot::services::{value, ScrollPolicy};
//!
//! let found = robot
//!     .locator()
//!     .locate_or_fail(&list, value("Charlie"), ScrollPolicy::UnlessSelected)?;
//! if let Some(at) = found.coordinate {
//!     robot.perform(&Gesture::click(at, MouseButton::Left, 1))?;
//! }
//! ```

pub mod format;
pub mod gestures;
pub mod idle;
pub mod locator;
pub mod pause;

pub use format::format_contents;
pub use gestures::{Gesture, GestureSequencer, InputDriver};
pub use idle::IdleBarrier;
pub use locator::{
    ElementMatch, ElementSource, ExactText, MatchResult, PatternText, RetryingLocator,
    ScrollPolicy, SharedMatcher, TextMatcher, pattern, value,
};
pub use pause::{Condition, Pause, Timeout};
