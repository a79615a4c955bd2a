//! Plain data shared by the robot primitives.
//!
//! - [`RobotSettings`]: delays, timeouts and drag thresholds, loaded by
//!   [`SettingsManager`](crate::config::SettingsManager)
//! - [`Point`], [`Size`], [`Rect`]: screen geometry
//! - [`GestureStep`], [`GestureAction`], [`MouseButton`]: the vocabulary the
//!   [`GestureSequencer`](crate::services::GestureSequencer) executes

pub mod geometry;
pub mod gesture;
pub mod settings;

pub use geometry::{Point, Rect, Size};
pub use gesture::{GestureAction, GestureStep, MouseButton};
pub use settings::{Platform, RobotSettings};
