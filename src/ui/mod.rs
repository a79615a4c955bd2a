// UI module - the toolkit side of the robot
//
// This module contains:
// - Dispatcher / WidgetAccess: the seam to a toolkit's single UI thread
// - UiExecutor: runs closures on that thread and hands results back
// - HeadlessToolkit / HeadlessInput: a built-in UI thread with simulated input
// - Widget registry: UI-thread-confined widget ownership
// - Robot: wires all of the above together for test code

pub mod bridge;
pub mod executor;
pub mod headless;
pub mod registry;
pub mod robot;

#[cfg(feature = "slint")]
pub use bridge::SlintDispatcher;
pub use bridge::{Dispatcher, UiJob, WidgetAccess};
pub use executor::{ExecutionOutcome, GuiAction, Query, Task, UiExecutor};
pub use headless::{HeadlessInput, HeadlessToolkit};
pub use registry::{InputEvent, Widget};
pub use robot::Robot;
