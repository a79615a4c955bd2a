// uirobot - drive single-threaded GUI toolkits from test code
//
// This is the library crate containing the cross-thread core: UI-thread
// execution, idle synchronization, polling waits, element lookup and gesture
// sequencing, plus a headless toolkit and thin widget drivers on top.
// The binary crate (main.rs) runs a smoke scenario against the headless toolkit.

pub mod config;
pub mod drivers;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;
pub mod widgets;

// Re-export commonly used types for convenience
pub use config::SettingsManager;
pub use drivers::{CollectionDriver, ComboBoxDriver, SliderDriver};
pub use error::{FailureKind, Result, RobotError};
pub use metrics::Metrics;
pub use models::{MouseButton, Platform, Point, Rect, RobotSettings};
pub use services::{Condition, Gesture, Timeout, pattern, value};
pub use state::{GestureEvent, GesturePhase, GestureTracker};
pub use ui::{Robot, Widget, WidgetAccess};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
