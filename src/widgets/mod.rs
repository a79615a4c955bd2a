//! Headless widget models.
//!
//! These are the widgets the [`HeadlessToolkit`](crate::ui::HeadlessToolkit)
//! owns on its UI thread. Each collection-like widget implements
//! [`ElementSource`](crate::services::ElementSource) so the
//! [`RetryingLocator`](crate::services::RetryingLocator) can find, scroll to and
//! measure its elements without knowing its type.

pub mod combo;
pub mod list;
pub mod menu;
pub mod slider;
pub mod table;
pub mod tree;
pub mod viewport;

pub use combo::ComboBox;
pub use list::ListBox;
pub use menu::{Menu, MenuItem};
pub use slider::Slider;
pub use table::Table;
pub use tree::{TreeNode, TreeView};
pub use viewport::RowViewport;

use crate::models::{MouseButton, Point, Rect};

/// Anything placed on the headless screen
pub trait Component: 'static {
    /// Widget type name used in diagnostics, e.g. `"ListBox"`
    fn kind(&self) -> &'static str;

    fn name(&self) -> Option<&str> {
        None
    }

    /// Screen bounds
    fn bounds(&self) -> Rect;

    fn is_enabled(&self) -> bool {
        true
    }

    fn is_showing(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        match self.name() {
            Some(name) => format!("{} '{}'", self.kind(), name),
            None => self.kind().to_string(),
        }
    }

    fn on_click(&mut self, _at: Point, _button: MouseButton, _count: u32) {}

    fn on_drop(&mut self, _at: Point) {}

    fn on_key(&mut self, _ch: char) {}
}
