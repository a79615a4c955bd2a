//! Thin widget drivers.
//!
//! Drivers compose the core primitives of a [`Robot`](crate::ui::Robot):
//! validate through the executor, locate, inject input, wait for idle, then
//! read back. They hold no state of their own beyond a robot handle.

pub mod collection;
pub mod combo;
pub mod slider;

pub use collection::CollectionDriver;
pub use combo::ComboBoxDriver;
pub use slider::SliderDriver;
