use crate::models::{MouseButton, Point, Rect};
use crate::widgets::Component;

/// Horizontal slider over an inclusive integer range
///
/// The thumb position maps linearly onto `min..=max` across the track width.
/// Clicking or dropping on the track moves the value to that position.
#[derive(Debug, Clone)]
pub struct Slider {
    name: String,
    bounds: Rect,
    min: i32,
    max: i32,
    value: i32,
    enabled: bool,
}

impl Slider {
    pub fn new(name: impl Into<String>, bounds: Rect, min: i32, max: i32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            name: name.into(),
            bounds,
            min,
            max,
            value: min,
            enabled: true,
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// Set the value, clamped to the range
    pub fn set_value(&mut self, value: i32) {
        self.value = value.clamp(self.min, self.max);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn track_span(&self) -> i64 {
        i64::from((self.bounds.size.width - 1).max(1))
    }

    fn range(&self) -> i64 {
        i64::from(self.max) - i64::from(self.min)
    }

    /// Screen point of the thumb for `value`
    pub fn point_for(&self, value: i32) -> Point {
        let offset = i64::from(value.clamp(self.min, self.max)) - i64::from(self.min);
        let x = if self.range() == 0 {
            0
        } else {
            (offset * self.track_span() + self.range() / 2) / self.range()
        };
        Point::new(self.bounds.origin.x + x as i32, self.bounds.center().y)
    }

    /// Value under screen point `at`, clamped to the range
    pub fn value_at_point(&self, at: Point) -> i32 {
        let x = i64::from(self.bounds.to_local(at).x).clamp(0, self.track_span());
        let span = self.track_span();
        let value = i64::from(self.min) + (x * self.range() + span / 2) / span;
        value as i32
    }
}

impl Component for Slider {
    fn kind(&self) -> &'static str {
        "Slider"
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn on_click(&mut self, at: Point, button: MouseButton, _count: u32) {
        if button == MouseButton::Left {
            self.set_value(self.value_at_point(at));
        }
    }

    fn on_drop(&mut self, at: Point) {
        if self.enabled {
            self.set_value(self.value_at_point(at));
        }
    }
}
