use crate::models::{MouseButton, Point, Rect};
use crate::services::locator::ElementSource;
use crate::widgets::Component;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub enabled: bool,
}

/// Popup menu: every item is always in view and nothing stays selected
///
/// Clicking an enabled item records its activation and closes the popup.
#[derive(Debug, Clone)]
pub struct Menu {
    name: String,
    origin: Point,
    width: i32,
    item_height: i32,
    items: Vec<MenuItem>,
    open: bool,
    activated: Vec<String>,
}

impl Menu {
    pub fn new<I, S>(
        name: impl Into<String>,
        origin: Point,
        width: i32,
        item_height: i32,
        labels: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            origin,
            width,
            item_height: item_height.max(1),
            items: labels
                .into_iter()
                .map(|label| MenuItem {
                    label: label.into(),
                    enabled: true,
                })
                .collect(),
            open: false,
            activated: Vec::new(),
        }
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_item_enabled(&mut self, label: &str, enabled: bool) {
        if let Some(item) = self.items.iter_mut().find(|i| i.label == label) {
            item.enabled = enabled;
        }
    }

    pub fn activated(&self) -> &[String] {
        &self.activated
    }
}

impl Component for Menu {
    fn kind(&self) -> &'static str {
        "Menu"
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y,
            self.width,
            self.item_height * self.items.len() as i32,
        )
    }

    fn is_showing(&self) -> bool {
        self.open
    }

    fn on_click(&mut self, at: Point, button: MouseButton, _count: u32) {
        if button != MouseButton::Left || !self.bounds().contains(at) {
            return;
        }
        let index = ((at.y - self.origin.y) / self.item_height) as usize;
        if let Some(item) = self.items.get(index).filter(|i| i.enabled) {
            tracing::debug!("Menu '{}' activated '{}'", self.name, item.label);
            self.activated.push(item.label.clone());
            self.open = false;
        }
    }
}

impl ElementSource for Menu {
    fn element_count(&self) -> usize {
        self.items.len()
    }

    fn value_at(&self, index: usize) -> Option<String> {
        self.items.get(index).map(|i| i.label.clone())
    }

    fn is_selected(&self, _index: usize) -> bool {
        false
    }

    fn scroll_to_element(&mut self, _index: usize) {}

    fn coordinate_of(&self, index: usize) -> Point {
        Point::new(
            self.origin.x + self.width / 2,
            self.origin.y + index as i32 * self.item_height + self.item_height / 2,
        )
    }
}
