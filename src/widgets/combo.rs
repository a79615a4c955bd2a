use crate::models::{MouseButton, Point, Rect};
use crate::services::locator::ElementSource;
use crate::widgets::{Component, RowViewport};

/// Drop-down selector: a closed field plus a scrollable popup list below it
///
/// The elements it exposes are the popup rows, so they only have a usable
/// screen location while the popup is visible.
#[derive(Debug, Clone)]
pub struct ComboBox {
    name: String,
    field: Rect,
    popup: RowViewport,
    items: Vec<String>,
    selected: Option<usize>,
    popup_visible: bool,
    enabled: bool,
}

impl ComboBox {
    /// `visible_rows` rows of the popup fit below `field` before it scrolls
    pub fn new<I, S>(name: impl Into<String>, field: Rect, visible_rows: i32, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row_height = field.size.height.max(1);
        let popup = Rect::new(
            field.origin.x,
            field.origin.y + field.size.height,
            field.size.width,
            row_height * visible_rows.max(1),
        );
        Self {
            name: name.into(),
            field,
            popup: RowViewport::new(popup, row_height),
            items: items.into_iter().map(Into::into).collect(),
            selected: None,
            popup_visible: false,
            enabled: true,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_value(&self) -> Option<&str> {
        self.selected
            .and_then(|i| self.items.get(i))
            .map(String::as_str)
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|&i| i < self.items.len());
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn show_popup(&mut self) {
        if !self.popup_visible {
            tracing::trace!("ComboBox '{}' popup shown", self.name);
            self.popup_visible = true;
        }
    }

    pub fn hide_popup(&mut self) {
        if self.popup_visible {
            tracing::trace!("ComboBox '{}' popup hidden", self.name);
            self.popup_visible = false;
        }
    }

    pub fn is_popup_visible(&self) -> bool {
        self.popup_visible
    }

    /// Times the popup list actually scrolled
    pub fn scroll_count(&self) -> usize {
        self.popup.scroll_count()
    }

    fn item_at(&self, at: Point) -> Option<usize> {
        self.popup.row_at(at).filter(|&row| row < self.items.len())
    }
}

impl Component for ComboBox {
    fn kind(&self) -> &'static str {
        "ComboBox"
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    /// The field, extended over the popup while it is visible
    fn bounds(&self) -> Rect {
        if !self.popup_visible {
            return self.field;
        }
        let popup = self.popup.bounds();
        Rect::new(
            self.field.origin.x,
            self.field.origin.y,
            self.field.size.width,
            self.field.size.height + popup.size.height,
        )
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn on_click(&mut self, at: Point, button: MouseButton, _count: u32) {
        if button != MouseButton::Left || !self.enabled {
            return;
        }
        if self.field.contains(at) {
            self.popup_visible = !self.popup_visible;
            return;
        }
        if !self.popup_visible {
            return;
        }
        if let Some(row) = self.item_at(at) {
            tracing::debug!("ComboBox '{}' selected '{}'", self.name, self.items[row]);
            self.selected = Some(row);
            self.popup_visible = false;
        }
    }
}

impl ElementSource for ComboBox {
    fn element_count(&self) -> usize {
        self.items.len()
    }

    fn value_at(&self, index: usize) -> Option<String> {
        self.items.get(index).cloned()
    }

    fn is_selected(&self, index: usize) -> bool {
        self.selected == Some(index)
    }

    fn scroll_to_element(&mut self, index: usize) {
        self.popup.scroll_to_row(index);
    }

    fn coordinate_of(&self, index: usize) -> Point {
        self.popup.row_center(index, self.field.center().x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> ComboBox {
        ComboBox::new(
            "colors",
            Rect::new(0, 0, 80, 20),
            2,
            ["Red", "Green", "Blue", "Cyan"],
        )
    }

    #[test]
    fn test_field_click_toggles_popup() {
        let mut combo = colors();
        assert_eq!(combo.bounds(), Rect::new(0, 0, 80, 20));

        combo.on_click(Point::new(40, 10), MouseButton::Left, 1);
        assert!(combo.is_popup_visible());
        assert_eq!(combo.bounds(), Rect::new(0, 0, 80, 60));

        combo.on_click(Point::new(40, 10), MouseButton::Left, 1);
        assert!(!combo.is_popup_visible());
    }

    #[test]
    fn test_row_click_selects_and_closes() {
        let mut combo = colors();
        combo.show_popup();

        combo.on_click(Point::new(40, 50), MouseButton::Left, 1);

        assert_eq!(combo.selected_value(), Some("Green"));
        assert!(!combo.is_popup_visible());
    }

    #[test]
    fn test_rows_are_ignored_while_popup_hidden() {
        let mut combo = colors();
        combo.on_click(Point::new(40, 30), MouseButton::Left, 1);
        assert_eq!(combo.selected_index(), None);
    }

    #[test]
    fn test_popup_scrolls_to_hidden_row() {
        let mut combo = colors();
        combo.show_popup();

        combo.scroll_to_element(3);

        assert_eq!(combo.coordinate_of(3), Point::new(40, 50));
        assert_eq!(combo.scroll_count(), 1);
    }
}
