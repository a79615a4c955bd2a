use crate::models::{MouseButton, Point, Rect};
use crate::services::locator::ElementSource;
use crate::widgets::{Component, RowViewport};

/// Scrollable single-selection list of text items
#[derive(Debug, Clone)]
pub struct ListBox {
    name: String,
    items: Vec<String>,
    selected: Option<usize>,
    viewport: RowViewport,
    enabled: bool,
    showing: bool,
    type_ahead: String,
    activations: Vec<usize>,
    drops: Vec<Option<usize>>,
}

impl ListBox {
    pub fn new<I, S>(name: impl Into<String>, bounds: Rect, row_height: i32, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            items: items.into_iter().map(Into::into).collect(),
            selected: None,
            viewport: RowViewport::new(bounds, row_height),
            enabled: true,
            showing: true,
            type_ahead: String::new(),
            activations: Vec::new(),
            drops: Vec::new(),
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn push(&mut self, item: impl Into<String>) {
        self.items.push(item.into());
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

    pub fn set_showing(&mut self, showing: bool) {
        self.showing = showing;
    }

    pub fn viewport(&self) -> &RowViewport {
        &self.viewport
    }

    /// Times the list content actually scrolled
    pub fn scroll_count(&self) -> usize {
        self.viewport.scroll_count()
    }

    /// Items activated by a double click, in order
    pub fn activations(&self) -> &[usize] {
        &self.activations
    }

    /// Row under each drop received, `None` for drops below the last item
    pub fn drops(&self) -> &[Option<usize>] {
        &self.drops
    }

    fn item_at(&self, at: Point) -> Option<usize> {
        self.viewport.row_at(at).filter(|&row| row < self.items.len())
    }
}

impl Component for ListBox {
    fn kind(&self) -> &'static str {
        "ListBox"
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn bounds(&self) -> Rect {
        self.viewport.bounds()
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_showing(&self) -> bool {
        self.showing
    }

    fn on_click(&mut self, at: Point, button: MouseButton, count: u32) {
        if button != MouseButton::Left {
            return;
        }
        if let Some(row) = self.item_at(at) {
            self.selected = Some(row);
            self.type_ahead.clear();
            if count >= 2 {
                self.activations.push(row);
            }
        }
    }

    fn on_drop(&mut self, at: Point) {
        let row = self.item_at(at);
        tracing::debug!("ListBox '{}' received drop at {} (row {:?})", self.name, at, row);
        self.drops.push(row);
    }

    /// Type-ahead: select the first item starting with the typed prefix
    fn on_key(&mut self, ch: char) {
        self.type_ahead.push(ch);
        let prefix = self.type_ahead.to_lowercase();
        if let Some(row) = self
            .items
            .iter()
            .position(|item| item.to_lowercase().starts_with(&prefix))
        {
            self.selected = Some(row);
            self.viewport.scroll_to_row(row);
        }
    }
}

impl ElementSource for ListBox {
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
        self.viewport.scroll_to_row(index);
    }

    fn coordinate_of(&self, index: usize) -> Point {
        self.viewport
            .row_center(index, self.viewport.bounds().center().x)
    }
}
