use crate::models::{MouseButton, Point, Rect};
use crate::services::locator::ElementSource;
use crate::widgets::{Component, RowViewport};

/// Grid of optional cell values with vertical scrolling
///
/// As an [`ElementSource`] the cells are enumerated row by row, so element
/// `i` is the cell at row `i / columns`, column `i % columns`.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: usize,
    column_width: i32,
    cells: Vec<Vec<Option<String>>>,
    selected: Option<(usize, usize)>,
    viewport: RowViewport,
    enabled: bool,
}

impl Table {
    pub fn new(name: impl Into<String>, bounds: Rect, row_height: i32, columns: usize) -> Self {
        let columns = columns.max(1);
        Self {
            name: name.into(),
            columns,
            column_width: (bounds.size.width / columns as i32).max(1),
            cells: Vec::new(),
            selected: None,
            viewport: RowViewport::new(bounds, row_height),
            enabled: true,
        }
    }

    /// Append a row; missing trailing cells are empty, extra cells are ignored
    pub fn add_row<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<Option<String>> = values
            .into_iter()
            .take(self.columns)
            .map(|v| Some(v.into()))
            .collect();
        row.resize(self.columns, None);
        self.cells.push(row);
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: Option<String>) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value;
        }
    }

    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    pub fn selected_cell(&self) -> Option<(usize, usize)> {
        self.selected
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn scroll_count(&self) -> usize {
        self.viewport.scroll_count()
    }

    fn cell_of(&self, index: usize) -> (usize, usize) {
        (index / self.columns, index % self.columns)
    }

    fn cell_at(&self, at: Point) -> Option<(usize, usize)> {
        let row = self.viewport.row_at(at)?;
        let column = (self.viewport.bounds().to_local(at).x / self.column_width) as usize;
        (row < self.cells.len() && column < self.columns).then_some((row, column))
    }
}

impl Component for Table {
    fn kind(&self) -> &'static str {
        "Table"
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

    fn on_click(&mut self, at: Point, button: MouseButton, _count: u32) {
        if button == MouseButton::Left {
            if let Some(cell) = self.cell_at(at) {
                self.selected = Some(cell);
            }
        }
    }
}

impl ElementSource for Table {
    fn element_count(&self) -> usize {
        self.cells.len() * self.columns
    }

    fn value_at(&self, index: usize) -> Option<String> {
        let (row, column) = self.cell_of(index);
        self.cells.get(row)?.get(column)?.clone()
    }

    fn is_selected(&self, index: usize) -> bool {
        self.selected == Some(self.cell_of(index))
    }

    fn scroll_to_element(&mut self, index: usize) {
        let (row, _) = self.cell_of(index);
        self.viewport.scroll_to_row(row);
    }

    fn coordinate_of(&self, index: usize) -> Point {
        let (row, column) = self.cell_of(index);
        let x = self.viewport.bounds().origin.x
            + column as i32 * self.column_width
            + self.column_width / 2;
        self.viewport.row_center(row, x)
    }
}
