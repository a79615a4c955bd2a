use crate::models::{Point, Rect};

/// Vertical scrolling geometry shared by row-based widgets
///
/// Rows have a fixed height; `first_visible` is the scroll offset in rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowViewport {
    bounds: Rect,
    row_height: i32,
    first_visible: usize,
    scrolls: usize,
}

impl RowViewport {
    pub fn new(bounds: Rect, row_height: i32) -> Self {
        Self {
            bounds,
            row_height: row_height.max(1),
            first_visible: 0,
            scrolls: 0,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn row_height(&self) -> i32 {
        self.row_height
    }

    pub fn first_visible(&self) -> usize {
        self.first_visible
    }

    /// Number of rows that fit in the viewport (at least one)
    pub fn visible_rows(&self) -> usize {
        (self.bounds.size.height / self.row_height).max(1) as usize
    }

    pub fn is_row_visible(&self, row: usize) -> bool {
        row >= self.first_visible && row < self.first_visible + self.visible_rows()
    }

    /// Times the content actually moved
    pub fn scroll_count(&self) -> usize {
        self.scrolls
    }

    /// Scroll the minimum amount needed to make `row` fully visible
    pub fn scroll_to_row(&mut self, row: usize) {
        let target = if row < self.first_visible {
            row
        } else if row >= self.first_visible + self.visible_rows() {
            row + 1 - self.visible_rows()
        } else {
            return;
        };
        tracing::trace!("Viewport scroll {} -> {}", self.first_visible, target);
        self.first_visible = target;
        self.scrolls += 1;
    }

    /// Top edge of `row` on screen, which may lie outside the viewport
    pub fn row_top(&self, row: usize) -> i32 {
        let offset = row as i64 - self.first_visible as i64;
        self.bounds.origin.y + (offset * i64::from(self.row_height)) as i32
    }

    /// Center of `row`, horizontally at `x`
    pub fn row_center(&self, row: usize, x: i32) -> Point {
        Point::new(x, self.row_top(row) + self.row_height / 2)
    }

    /// Row under a screen point, if the point is inside the viewport
    pub fn row_at(&self, at: Point) -> Option<usize> {
        if !self.bounds.contains(at) {
            return None;
        }
        let offset = (at.y - self.bounds.origin.y) / self.row_height;
        Some(self.first_visible + offset as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scroll_down_and_up() {
        let mut viewport = RowViewport::new(Rect::new(0, 0, 100, 40), 20);
        assert_eq!(viewport.visible_rows(), 2);

        viewport.scroll_to_row(4);
        assert_eq!(viewport.first_visible(), 3);
        viewport.scroll_to_row(1);
        assert_eq!(viewport.first_visible(), 1);
        assert_eq!(viewport.scroll_count(), 2);
    }

    #[test]
    fn test_scrolling_to_visible_row_is_a_no_op() {
        let mut viewport = RowViewport::new(Rect::new(0, 0, 100, 60), 20);
        viewport.scroll_to_row(2);
        assert_eq!(viewport.scroll_count(), 0);
        assert_eq!(viewport.first_visible(), 0);
    }

    #[test]
    fn test_row_at_matches_row_center() {
        let mut viewport = RowViewport::new(Rect::new(10, 100, 100, 60), 20);
        viewport.scroll_to_row(7);
        let center = viewport.row_center(7, 50);
        assert_eq!(viewport.row_at(center), Some(7));
    }

    proptest! {
        #[test]
        fn prop_scrolled_row_is_visible_and_hit_testable(
            rows in 1usize..200,
            height in 1i32..400,
            row_height in 1i32..40,
            start in 0usize..200,
            target in 0usize..200,
        ) {
            let mut viewport = RowViewport::new(Rect::new(0, 0, 100, height), row_height);
            viewport.scroll_to_row(start % rows);
            let target = target % rows;
            viewport.scroll_to_row(target);

            prop_assert!(viewport.is_row_visible(target));
            let center = viewport.row_center(target, 50);
            if viewport.bounds().contains(center) {
                prop_assert_eq!(viewport.row_at(center), Some(target));
            }
        }
    }
}
