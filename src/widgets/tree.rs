use crate::models::{MouseButton, Point, Rect};
use crate::services::locator::ElementSource;
use crate::widgets::{Component, RowViewport};

/// Separator between labels of a tree path
pub const PATH_SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
    pub expanded: bool,
}

impl TreeNode {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
            expanded: false,
        }
    }

    pub fn branch(label: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            label: label.into(),
            children,
            expanded: false,
        }
    }

    pub fn expanded(mut self) -> Self {
        self.expanded = true;
        self
    }
}

/// A visible row: the child-index route from the roots, plus its path text
#[derive(Debug, Clone)]
struct VisibleRow {
    route: Vec<usize>,
    path: String,
}

/// Tree whose elements are the visible rows, read as slash-separated paths
///
/// A node's children are visible only while every ancestor is expanded.
/// Double-clicking a row toggles its expansion.
#[derive(Debug, Clone)]
pub struct TreeView {
    name: String,
    roots: Vec<TreeNode>,
    rows: Vec<VisibleRow>,
    selected: Option<Vec<usize>>,
    viewport: RowViewport,
    indent: i32,
}

impl TreeView {
    pub fn new(
        name: impl Into<String>,
        bounds: Rect,
        row_height: i32,
        roots: Vec<TreeNode>,
    ) -> Self {
        let mut tree = Self {
            name: name.into(),
            roots,
            rows: Vec::new(),
            selected: None,
            viewport: RowViewport::new(bounds, row_height),
            indent: 16,
        };
        tree.rebuild_rows();
        tree
    }

    /// Path of the selected node, e.g. `"root/docs/readme"`
    pub fn selected_path(&self) -> Option<String> {
        let route = self.selected.as_ref()?;
        self.rows.iter().find(|r| &r.route == route).map(|r| r.path.clone())
    }

    /// Expand every node along `path`; returns whether the whole path exists
    pub fn expand_path(&mut self, path: &str) -> bool {
        let mut nodes = &mut self.roots;
        let mut found = true;
        for label in path.split(PATH_SEPARATOR) {
            match nodes.iter_mut().find(|n| n.label == label) {
                Some(node) => {
                    node.expanded = true;
                    nodes = &mut node.children;
                }
                None => {
                    found = false;
                    break;
                }
            }
        }
        self.rebuild_rows();
        found
    }

    pub fn scroll_count(&self) -> usize {
        self.viewport.scroll_count()
    }

    fn rebuild_rows(&mut self) {
        fn walk(
            nodes: &[TreeNode],
            prefix: &str,
            route: &mut Vec<usize>,
            rows: &mut Vec<VisibleRow>,
        ) {
            for (i, node) in nodes.iter().enumerate() {
                route.push(i);
                let path = if prefix.is_empty() {
                    node.label.clone()
                } else {
                    format!("{prefix}{PATH_SEPARATOR}{}", node.label)
                };
                rows.push(VisibleRow {
                    route: route.clone(),
                    path: path.clone(),
                });
                if node.expanded {
                    walk(&node.children, &path, route, rows);
                }
                route.pop();
            }
        }

        let mut rows = Vec::new();
        walk(&self.roots, "", &mut Vec::new(), &mut rows);
        self.rows = rows;
    }

    fn node_mut(&mut self, route: &[usize]) -> Option<&mut TreeNode> {
        let (first, rest) = route.split_first()?;
        let mut node = self.roots.get_mut(*first)?;
        for &i in rest {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }

    fn row_at(&self, at: Point) -> Option<usize> {
        self.viewport.row_at(at).filter(|&row| row < self.rows.len())
    }
}

impl Component for TreeView {
    fn kind(&self) -> &'static str {
        "TreeView"
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn bounds(&self) -> Rect {
        self.viewport.bounds()
    }

    fn on_click(&mut self, at: Point, button: MouseButton, count: u32) {
        if button != MouseButton::Left {
            return;
        }
        let Some(row) = self.row_at(at) else {
            return;
        };
        let route = self.rows[row].route.clone();
        if count >= 2 {
            if let Some(node) = self.node_mut(&route) {
                node.expanded = !node.expanded;
            }
            self.rebuild_rows();
        }
        self.selected = Some(route);
    }
}

impl ElementSource for TreeView {
    fn element_count(&self) -> usize {
        self.rows.len()
    }

    fn value_at(&self, index: usize) -> Option<String> {
        self.rows.get(index).map(|r| r.path.clone())
    }

    fn is_selected(&self, index: usize) -> bool {
        match (self.rows.get(index), &self.selected) {
            (Some(row), Some(route)) => &row.route == route,
            _ => false,
        }
    }

    fn scroll_to_element(&mut self, index: usize) {
        self.viewport.scroll_to_row(index);
    }

    /// Just right of the expansion handle, at the start of the label
    fn coordinate_of(&self, index: usize) -> Point {
        let depth = self
            .rows
            .get(index)
            .map_or(0, |r| r.route.len().saturating_sub(1)) as i32;
        let x = self.viewport.bounds().origin.x + (depth + 1) * self.indent + 4;
        self.viewport.row_center(index, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> TreeView {
        TreeView::new(
            "project",
            Rect::new(0, 0, 200, 60),
            20,
            vec![TreeNode::branch(
                "root",
                vec![
                    TreeNode::branch("docs", vec![TreeNode::leaf("readme")]),
                    TreeNode::leaf("src"),
                ],
            )
            .expanded()],
        )
    }

    #[test]
    fn test_visible_rows_are_paths() {
        let tree = project();
        assert_eq!(
            tree.contents(),
            vec![
                Some("root".to_string()),
                Some("root/docs".to_string()),
                Some("root/src".to_string()),
            ]
        );
    }

    #[test]
    fn test_expand_path_reveals_children() {
        let mut tree = project();
        assert!(tree.expand_path("root/docs"));

        assert_eq!(tree.value_at(2), Some("root/docs/readme".to_string()));
        assert!(!tree.expand_path("root/missing"));
    }

    #[test]
    fn test_double_click_toggles_and_selects() {
        let mut tree = project();
        let at = tree.coordinate_of(1);
        tree.on_click(at, MouseButton::Left, 2);

        assert_eq!(tree.element_count(), 4);
        assert_eq!(tree.selected_path().as_deref(), Some("root/docs"));
        assert!(tree.is_selected(1));
    }

    #[test]
    fn test_deeper_rows_are_indented() {
        let tree = project();
        assert!(tree.coordinate_of(1).x > tree.coordinate_of(0).x);
    }
}
