use crate::error::{PreconditionFailure, Result, RobotError};
use crate::models::{MouseButton, Point};
use crate::services::format::{format_contents, quote};
use crate::services::gestures::Gesture;
use crate::services::locator::{ElementMatch, ElementSource, ScrollPolicy, SharedMatcher};
use crate::services::pause::{Condition, Timeout};
use crate::ui::Robot;
use crate::ui::bridge::WidgetAccess;
use crate::widgets::Component;

/// Driver for any collection-like widget: list, table, tree, menu
///
/// Every operation is generic over the widget handle, so the same driver works
/// for headless widgets and toolkit handles alike.
#[derive(Clone)]
pub struct CollectionDriver {
    robot: Robot,
}

impl CollectionDriver {
    pub fn new(robot: &Robot) -> Self {
        Self {
            robot: robot.clone(),
        }
    }

    /// Select the first element accepted by `matcher`
    ///
    /// An element that is already selected is left alone: no input is generated.
    pub fn select_item<W>(&self, widget: &W, matcher: SharedMatcher) -> Result<()>
    where
        W: WidgetAccess,
        W::Target: ElementSource,
    {
        let found = self
            .robot
            .locator()
            .locate_or_fail(widget, matcher, ScrollPolicy::UnlessSelected)?;
        self.click_found(found, MouseButton::Left, 1)
    }

    pub fn select_index<W>(&self, widget: &W, index: usize) -> Result<()>
    where
        W: WidgetAccess,
        W::Target: ElementSource,
    {
        let found = self
            .robot
            .locator()
            .locate_index(widget, index, ScrollPolicy::UnlessSelected)?;
        self.click_found(found, MouseButton::Left, 1)
    }

    /// Click the first element accepted by `matcher`, selected or not
    pub fn click_item<W>(
        &self,
        widget: &W,
        matcher: SharedMatcher,
        button: MouseButton,
        times: u32,
    ) -> Result<()>
    where
        W: WidgetAccess,
        W::Target: ElementSource,
    {
        let found = self
            .robot
            .locator()
            .locate_or_fail(widget, matcher, ScrollPolicy::Always)?;
        self.click_found(found, button, times)
    }

    /// Drag the element `item` of `source` onto the element `onto` of `target`
    pub fn drag_and_drop<S, T>(
        &self,
        source: &S,
        item: SharedMatcher,
        target: &T,
        onto: SharedMatcher,
    ) -> Result<()>
    where
        S: WidgetAccess,
        S::Target: ElementSource,
        T: WidgetAccess,
        T::Target: ElementSource,
    {
        let locator = self.robot.locator();
        let dragged = locator.locate_or_fail(source, item, ScrollPolicy::Always)?;
        let drop_at = pointer_target(&locator.locate_or_fail(target, onto, ScrollPolicy::Always)?)?;
        // Locating the target may have scrolled the source: measure it again
        let remeasured = locator.locate_index(source, dragged.index, ScrollPolicy::Always)?;
        let drag_from = pointer_target(&remeasured)?;
        let source_bounds = self.read(source, |w| w.bounds())?;

        let gesture =
            Gesture::drag_and_drop(drag_from, source_bounds, drop_at, self.robot.settings());
        self.robot.perform(&gesture)
    }

    /// Index of the first element accepted by `matcher`; nothing is scrolled
    pub fn index_of<W>(&self, widget: &W, matcher: SharedMatcher) -> Result<usize>
    where
        W: WidgetAccess,
        W::Target: ElementSource,
    {
        self.robot.locator().index_of(widget, matcher)
    }

    pub fn contents<W>(&self, widget: &W) -> Result<Vec<Option<String>>>
    where
        W: WidgetAccess,
        W::Target: ElementSource,
    {
        self.robot.locator().contents(widget)
    }

    /// Text of every selected element, in index order
    pub fn selection<W>(&self, widget: &W) -> Result<Vec<Option<String>>>
    where
        W: WidgetAccess,
        W::Target: ElementSource,
    {
        self.read(widget, |w| {
            (0..w.element_count())
                .filter(|&i| w.is_selected(i))
                .map(|i| w.value_at(i))
                .collect()
        })
    }

    /// Fail with an assertion unless an element reading `expected` is selected
    pub fn require_selection<W>(&self, widget: &W, expected: &str) -> Result<()>
    where
        W: WidgetAccess,
        W::Target: ElementSource,
    {
        let (description, selection) = self.read(widget, |w| {
            let selection: Vec<Option<String>> = (0..w.element_count())
                .filter(|&i| w.is_selected(i))
                .map(|i| w.value_at(i))
                .collect();
            (w.describe(), selection)
        })?;
        if selection.iter().flatten().any(|v| v == expected) {
            return Ok(());
        }
        Err(RobotError::Assertion(format!(
            "Expected selection of {} to contain {} but was {}",
            description,
            quote(expected),
            format_contents(&selection)
        )))
    }

    pub fn require_item_count<W>(&self, widget: &W, expected: usize) -> Result<()>
    where
        W: WidgetAccess,
        W::Target: ElementSource,
    {
        let (description, count) = self.read(widget, |w| (w.describe(), w.element_count()))?;
        if count == expected {
            Ok(())
        } else {
            Err(RobotError::Assertion(format!(
                "Expected {description} to have {expected} items but had {count}"
            )))
        }
    }

    /// Wait until some element is accepted by `matcher`
    pub fn wait_for_item<W>(
        &self,
        widget: &W,
        matcher: SharedMatcher,
        timeout: impl Into<Timeout>,
    ) -> Result<()>
    where
        W: WidgetAccess,
        W::Target: ElementSource,
    {
        let handle = widget.clone();
        let description = format!("an item matching the {}", matcher.description());
        let condition = Condition::new(description, move || {
            handle.with(|w| {
                (0..w.element_count()).any(|i| matcher.is_matching(w.value_at(i).as_deref()))
            })
        });
        self.robot.pause().await_until(&condition, timeout)
    }

    fn click_found(&self, found: ElementMatch, button: MouseButton, times: u32) -> Result<()> {
        match found.coordinate {
            Some(at) => self.robot.perform(&Gesture::click(at, button, times)),
            None => {
                tracing::debug!("Element {} already selected, no input generated", found.index);
                Ok(())
            }
        }
    }

    fn read<W, R, F>(&self, widget: &W, f: F) -> Result<R>
    where
        W: WidgetAccess,
        R: Send + 'static,
        F: FnOnce(&W::Target) -> R + Send + 'static,
    {
        let handle = widget.clone();
        self.robot.executor().query(move || handle.with(f))
    }
}

fn pointer_target(found: &ElementMatch) -> Result<Point> {
    found.coordinate.ok_or_else(|| {
        PreconditionFailure::InvalidArgument(format!(
            "element {} has no pointer location",
            found.index
        ))
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::models::{Rect, RobotSettings};
    use crate::services::locator::{pattern, value};
    use crate::widgets::{ListBox, Menu};

    fn robot() -> Robot {
        Robot::headless(RobotSettings {
            delay_between_events: 0,
            ..RobotSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_select_scrolls_and_clicks() {
        let robot = robot();
        let driver = CollectionDriver::new(&robot);
        let list = robot
            .add_widget(|| {
                ListBox::new("names", Rect::new(0, 0, 100, 40), 20, ["A", "B", "C", "D"])
            })
            .unwrap();

        driver.select_item(&list, value("D")).unwrap();

        driver.require_selection(&list, "D").unwrap();
        assert_eq!(driver.selection(&list).unwrap(), vec![Some("D".to_string())]);
    }

    #[test]
    fn test_reselecting_generates_no_input() {
        let robot = robot();
        let driver = CollectionDriver::new(&robot);
        let list = robot
            .add_widget(|| ListBox::new("names", Rect::new(0, 0, 100, 40), 20, ["A", "B"]))
            .unwrap();

        driver.select_index(&list, 1).unwrap();
        let steps = robot.metrics().gesture_steps.load(std::sync::atomic::Ordering::Relaxed);
        driver.select_item(&list, value("B")).unwrap();

        assert_eq!(
            robot.metrics().gesture_steps.load(std::sync::atomic::Ordering::Relaxed),
            steps
        );
    }

    #[test]
    fn test_index_out_of_bounds() {
        let robot = robot();
        let driver = CollectionDriver::new(&robot);
        let list = robot
            .add_widget(|| ListBox::new("names", Rect::new(0, 0, 100, 40), 20, ["A", "B"]))
            .unwrap();

        let err = driver.select_index(&list, 5).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Precondition failed: Index 5 should be between 0 and 1 (inclusive)"
        );
    }

    #[test]
    fn test_failed_requirements_are_assertions() {
        let robot = robot();
        let driver = CollectionDriver::new(&robot);
        let list = robot
            .add_widget(|| ListBox::new("names", Rect::new(0, 0, 100, 40), 20, ["A", "B"]))
            .unwrap();

        let err = driver.require_selection(&list, "A").unwrap_err();
        assert_eq!(err.kind(), FailureKind::Assertion);
        assert!(err.to_string().contains("ListBox 'names'"));

        driver.require_item_count(&list, 2).unwrap();
        assert_eq!(driver.require_item_count(&list, 3).unwrap_err().kind(), FailureKind::Assertion);
    }

    #[test]
    fn test_closed_menu_is_not_showing() {
        let robot = robot();
        let driver = CollectionDriver::new(&robot);
        let menu = robot
            .add_widget(|| Menu::new("file", Point::new(0, 0), 80, 20, ["New", "Quit"]))
            .unwrap();

        let err = driver
            .click_item(&menu, value("Quit"), MouseButton::Left, 1)
            .unwrap_err();
        assert!(matches!(
            err,
            RobotError::Precondition(PreconditionFailure::NotShowing(_))
        ));

        robot.executor().task(move || menu.with_mut(|m| m.open())).unwrap();
        driver
            .click_item(&menu, pattern("Q.*").unwrap(), MouseButton::Left, 1)
            .unwrap();
        let activated = robot
            .executor()
            .query(move || menu.with(|m| m.activated().to_vec()))
            .unwrap();
        assert_eq!(activated, vec!["Quit".to_string()]);
    }

    #[test]
    fn test_drag_between_lists() {
        let robot = robot();
        let driver = CollectionDriver::new(&robot);
        let source = robot
            .add_widget(|| ListBox::new("source", Rect::new(0, 0, 100, 100), 20, ["one", "two"]))
            .unwrap();
        let target = robot
            .add_widget(|| ListBox::new("target", Rect::new(200, 0, 100, 100), 20, ["x", "y", "z"]))
            .unwrap();

        driver
            .drag_and_drop(&source, value("two"), &target, value("z"))
            .unwrap();

        let drops = robot
            .executor()
            .query(move || target.with(|t| t.drops().to_vec()))
            .unwrap();
        assert_eq!(drops, vec![Some(2)]);
    }
}
