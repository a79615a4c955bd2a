use crate::error::{PreconditionFailure, Result};
use crate::models::MouseButton;
use crate::services::gestures::Gesture;
use crate::services::locator::{ElementMatch, ScrollPolicy, SharedMatcher};
use crate::ui::Robot;
use crate::ui::bridge::WidgetAccess;
use crate::ui::registry::Widget;
use crate::widgets::{ComboBox, Component};

/// Driver for [`ComboBox`] widgets
///
/// Selection goes through the popup list: show it, wait for the UI thread to
/// settle, click the row, and make sure the popup is closed again.
#[derive(Clone)]
pub struct ComboBoxDriver {
    robot: Robot,
}

impl ComboBoxDriver {
    pub fn new(robot: &Robot) -> Self {
        Self {
            robot: robot.clone(),
        }
    }

    pub fn selected_value(&self, combo: &Widget<ComboBox>) -> Result<Option<String>> {
        let handle = *combo;
        self.robot
            .executor()
            .query(move || handle.with(|c| c.selected_value().map(str::to_string)))
    }

    /// Select the first item accepted by `matcher`
    ///
    /// An item that is already selected generates no click. The popup is hidden
    /// afterwards whether or not the lookup succeeded.
    pub fn select_item(&self, combo: &Widget<ComboBox>, matcher: SharedMatcher) -> Result<()> {
        self.through_popup(combo, |robot| {
            robot
                .locator()
                .locate_or_fail(combo, matcher, ScrollPolicy::UnlessSelected)
        })
    }

    pub fn select_index(&self, combo: &Widget<ComboBox>, index: usize) -> Result<()> {
        self.through_popup(combo, |robot| {
            robot
                .locator()
                .locate_index(combo, index, ScrollPolicy::UnlessSelected)
        })
    }

    pub fn show_popup(&self, combo: &Widget<ComboBox>) -> Result<()> {
        let handle = *combo;
        self.robot
            .executor()
            .task(move || handle.with_mut(ComboBox::show_popup))
    }

    pub fn hide_popup(&self, combo: &Widget<ComboBox>) -> Result<()> {
        let handle = *combo;
        self.robot
            .executor()
            .task(move || handle.with_mut(ComboBox::hide_popup))
    }

    fn through_popup<F>(&self, combo: &Widget<ComboBox>, locate: F) -> Result<()>
    where
        F: FnOnce(&Robot) -> Result<ElementMatch>,
    {
        let handle = *combo;
        self.robot.executor().query(move || {
            handle.with(|c| -> Result<()> {
                if c.is_enabled() {
                    Ok(())
                } else {
                    Err(PreconditionFailure::NotEnabled(c.describe()).into())
                }
            })?
        })?;

        self.show_popup(combo)?;
        self.robot.wait_for_idle()?;
        let outcome = locate(&self.robot).and_then(|found| self.click_row(found));
        // A click on a row closes the popup itself; a miss leaves it open
        let hidden = self.hide_popup(combo);
        outcome.and(hidden)
    }

    fn click_row(&self, found: ElementMatch) -> Result<()> {
        match found.coordinate {
            Some(at) => self.robot.perform(&Gesture::click(at, MouseButton::Left, 1)),
            None => {
                tracing::debug!("Item {} already selected, no input generated", found.index);
                Ok(())
            }
        }
    }
}
