use crate::error::{PreconditionFailure, Result};
use crate::models::MouseButton;
use crate::services::gestures::Gesture;
use crate::services::pause::{Condition, Timeout};
use crate::ui::Robot;
use crate::ui::bridge::WidgetAccess;
use crate::ui::registry::Widget;
use crate::widgets::{Component, Slider};

/// Driver for [`Slider`] widgets
#[derive(Clone)]
pub struct SliderDriver {
    robot: Robot,
}

impl SliderDriver {
    pub fn new(robot: &Robot) -> Self {
        Self {
            robot: robot.clone(),
        }
    }

    pub fn value(&self, slider: &Widget<Slider>) -> Result<i32> {
        let slider = *slider;
        self.robot.executor().query(move || slider.with(Slider::value))
    }

    /// Drag the thumb to `value`
    ///
    /// Fails before any input when `value` lies outside the slider's range or
    /// the slider is disabled.
    pub fn slide_to(&self, slider: &Widget<Slider>, value: i32) -> Result<()> {
        let handle = *slider;
        let (from, to) = self.robot.executor().query(move || {
            handle.with(|s| -> Result<_> {
                if !s.is_enabled() {
                    return Err(PreconditionFailure::NotEnabled(s.describe()).into());
                }
                check_bounds(s, value)?;
                Ok((s.point_for(s.value()), s.point_for(value)))
            })?
        })?;
        self.robot
            .perform(&Gesture::press_and_move(from, to, MouseButton::Left))
    }

    /// Wait until the slider reads `target`
    ///
    /// A target outside the slider's range is a precondition failure, raised
    /// before waiting starts.
    pub fn wait_for_value(
        &self,
        slider: &Widget<Slider>,
        target: i32,
        timeout: impl Into<Timeout>,
    ) -> Result<()> {
        let handle = *slider;
        let (description, min, max) = self
            .robot
            .executor()
            .query(move || handle.with(|s| (s.describe(), s.min(), s.max())))?;
        let condition = Condition::value_reached(
            description,
            move || handle.with(Slider::value),
            target,
            min..=max,
        )?;
        self.robot.pause().await_until(&condition, timeout)
    }
}

fn check_bounds(slider: &Slider, value: i32) -> Result<()> {
    if (slider.min()..=slider.max()).contains(&value) {
        Ok(())
    } else {
        Err(PreconditionFailure::ValueOutOfBounds {
            value: value.to_string(),
            min: slider.min().to_string(),
            max: slider.max().to_string(),
        }
        .into())
    }
}
