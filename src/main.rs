//! uirobot - smoke scenario against the headless toolkit
//!
//! # Overview
//!
//! This binary exercises the robot end to end and exits. It initializes:
//! - Logging infrastructure (file rotation + console output)
//! - Settings ([`SettingsManager`]: `uirobot Data/uirobot.yaml` plus `UIROBOT_*` variables)
//! - A headless toolkit with its own UI thread, driven by a [`Robot`]
//! - A tokio runtime that follows gesture events and runs an async wait
//!
//! # Execution Flow
//!
//! 1. Initialize logging → logs/uirobot.<date>
//! 2. Load settings
//! 3. Start the headless UI thread and place a list and a slider on it
//! 4. Select "Charlie" in a list showing two of five rows
//! 5. Slide to 40, then wait asynchronously for the value to read back
//! 6. Log the metrics summary and shut down

use anyhow::{Context, Result};
use std::time::Duration;
use uirobot::services::Timeout;
use uirobot::widgets::{ListBox, Slider};
use uirobot::{
    APP_NAME, CollectionDriver, GestureEvent, Rect, Robot, SettingsManager, SliderDriver, VERSION,
    WidgetAccess, value,
};

fn main() -> Result<()> {
    // The guard flushes the file appender when dropped at the end of main
    let _log_guard = uirobot::logging::setup_logging_with_console("logs", "uirobot", false, true)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let settings_manager = SettingsManager::new("uirobot Data")?;
    let settings = settings_manager.load()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("uirobot-worker")
        .build()?;

    let robot = Robot::headless(settings)?;

    // Follow gesture progress from the runtime
    let mut events = robot.tracker().subscribe();
    runtime.spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                GestureEvent::Aborted { step, reason } => {
                    tracing::warn!("Gesture aborted at step {}: {}", step, reason)
                }
                other => tracing::debug!("Gesture event: {:?}", other),
            }
        }
    });

    let list = robot.add_widget(|| {
        ListBox::new(
            "names",
            Rect::new(10, 10, 120, 40),
            20,
            ["Alpha", "Bravo", "Charlie", "Delta", "Echo"],
        )
    })?;
    let slider = robot.add_widget(|| Slider::new("volume", Rect::new(10, 80, 201, 20), 0, 100))?;

    let collections = CollectionDriver::new(&robot);
    collections.select_item(&list, value("Charlie"))?;
    collections.require_selection(&list, "Charlie")?;
    let scrolls = robot
        .executor()
        .query(move || list.with(|l| l.scroll_count()))?;
    tracing::info!("Selected Charlie after {} scroll(s)", scrolls);

    let sliders = SliderDriver::new(&robot);
    sliders.slide_to(&slider, 40)?;
    let condition = uirobot::Condition::value_reached(
        "Slider 'volume'",
        move || slider.with(Slider::value),
        40,
        0..=100,
    )?;
    runtime
        .block_on(robot.pause().await_until_async(&condition, Timeout::secs(2)))
        .context("Slider did not settle")?;
    tracing::info!("Slider settled at {}", sliders.value(&slider)?);

    robot.metrics().log_summary();

    runtime.shutdown_timeout(Duration::from_secs(5));

    tracing::info!("Smoke scenario complete");
    Ok(())
}
