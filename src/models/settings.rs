use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Windowing platform, which decides drag thresholds and minimum delays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    MacOs,
    X11,
}

impl Platform {
    /// Platform of the running process
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::X11
        }
    }

    /// Pixels the pointer has to travel before a drag is recognised
    pub fn default_drag_threshold(self) -> u32 {
        match self {
            Platform::Windows | Platform::MacOs => 10,
            Platform::X11 => 16,
        }
    }

    fn min_drag_delay_ms(self) -> u64 {
        match self {
            Platform::X11 | Platform::MacOs => 100,
            Platform::Windows => 0,
        }
    }

    fn min_drop_delay_ms(self) -> u64 {
        match self {
            Platform::Windows => 200,
            Platform::X11 | Platform::MacOs => 0,
        }
    }
}

/// Timing configuration for the robot, stored as `uirobot.yaml`
///
/// All durations are in milliseconds. Out-of-range values are clamped by the
/// accessor methods, never rejected, so a hand-edited file cannot stop a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotSettings {
    /// Pause between two generated input events
    #[serde(default = "default_delay_between_events")]
    pub delay_between_events: u64,

    /// Pause between pressing a button and moving the pointer at drag start
    #[serde(default)]
    pub drag_delay: u64,

    /// Pause between the last drag-over move and releasing the button
    #[serde(default)]
    pub drop_delay: u64,

    /// Expected latency between posting an event and the toolkit seeing it
    #[serde(default = "default_event_posting_delay")]
    pub event_posting_delay: u64,

    /// Upper bound for an idle barrier
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,

    /// Upper bound for a single UI-thread round trip; 0 blocks without limit
    #[serde(default = "default_ui_response_timeout")]
    pub ui_response_timeout: u64,

    /// Sleep between two evaluations of a polled condition
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Timeout used by waits that do not specify one
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout: u64,

    /// Overrides the platform drag threshold (pixels)
    #[serde(default)]
    pub drag_threshold: Option<u32>,

    /// Overrides platform detection
    #[serde(default)]
    pub platform: Option<Platform>,
}

impl Default for RobotSettings {
    fn default() -> Self {
        Self {
            delay_between_events: default_delay_between_events(),
            drag_delay: 0,
            drop_delay: 0,
            event_posting_delay: default_event_posting_delay(),
            idle_timeout: default_idle_timeout(),
            ui_response_timeout: default_ui_response_timeout(),
            poll_interval: default_poll_interval(),
            wait_timeout: default_wait_timeout(),
            drag_threshold: None,
            platform: None,
        }
    }
}

fn default_delay_between_events() -> u64 {
    60
}

fn default_event_posting_delay() -> u64 {
    100
}

fn default_idle_timeout() -> u64 {
    10_000
}

fn default_ui_response_timeout() -> u64 {
    30_000
}

fn default_poll_interval() -> u64 {
    10
}

fn default_wait_timeout() -> u64 {
    30_000
}

const MAX_DELAY_MS: u64 = 60_000;

impl RobotSettings {
    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::current)
    }

    pub fn drag_threshold(&self) -> i32 {
        let threshold = self
            .drag_threshold
            .unwrap_or_else(|| self.platform().default_drag_threshold());
        threshold.max(1) as i32
    }

    pub fn delay_between_events(&self) -> Duration {
        Duration::from_millis(self.delay_between_events.min(MAX_DELAY_MS))
    }

    pub fn drag_delay(&self) -> Duration {
        let min = self.platform().min_drag_delay_ms();
        Duration::from_millis(self.drag_delay.clamp(min, MAX_DELAY_MS))
    }

    pub fn drop_delay(&self) -> Duration {
        let min = self.platform().min_drop_delay_ms();
        Duration::from_millis(self.drop_delay.clamp(min, MAX_DELAY_MS))
    }

    pub fn event_posting_delay(&self) -> Duration {
        Duration::from_millis(self.event_posting_delay.min(1_000))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout.max(1))
    }

    /// `None` means callers block until the UI thread answers
    pub fn ui_response_timeout(&self) -> Option<Duration> {
        match self.ui_response_timeout {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval.max(1))
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout)
    }

    /// How long a drop waits for the toolkit to report a drag in effect
    pub fn drag_detection_timeout(&self) -> Duration {
        self.event_posting_delay() * 4
    }
}
