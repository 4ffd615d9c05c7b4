use std::time::Duration;

use crate::editing::drag::DEFAULT_DRAG_THRESHOLD_PX;
use crate::editing::history::DEFAULT_HISTORY_CAPACITY;
use crate::editing::menu::MenuMode;
use crate::persistence::debounce::{DEFAULT_MAX_WAIT, DEFAULT_QUIET_PERIOD};
use crate::persistence::retry::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY, RetryPolicy};
use crate::persistence::status::DEFAULT_SAVED_DISPLAY;

/// Tuning knobs of an editor session
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub quiet_period: Duration,
    pub max_wait: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub saved_display: Duration,
    pub drag_threshold_px: f64,
    pub history_capacity: usize,
    pub menu_mode: MenuMode,
}

impl EditorConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_base_delay)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            max_wait: DEFAULT_MAX_WAIT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            saved_display: DEFAULT_SAVED_DISPLAY,
            drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            menu_mode: MenuMode::Fixed,
        }
    }
}
