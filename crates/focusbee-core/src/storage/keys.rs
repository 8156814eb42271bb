//! Storage keys shared by every context.

pub const TIMER_STATE: &str = "timerState";
pub const TIMER_SETTINGS: &str = "timerSettings";
pub const BLOCKED_URLS: &str = "blockedUrls";
pub const IS_BLOCKING: &str = "isBlocking";
pub const AMBIENT_SETTINGS: &str = "ambientSettings";
pub const TASKS: &str = "tasks";
pub const DYNAMIC_RULES: &str = "dynamicRules";

/// True when a change to `key` must re-sync the installed redirect rules.
pub fn affects_blocking(key: &str) -> bool {
    key == BLOCKED_URLS || key == IS_BLOCKING
}
