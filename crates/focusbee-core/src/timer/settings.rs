use serde::{Deserialize, Serialize};

use super::engine::Mode;
use crate::storage::TimerConfig;

pub const FOCUS_RANGE: std::ops::RangeInclusive<u32> = 1..=60;
pub const BREAK_RANGE: std::ops::RangeInclusive<u32> = 1..=30;

/// User timer settings. Durations are in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    #[serde(default = "default_focus_time")]
    pub focus_time: u32,
    #[serde(default = "default_break_time")]
    pub break_time: u32,
    #[serde(default = "default_audio_enabled")]
    pub audio_enabled: bool,
}

fn default_focus_time() -> u32 {
    25
}
fn default_break_time() -> u32 {
    5
}
fn default_audio_enabled() -> bool {
    true
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_time: default_focus_time(),
            break_time: default_break_time(),
            audio_enabled: default_audio_enabled(),
        }
    }
}

impl From<&TimerConfig> for TimerSettings {
    fn from(cfg: &TimerConfig) -> Self {
        Self {
            focus_time: cfg.focus_min,
            break_time: cfg.break_min,
            audio_enabled: cfg.audio_enabled,
        }
        .clamped()
    }
}

impl TimerSettings {
    /// Pull both durations into the ranges the timer accepts.
    pub fn clamped(self) -> Self {
        Self {
            focus_time: self.focus_time.clamp(*FOCUS_RANGE.start(), *FOCUS_RANGE.end()),
            break_time: self.break_time.clamp(*BREAK_RANGE.start(), *BREAK_RANGE.end()),
            audio_enabled: self.audio_enabled,
        }
    }

    pub fn duration_secs(&self, mode: Mode) -> u32 {
        let minutes = match mode {
            Mode::Focus => self.focus_time,
            Mode::Break => self.break_time,
        };
        minutes.saturating_mul(60)
    }
}
