use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Mode, TimerState};

/// Every state change in the system produces an Event.
/// The controller broadcasts them; listeners re-render or log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// Countdown reached zero and flipped to the other mode.
    ModeSwitched {
        from: Mode,
        to: Mode,
        session_count: u32,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    SettingsUpdated {
        focus_time: u32,
        break_time: u32,
        audio_enabled: bool,
        at: DateTime<Utc>,
    },
    /// Full state snapshot, broadcast after every persisted change.
    StateSnapshot {
        state: TimerState,
        at: DateTime<Utc>,
    },
    BlockingRulesApplied {
        rule_count: usize,
        domain_count: usize,
        at: DateTime<Utc>,
    },
    PageBlocked {
        host: String,
        domain: String,
        at: DateTime<Utc>,
    },
}
