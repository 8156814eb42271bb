//! Timer engine implementation.
//!
//! The engine is a deterministic one-second countdown. It does not use
//! internal threads - the caller is responsible for calling `tick()` once
//! per second while the timer is active.
//!
//! ## State Transitions
//!
//! ```text
//! Focus --(countdown hits 0, session += 1)--> Break
//! Break --(countdown hits 0)--------------> Focus
//! ```
//!
//! Both transitions keep the timer active (auto-restart).
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerSettings::default());
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event::ModeSwitched) at zero
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::settings::TimerSettings;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Focus,
    Break,
}

impl Mode {
    pub fn other(self) -> Self {
        match self {
            Mode::Focus => Mode::Break,
            Mode::Break => Mode::Focus,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Focus => "focus",
            Mode::Break => "break",
        }
    }
}

/// Persisted timer state. Field names match the stored blob.
///
/// Invariant: `current_time <= initial_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub is_active: bool,
    pub is_break: bool,
    /// Remaining seconds in the current mode.
    pub current_time: u32,
    /// Full length of the current mode in seconds.
    pub initial_time: u32,
    pub session_count: u32,
}

impl TimerState {
    /// Idle focus state sized from `settings`.
    pub fn fresh(settings: &TimerSettings) -> Self {
        let secs = settings.duration_secs(Mode::Focus);
        Self {
            is_active: false,
            is_break: false,
            current_time: secs,
            initial_time: secs,
            session_count: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        if self.is_break {
            Mode::Break
        } else {
            Mode::Focus
        }
    }
}

/// Core timer engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    state: TimerState,
    settings: TimerSettings,
}

impl TimerEngine {
    /// Create an idle engine in focus mode.
    pub fn new(settings: TimerSettings) -> Self {
        let settings = settings.clamped();
        Self {
            state: TimerState::fresh(&settings),
            settings,
        }
    }

    /// Rebuild an engine from persisted parts, repairing a state that
    /// violates the countdown invariant.
    pub fn restore(state: TimerState, settings: TimerSettings) -> Self {
        let mut state = state;
        if state.current_time > state.initial_time {
            tracing::debug!(
                current = state.current_time,
                initial = state.initial_time,
                "clamping restored countdown"
            );
            state.current_time = state.initial_time;
        }
        Self {
            state,
            settings: settings.clamped(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn settings(&self) -> TimerSettings {
        self.settings
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state.is_active {
            return None;
        }
        self.state.is_active = true;
        Some(Event::TimerStarted {
            mode: self.mode(),
            remaining_secs: self.state.current_time,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_active {
            return None;
        }
        self.state.is_active = false;
        Some(Event::TimerPaused {
            remaining_secs: self.state.current_time,
            at: Utc::now(),
        })
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.state = TimerState::fresh(&self.settings);
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Advance one second. Returns `Some(Event::ModeSwitched)` when the
    /// countdown reaches zero. A countdown already at zero switches on the
    /// next tick without going negative.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.is_active {
            return None;
        }
        let remaining = self.state.current_time.saturating_sub(1);
        if remaining > 0 {
            self.state.current_time = remaining;
            return None;
        }
        Some(self.switch_mode())
    }

    /// Store new settings. When the duration of the mode on screen changed,
    /// the countdown snaps to the new length.
    pub fn update_settings(&mut self, settings: TimerSettings) -> Option<Event> {
        let settings = settings.clamped();
        let mode = self.mode();
        let changed = settings.duration_secs(mode) != self.settings.duration_secs(mode);
        self.settings = settings;
        if changed {
            let secs = settings.duration_secs(mode);
            self.state.current_time = secs;
            self.state.initial_time = secs;
        }
        Some(Event::SettingsUpdated {
            focus_time: settings.focus_time,
            break_time: settings.break_time,
            audio_enabled: settings.audio_enabled,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn switch_mode(&mut self) -> Event {
        let from = self.mode();
        let to = from.other();
        if from == Mode::Focus {
            self.state.session_count = self.state.session_count.saturating_add(1);
        }
        let secs = self.settings.duration_secs(to);
        self.state.is_break = to == Mode::Break;
        self.state.current_time = secs;
        self.state.initial_time = secs;
        tracing::info!(
            from = from.as_str(),
            to = to.as_str(),
            sessions = self.state.session_count,
            "timer mode switched"
        );
        Event::ModeSwitched {
            from,
            to,
            session_count: self.state.session_count,
            duration_secs: secs,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn settings(focus: u32, brk: u32) -> TimerSettings {
        TimerSettings {
            focus_time: focus,
            break_time: brk,
            audio_enabled: false,
        }
    }

    #[test]
    fn start_pause_reset() {
        let mut engine = TimerEngine::new(TimerSettings::default());
        assert!(!engine.is_active());

        assert!(engine.start().is_some());
        assert!(engine.is_active());
        assert!(engine.start().is_none());

        assert!(engine.pause().is_some());
        assert!(!engine.is_active());
        assert!(engine.pause().is_none());

        engine.start();
        engine.tick();
        engine.reset();
        assert_eq!(engine.state(), TimerState::fresh(&TimerSettings::default()));
    }

    #[test]
    fn inactive_timer_does_not_tick() {
        let mut engine = TimerEngine::new(settings(25, 5));
        assert!(engine.tick().is_none());
        assert_eq!(engine.state().current_time, 1500);
    }

    #[test]
    fn full_focus_session_flips_to_break() {
        let mut engine = TimerEngine::new(settings(25, 5));
        engine.start();
        let mut switches = 0;
        for _ in 0..1500 {
            if engine.tick().is_some() {
                switches += 1;
            }
        }
        let state = engine.state();
        assert_eq!(switches, 1);
        assert!(state.is_break);
        assert!(state.is_active);
        assert_eq!(state.current_time, 300);
        assert_eq!(state.initial_time, 300);
        assert_eq!(state.session_count, 1);
    }

    #[test]
    fn break_back_to_focus_does_not_count_session() {
        let mut engine = TimerEngine::new(settings(1, 1));
        engine.start();
        for _ in 0..120 {
            engine.tick();
        }
        let state = engine.state();
        assert!(!state.is_break);
        assert_eq!(state.current_time, 60);
        assert_eq!(state.session_count, 1);
    }

    #[test]
    fn zero_countdown_switches_exactly_once() {
        let stuck = TimerState {
            is_active: false,
            is_break: false,
            current_time: 0,
            initial_time: 1500,
            session_count: 0,
        };
        let mut engine = TimerEngine::restore(stuck, settings(25, 5));
        assert!(engine.tick().is_none());
        assert_eq!(engine.state().current_time, 0);

        engine.start();
        match engine.tick() {
            Some(Event::ModeSwitched { from, to, session_count, .. }) => {
                assert_eq!(from, Mode::Focus);
                assert_eq!(to, Mode::Break);
                assert_eq!(session_count, 1);
            }
            other => panic!("expected ModeSwitched, got {other:?}"),
        }
        assert_eq!(engine.state().current_time, 300);
        assert!(engine.tick().is_none());
        assert_eq!(engine.state().current_time, 299);
    }

    #[test]
    fn restore_clamps_current_time() {
        let broken = TimerState {
            is_active: true,
            is_break: true,
            current_time: 900,
            initial_time: 300,
            session_count: 2,
        };
        let engine = TimerEngine::restore(broken, settings(25, 5));
        assert_eq!(engine.state().current_time, 300);
    }

    #[test]
    fn settings_change_snaps_current_mode_only() {
        let mut engine = TimerEngine::new(settings(25, 5));
        engine.update_settings(settings(25, 10));
        assert_eq!(engine.state().current_time, 1500);

        engine.update_settings(settings(40, 10));
        assert_eq!(engine.state().current_time, 2400);
        assert_eq!(engine.state().initial_time, 2400);
    }

    #[test]
    fn state_serializes_with_camel_case_keys() {
        let engine = TimerEngine::new(TimerSettings::default());
        let json = serde_json::to_value(engine.state()).unwrap();
        assert_eq!(json["isActive"], false);
        assert_eq!(json["currentTime"], 1500);
        assert_eq!(json["sessionCount"], 0);
    }

    proptest! {
        #[test]
        fn countdown_stays_within_bounds(
            focus in 1u32..=60,
            brk in 1u32..=30,
            ticks in 0usize..6000,
        ) {
            let mut engine = TimerEngine::new(settings(focus, brk));
            engine.start();
            for _ in 0..ticks {
                engine.tick();
                let state = engine.state();
                prop_assert!(state.current_time <= state.initial_time);
                prop_assert!(state.current_time > 0);
            }
        }
    }
}
