mod engine;
mod settings;

pub use engine::{Mode, TimerEngine, TimerState};
pub use settings::{TimerSettings, BREAK_RANGE, FOCUS_RANGE};
