//! Mode-change notification sounds: an alarm followed by a voice clip for the
//! mode that just began.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::timer::Mode;

pub const ALARM_CLIP: &str = "pomodoro_alarm.m4a";

const FOCUS_CLIPS: [&str; 3] = ["focus_time_1.m4a", "focus_time_2.m4a", "focus_time_3.m4a"];
const BREAK_CLIPS: [&str; 3] = ["break_time_1.m4a", "break_time_2.m4a", "break_time_3.m4a"];

pub fn clips_for(mode: Mode) -> &'static [&'static str] {
    match mode {
        Mode::Focus => &FOCUS_CLIPS,
        Mode::Break => &BREAK_CLIPS,
    }
}

/// Alarm plus one random clip for `entering`, as asset paths under `asset_base`.
pub fn sequence(entering: Mode, asset_base: &str, rng: &mut impl Rng) -> Vec<String> {
    let base = asset_base.trim_end_matches('/');
    let mut clips = vec![format!("{base}/{ALARM_CLIP}")];
    if let Some(clip) = clips_for(entering).choose(rng) {
        clips.push(format!("{base}/{clip}"));
    }
    clips
}
