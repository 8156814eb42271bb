//! Ambient sounds: per-track settings, the coordinator that owns them and
//! the playback context the coordinator relays to.

mod coordinator;
pub mod playback;
mod settings;

pub use coordinator::AmbientCoordinator;
pub use playback::{
    ensure_ready, NoPlayback, OffscreenPlayer, PlaybackCommand, PlaybackContext, PlaybackReply,
};
pub use settings::{AmbientSettings, SoundSetting, DEFAULT_VOLUME, MAX_VOLUME, SOUND_KEYS};
