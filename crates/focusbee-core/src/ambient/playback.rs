//! The out-of-popup playback context and the relay protocol to it.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;
use crate::storage::PlaybackConfig;

/// Commands understood by the playback context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum PlaybackCommand {
    PingOffscreen,
    StartAmbientSound {
        sound_key: String,
        audio_url: String,
        volume: f32,
    },
    StopAmbientSound {
        sound_key: String,
    },
    UpdateAmbientVolume {
        sound_key: String,
        volume: f32,
    },
    StopAllAmbientSounds,
    TestAmbientSound {
        sound_key: String,
        audio_url: String,
        volume: f32,
        duration_ms: u64,
    },
    /// Play the clips one after another.
    PlayNotification {
        clips: Vec<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackReply {
    pub success: bool,
    #[serde(default)]
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlaybackReply {
    pub fn ok() -> Self {
        Self {
            success: true,
            ready: true,
            error: None,
        }
    }
}

/// A context able to receive playback commands.
///
/// `Err(PlaybackError::Unavailable)` models a send with no listener.
pub trait PlaybackContext {
    fn send(&mut self, command: &PlaybackCommand) -> Result<PlaybackReply, PlaybackError>;
}

/// Probe the context until it reports ready.
///
/// Makes `cfg.ready_attempts` attempts; before retry `n` it waits
/// `n * cfg.ready_base_delay_ms`.
pub async fn ensure_ready(
    ctx: &mut impl PlaybackContext,
    cfg: &PlaybackConfig,
) -> Result<(), PlaybackError> {
    let attempts = cfg.ready_attempts.max(1);
    for attempt in 1..=attempts {
        match ctx.send(&PlaybackCommand::PingOffscreen) {
            Ok(reply) if reply.success && reply.ready => return Ok(()),
            Ok(_) => tracing::debug!(attempt, "playback context not ready yet"),
            Err(e) => tracing::debug!(attempt, error = %e, "playback ping failed"),
        }
        if attempt < attempts {
            let delay = cfg.ready_base_delay_ms.saturating_mul(u64::from(attempt));
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }
    Err(PlaybackError::NotReady { attempts })
}

/// A track currently looping in the player.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub audio_url: String,
    pub volume: f32,
    /// How many times this key was (re)started.
    pub generation: u32,
}

/// In-process playback context. Keeps the set of looping tracks; actual
/// audio output belongs to the host.
#[derive(Debug, Default)]
pub struct OffscreenPlayer {
    tracks: BTreeMap<String, Track>,
    tests: Vec<(String, f32, u64)>,
    notifications: Vec<Vec<String>>,
    /// Pings to ignore before answering ready.
    warmup_pings: u32,
}

impl OffscreenPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A player that answers its first `pings` readiness checks with "not ready".
    pub fn warming_up(pings: u32) -> Self {
        Self {
            warmup_pings: pings,
            ..Self::default()
        }
    }

    pub fn tracks(&self) -> &BTreeMap<String, Track> {
        &self.tracks
    }

    pub fn track(&self, key: &str) -> Option<&Track> {
        self.tracks.get(key)
    }

    pub fn tests(&self) -> &[(String, f32, u64)] {
        &self.tests
    }

    pub fn notifications(&self) -> &[Vec<String>] {
        &self.notifications
    }
}

impl PlaybackContext for OffscreenPlayer {
    fn send(&mut self, command: &PlaybackCommand) -> Result<PlaybackReply, PlaybackError> {
        match command {
            PlaybackCommand::PingOffscreen => {
                if self.warmup_pings > 0 {
                    self.warmup_pings -= 1;
                    return Ok(PlaybackReply {
                        success: true,
                        ready: false,
                        error: None,
                    });
                }
            }
            PlaybackCommand::StartAmbientSound {
                sound_key,
                audio_url,
                volume,
            } => {
                let generation = match self.tracks.remove(sound_key) {
                    Some(previous) => {
                        tracing::debug!(sound = %sound_key, "stopping existing instance");
                        previous.generation + 1
                    }
                    None => 1,
                };
                self.tracks.insert(
                    sound_key.clone(),
                    Track {
                        audio_url: audio_url.clone(),
                        volume: volume.clamp(0.0, 1.0),
                        generation,
                    },
                );
                tracing::info!(sound = %sound_key, volume, "ambient sound started");
            }
            PlaybackCommand::StopAmbientSound { sound_key } => {
                if self.tracks.remove(sound_key).is_none() {
                    tracing::warn!(sound = %sound_key, "stop for a sound that is not playing");
                }
            }
            PlaybackCommand::UpdateAmbientVolume { sound_key, volume } => {
                match self.tracks.get_mut(sound_key) {
                    Some(track) => track.volume = volume.clamp(0.0, 1.0),
                    None => tracing::warn!(sound = %sound_key, "volume for a sound that is not playing"),
                }
            }
            PlaybackCommand::StopAllAmbientSounds => {
                self.tracks.clear();
                tracing::info!("all ambient sounds stopped");
            }
            PlaybackCommand::TestAmbientSound {
                sound_key,
                volume,
                duration_ms,
                ..
            } => {
                self.tests.push((sound_key.clone(), *volume, *duration_ms));
            }
            PlaybackCommand::PlayNotification { clips } => {
                self.notifications.push(clips.clone());
            }
        }
        Ok(PlaybackReply::ok())
    }
}

/// A context with nobody listening. Every send fails as unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPlayback;

impl PlaybackContext for NoPlayback {
    fn send(&mut self, _command: &PlaybackCommand) -> Result<PlaybackReply, PlaybackError> {
        Err(PlaybackError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(key: &str, volume: f32) -> PlaybackCommand {
        PlaybackCommand::StartAmbientSound {
            sound_key: key.into(),
            audio_url: format!("audio/{key}.mp3"),
            volume,
        }
    }

    #[test]
    fn start_replaces_prior_instance_of_same_key() {
        let mut player = OffscreenPlayer::new();
        player.send(&start("rain", 0.5)).unwrap();
        player.send(&start("rain", 0.8)).unwrap();
        assert_eq!(player.tracks().len(), 1);
        let track = player.track("rain").unwrap();
        assert_eq!(track.generation, 2);
        assert!((track.volume - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn stop_all_clears_everything() {
        let mut player = OffscreenPlayer::new();
        player.send(&start("rain", 0.5)).unwrap();
        player.send(&start("wind", 0.5)).unwrap();
        player.send(&PlaybackCommand::StopAllAmbientSounds).unwrap();
        assert!(player.tracks().is_empty());
    }

    #[test]
    fn command_wire_shape() {
        let json = serde_json::to_value(start("ocean_waves", 0.25)).unwrap();
        assert_eq!(json["type"], "START_AMBIENT_SOUND");
        assert_eq!(json["soundKey"], "ocean_waves");
        assert_eq!(json["audioUrl"], "audio/ocean_waves.mp3");
        let ping = serde_json::to_value(PlaybackCommand::PingOffscreen).unwrap();
        assert_eq!(ping["type"], "PING_OFFSCREEN");
    }

    #[tokio::test(start_paused = true)]
    async fn readiness_ping_retries_with_growing_delay() {
        let cfg = PlaybackConfig::default();
        let mut player = OffscreenPlayer::warming_up(2);
        let started = tokio::time::Instant::now();
        ensure_ready(&mut player, &cfg).await.unwrap();
        // 100ms after the first ping, 200ms after the second.
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(300) && waited < Duration::from_millis(310));
    }

    #[tokio::test(start_paused = true)]
    async fn readiness_ping_gives_up() {
        let cfg = PlaybackConfig::default();
        let err = ensure_ready(&mut NoPlayback, &cfg).await.unwrap_err();
        assert_eq!(err, PlaybackError::NotReady { attempts: 3 });

        let mut slow = OffscreenPlayer::warming_up(5);
        assert!(ensure_ready(&mut slow, &cfg).await.is_err());
    }
}
