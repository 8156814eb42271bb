//! Ambient sound coordination: user settings on one side, the playback
//! context on the other.
//!
//! Settings changes always succeed locally. Relaying them is best effort: a
//! playback context that is missing or never becomes ready turns the relay
//! into a logged no-op.

use super::playback::{ensure_ready, PlaybackCommand, PlaybackContext};
use super::settings::{AmbientSettings, SoundSetting, MAX_VOLUME};
use crate::error::{PlaybackError, ValidationError};
use crate::storage::PlaybackConfig;

pub struct AmbientCoordinator {
    settings: AmbientSettings,
    cfg: PlaybackConfig,
}

impl AmbientCoordinator {
    pub fn new(settings: AmbientSettings, cfg: PlaybackConfig) -> Self {
        Self { settings, cfg }
    }

    pub fn settings(&self) -> &AmbientSettings {
        &self.settings
    }

    pub fn asset_url(&self, key: &str) -> String {
        format!("{}/{key}.mp3", self.cfg.asset_base.trim_end_matches('/'))
    }

    fn setting(&self, key: &str) -> Result<SoundSetting, ValidationError> {
        self.settings
            .get(key)
            .copied()
            .ok_or_else(|| ValidationError::UnknownSound(key.to_string()))
    }

    fn start_command(&self, key: &str, setting: &SoundSetting) -> PlaybackCommand {
        PlaybackCommand::StartAmbientSound {
            sound_key: key.to_string(),
            audio_url: self.asset_url(key),
            volume: setting.gain(),
        }
    }

    /// Probe readiness, then send. Returns whether the command was delivered.
    pub async fn relay(&self, ctx: &mut impl PlaybackContext, command: PlaybackCommand) -> bool {
        let outcome = match ensure_ready(ctx, &self.cfg).await {
            Ok(()) => ctx.send(&command).and_then(|reply| {
                if reply.success {
                    Ok(())
                } else {
                    Err(PlaybackError::Rejected(reply.error.unwrap_or_default()))
                }
            }),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(?command, error = %e, "playback relay dropped");
                false
            }
        }
    }

    /// Turn one sound on or off.
    pub async fn set_enabled(
        &mut self,
        ctx: &mut impl PlaybackContext,
        key: &str,
        enabled: bool,
    ) -> Result<(), ValidationError> {
        let mut setting = self.setting(key)?;
        setting.enabled = enabled;
        if let Some(slot) = self.settings.get_mut(key) {
            *slot = setting;
        }

        let command = if enabled {
            self.start_command(key, &setting)
        } else {
            PlaybackCommand::StopAmbientSound {
                sound_key: key.to_string(),
            }
        };
        self.relay(ctx, command).await;
        Ok(())
    }

    /// Set a sound's volume (clamped to 0..=100). Only relayed while the
    /// sound is playing.
    pub async fn set_volume(
        &mut self,
        ctx: &mut impl PlaybackContext,
        key: &str,
        volume: u8,
    ) -> Result<(), ValidationError> {
        let mut setting = self.setting(key)?;
        setting.volume = volume.min(MAX_VOLUME);
        if let Some(slot) = self.settings.get_mut(key) {
            *slot = setting;
        }

        if setting.enabled {
            let command = PlaybackCommand::UpdateAmbientVolume {
                sound_key: key.to_string(),
                volume: setting.gain(),
            };
            self.relay(ctx, command).await;
        }
        Ok(())
    }

    /// Play a sound once for the configured test duration.
    pub async fn test(&self, ctx: &mut impl PlaybackContext, key: &str) -> Result<(), ValidationError> {
        let setting = self.setting(key)?;
        let command = PlaybackCommand::TestAmbientSound {
            sound_key: key.to_string(),
            audio_url: self.asset_url(key),
            volume: setting.gain(),
            duration_ms: self.cfg.test_duration_ms,
        };
        self.relay(ctx, command).await;
        Ok(())
    }

    /// Stop every sound and mark them all disabled.
    pub async fn stop_all(&mut self, ctx: &mut impl PlaybackContext) {
        self.settings.disable_all();
        self.relay(ctx, PlaybackCommand::StopAllAmbientSounds).await;
    }

    /// Replace the settings wholesale and bring playback in line: stop what
    /// was turned off, start what was turned on, retune what kept playing.
    pub async fn replace_settings(&mut self, ctx: &mut impl PlaybackContext, next: AmbientSettings) {
        let mut merged = AmbientSettings::default();
        merged.merge(next);
        let previous = std::mem::replace(&mut self.settings, merged);

        let mut commands = Vec::new();
        for (key, now) in self.settings.iter() {
            let before = previous.get(key).copied().unwrap_or_default();
            match (before.enabled, now.enabled) {
                (false, true) => commands.push(self.start_command(key, now)),
                (true, false) => commands.push(PlaybackCommand::StopAmbientSound {
                    sound_key: key.to_string(),
                }),
                (true, true) if before.volume != now.volume => {
                    commands.push(PlaybackCommand::UpdateAmbientVolume {
                        sound_key: key.to_string(),
                        volume: now.gain(),
                    });
                }
                _ => {}
            }
        }
        for command in commands {
            self.relay(ctx, command).await;
        }
    }

    /// Start every enabled sound, e.g. after the playback context restarted.
    pub async fn resume_enabled(&self, ctx: &mut impl PlaybackContext) -> usize {
        let commands: Vec<PlaybackCommand> = self
            .settings
            .enabled()
            .map(|(key, setting)| self.start_command(key, setting))
            .collect();
        let mut delivered = 0;
        for command in commands {
            if self.relay(ctx, command).await {
                delivered += 1;
            }
        }
        delivered
    }
}
