use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::storage::{self, keys, Store};

/// Built-in looping tracks.
pub const SOUND_KEYS: [&str; 6] = ["bird", "campfire", "ocean_waves", "rain", "thunder", "wind"];

pub const DEFAULT_VOLUME: u8 = 50;
pub const MAX_VOLUME: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundSetting {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_volume")]
    pub volume: u8,
}

fn default_volume() -> u8 {
    DEFAULT_VOLUME
}

impl Default for SoundSetting {
    fn default() -> Self {
        Self {
            enabled: false,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl SoundSetting {
    /// Linear 0..=100 → 0.0..=1.0.
    pub fn gain(&self) -> f32 {
        f32::from(self.volume.min(MAX_VOLUME)) / f32::from(MAX_VOLUME)
    }
}

/// Per-sound settings keyed by sound key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmbientSettings(BTreeMap<String, SoundSetting>);

impl Default for AmbientSettings {
    fn default() -> Self {
        Self(
            SOUND_KEYS
                .iter()
                .map(|k| ((*k).to_string(), SoundSetting::default()))
                .collect(),
        )
    }
}

impl AmbientSettings {
    /// Defaults with any persisted entries merged on top.
    pub fn load(store: &impl Store) -> Self {
        let mut settings = Self::default();
        if let Some(saved) = storage::load::<Self>(store, keys::AMBIENT_SETTINGS) {
            settings.merge(saved);
        }
        settings
    }

    pub fn save(&self, store: &impl Store) {
        storage::persist(store, keys::AMBIENT_SETTINGS, self);
    }

    pub fn merge(&mut self, other: Self) {
        for (key, mut setting) in other.0 {
            setting.volume = setting.volume.min(MAX_VOLUME);
            self.0.insert(key, setting);
        }
    }

    pub fn get(&self, key: &str) -> Option<&SoundSetting> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut SoundSetting> {
        self.0.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SoundSetting)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn enabled(&self) -> impl Iterator<Item = (&str, &SoundSetting)> {
        self.iter().filter(|(_, s)| s.enabled)
    }

    pub fn disable_all(&mut self) {
        for setting in self.0.values_mut() {
            setting.enabled = false;
        }
    }
}
