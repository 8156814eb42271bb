use clap::Subcommand;
use focusbee_core::ambient::SOUND_KEYS;
use focusbee_core::{Config, Message};

use super::{open_controller, print_json, CliResult};

#[derive(Subcommand)]
pub enum SoundAction {
    /// Show every sound with its state
    List {
        #[arg(long)]
        json: bool,
    },
    /// Start looping a sound
    On { key: String },
    /// Stop a sound
    Off { key: String },
    /// Set a sound's volume (0-100)
    Volume { key: String, volume: u8 },
    /// Play a sound once as a preview
    Test { key: String },
    /// Stop every sound
    StopAll,
}

pub async fn run(action: SoundAction, config: Config) -> CliResult {
    let mut ctl = open_controller(config)?;
    ctl.startup().await;

    let message = match action {
        SoundAction::List { json } => {
            let settings = ctl.ambient_settings();
            if json {
                print_json(settings)?;
            } else {
                for (key, setting) in settings.iter() {
                    let state = if setting.enabled { "on " } else { "off" };
                    println!("{key:<12} {state} {:>3}%", setting.volume);
                }
            }
            return Ok(());
        }
        SoundAction::On { key } => Message::AmbientStart { sound_key: key },
        SoundAction::Off { key } => Message::AmbientStop { sound_key: key },
        SoundAction::Volume { key, volume } => Message::AmbientUpdateVolume {
            sound_key: key,
            volume,
        },
        SoundAction::Test { key } => Message::AmbientTest { sound_key: key },
        SoundAction::StopAll => Message::AmbientStopAll,
    };

    let response = ctl.handle(message).await;
    if let Some(e) = response.error {
        return Err(format!("{e} (known sounds: {})", SOUND_KEYS.join(", ")).into());
    }
    println!("ok");
    Ok(())
}
