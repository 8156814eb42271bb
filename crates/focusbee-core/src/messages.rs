//! Messages exchanged between contexts and the controller.

use serde::{Deserialize, Serialize};

use crate::ambient::AmbientSettings;
use crate::timer::{Mode, TimerSettings, TimerState};

/// A request addressed to the controller. Serialized with a `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Message {
    TimerStart,
    TimerPause,
    TimerReset,
    TimerGetState,
    TimerUpdateSettings {
        settings: TimerSettings,
    },
    AmbientStart {
        sound_key: String,
    },
    AmbientStop {
        sound_key: String,
    },
    AmbientUpdateVolume {
        sound_key: String,
        volume: u8,
    },
    AmbientTest {
        sound_key: String,
    },
    AmbientStopAll,
    AmbientUpdateSettings {
        settings: AmbientSettings,
    },
    /// Play the mode-change notification for `context`.
    PlayAudio {
        context: Mode,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<TimerState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            state: None,
            error: None,
        }
    }

    pub fn with_state(state: TimerState) -> Self {
        Self {
            success: true,
            state: Some(state),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            state: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_use_type_discriminator() {
        let json = serde_json::to_value(Message::AmbientUpdateVolume {
            sound_key: "rain".into(),
            volume: 30,
        })
        .unwrap();
        assert_eq!(json["type"], "AMBIENT_UPDATE_VOLUME");
        assert_eq!(json["soundKey"], "rain");
    }

    #[test]
    fn parses_host_shaped_messages() {
        let msg: Message = serde_json::from_str(r#"{"type":"TIMER_START"}"#).unwrap();
        assert_eq!(msg, Message::TimerStart);

        let msg: Message = serde_json::from_str(
            r#"{"type":"TIMER_UPDATE_SETTINGS","settings":{"focusTime":50,"breakTime":10,"audioEnabled":false}}"#,
        )
        .unwrap();
        assert!(matches!(
            msg,
            Message::TimerUpdateSettings { settings } if settings.focus_time == 50 && !settings.audio_enabled
        ));

        let msg: Message = serde_json::from_str(r#"{"type":"PLAY_AUDIO","context":"break"}"#).unwrap();
        assert_eq!(msg, Message::PlayAudio { context: Mode::Break });
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<Message>(r#"{"type":"SELF_DESTRUCT"}"#).is_err());
    }

    #[test]
    fn error_response_omits_state() {
        let json = serde_json::to_value(Response::error("nope")).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("state").is_none());
    }
}
