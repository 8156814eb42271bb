use clap::Subcommand;
use focusbee_core::{Config, Event, Message, Response, TimerSettings};

use super::{open_controller, print_json, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start (or resume) the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Back to an idle focus block and zero sessions
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Show or change durations and the notification sound
    Settings {
        /// Focus length in minutes (1-60)
        #[arg(long)]
        focus: Option<u32>,
        /// Break length in minutes (1-30)
        #[arg(long = "break")]
        break_time: Option<u32>,
        /// Play a notification on every mode change
        #[arg(long)]
        audio: Option<bool>,
    },
    /// Advance the countdown by whole seconds without waiting
    Tick {
        #[arg(long, default_value = "1")]
        count: u32,
    },
    /// Start and tick in real time until Ctrl-C
    Run {
        /// Stop after this many seconds
        #[arg(long)]
        for_secs: Option<u64>,
    },
}

fn print_response(response: &Response) -> CliResult {
    match &response.error {
        Some(e) if !response.success => Err(e.clone().into()),
        _ => print_json(response),
    }
}

pub async fn run(action: TimerAction, config: Config) -> CliResult {
    let mut ctl = open_controller(config)?;

    match action {
        TimerAction::Start => print_response(&ctl.handle(Message::TimerStart).await)?,
        TimerAction::Pause => print_response(&ctl.handle(Message::TimerPause).await)?,
        TimerAction::Reset => print_response(&ctl.handle(Message::TimerReset).await)?,
        TimerAction::Status => print_response(&ctl.handle(Message::TimerGetState).await)?,
        TimerAction::Settings {
            focus,
            break_time,
            audio,
        } => {
            if focus.is_none() && break_time.is_none() && audio.is_none() {
                print_json(&ctl.timer_settings())?;
            } else {
                let current = ctl.timer_settings();
                let settings = TimerSettings {
                    focus_time: focus.unwrap_or(current.focus_time),
                    break_time: break_time.unwrap_or(current.break_time),
                    audio_enabled: audio.unwrap_or(current.audio_enabled),
                };
                print_response(&ctl.handle(Message::TimerUpdateSettings { settings }).await)?;
            }
        }
        TimerAction::Tick { count } => {
            for _ in 0..count {
                if let Some(event) = ctl.tick().await {
                    print_json(&event)?;
                }
            }
            print_json(&ctl.timer_state())?;
        }
        TimerAction::Run { for_secs } => {
            ctl.handle(Message::TimerStart).await;

            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "cannot listen for ctrl-c");
                    std::future::pending::<()>().await;
                }
            };
            let ticks = ctl
                .run(for_secs, shutdown, |event| {
                    if let Event::ModeSwitched { .. } = event {
                        match serde_json::to_string(event) {
                            Ok(json) => println!("{json}"),
                            Err(e) => tracing::warn!(error = %e, "cannot encode event"),
                        }
                    }
                })
                .await;
            tracing::info!(ticks, "timer loop finished");
            print_json(&ctl.timer_state())?;
        }
    }
    Ok(())
}
