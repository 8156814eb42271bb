use clap::{Parser, Subcommand};
use focusbee_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusbee", version, about = "Focusbee: pomodoro timer, site blocker and ambient sounds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Website blocklist and redirect rules
    Block {
        #[command(subcommand)]
        action: commands::block::BlockAction,
    },
    /// Task list
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Ambient background sounds
    Sound {
        #[command(subcommand)]
        action: commands::sound::SoundAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Quote of the day
    Quote(commands::quote::QuoteArgs),
}

/// Logs go to stderr so stdout stays parseable. `FOCUSBEE_LOG` overrides
/// the configured filter.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_env("FOCUSBEE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let (config, load_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_tracing(&config);
    if let Some(e) = load_error {
        tracing::warn!(error = %e, "config unavailable, using defaults");
    }

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, config).await,
        Commands::Block { action } => commands::block::run(action, config),
        Commands::Task { action } => commands::task::run(action),
        Commands::Sound { action } => commands::sound::run(action, config).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Quote(args) => commands::quote::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
