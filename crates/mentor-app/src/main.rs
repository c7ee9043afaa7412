//! Mentor application binary - composition root.
//!
//! 1. Parse CLI arguments
//! 2. Load configuration (TOML file, then environment, then flags)
//! 3. Either start the relay server or open a terminal chat session

mod chat;
mod cli;

use clap::Parser;

use mentor_core::config::MentorConfig;
use mentor_relay::{start_server, AppState};

use cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = MentorConfig::load_or_default(&config_file);
    config.apply_env();
    args.apply_overrides(&mut config);

    // Tracing. RUST_LOG wins over the configured level.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::info!("Starting Mentor v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    match args.command {
        Command::Serve(_) => {
            if let Err(e) = config.validate() {
                tracing::error!(error = %e, "Invalid relay configuration");
                return Err(e.into());
            }
            tracing::info!(
                base_url = %config.provider.base_url,
                interval_ms = config.polling.interval_ms,
                max_attempts = config.polling.max_attempts,
                "Relay configured"
            );
            start_server(AppState::from_config(&config)).await?;
        }
        Command::Chat(ref chat_args) => {
            let relay_url = chat_args.resolve_relay_url(&config);
            chat::run(relay_url).await?;
        }
    }

    Ok(())
}
