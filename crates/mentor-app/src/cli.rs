//! CLI argument definitions for the Mentor binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mentor_core::config::MentorConfig;

/// Mentor Divergente - chat relay and terminal client.
#[derive(Parser, Debug)]
#[command(name = "mentor", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the relay HTTP server.
    Serve(ServeArgs),
    /// Chat with the mentor from the terminal.
    Chat(ChatArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Port to listen on.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Address to bind.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Directory of static widget files served under `/`.
    #[arg(long = "static-dir")]
    pub static_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct ChatArgs {
    /// Relay API root, e.g. http://localhost:3000/api.
    #[arg(long = "relay-url")]
    pub relay_url: Option<String>,

    /// Hostname the client pretends to be served from; picks the relay.
    #[arg(long = "host", default_value = "localhost")]
    pub host: String,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > MENTOR_CONFIG env var > ~/.mentor/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_from(|key| std::env::var(key).ok())
    }

    pub fn resolve_config_path_from<F>(&self, lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = lookup("MENTOR_CONFIG").filter(|p| !p.is_empty()) {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Fold command-specific flags into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut MentorConfig) {
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Command::Serve(ref serve) = self.command {
            if let Some(port) = serve.port {
                config.server.port = port;
            }
            if let Some(ref host) = serve.host {
                config.server.host = host.clone();
            }
            if let Some(ref dir) = serve.static_dir {
                config.server.static_dir = Some(dir.to_string_lossy().to_string());
            }
        }
    }
}

impl ChatArgs {
    /// Relay API root: --relay-url, else chosen from the client host.
    pub fn resolve_relay_url(&self, config: &MentorConfig) -> String {
        match self.relay_url {
            Some(ref url) => url.clone(),
            None => config.client.api_base_for_host(&self.host).to_string(),
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".mentor").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".mentor").join("config.toml");
    }
    PathBuf::from("config.toml")
}
