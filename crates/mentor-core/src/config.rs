use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MentorError, Result};

/// Top-level configuration for the Mentor relay and client.
///
/// Loaded from `~/.mentor/config.toml` by default, then overlaid with the
/// environment variables the hosted deployment uses (`OPENAI_API_KEY`,
/// `OPENAI_ASSISTANT_ID`, `PORT`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MentorConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl MentorConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MentorConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary variable lookup.
    ///
    /// Empty values are ignored; an unparsable `PORT` is logged and skipped.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.provider.api_key = key;
        }
        if let Some(id) = get("OPENAI_ASSISTANT_ID") {
            self.provider.assistant_id = id;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.provider.base_url = url;
        }
        if let Some(port) = get("PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid PORT"),
            }
        }
    }

    /// Check that everything the relay needs to reach the provider is set.
    pub fn validate(&self) -> Result<()> {
        if self.provider.api_key.trim().is_empty() {
            return Err(MentorError::Config(
                "provider.api_key is not set (use OPENAI_API_KEY)".to_string(),
            ));
        }
        if self.provider.assistant_id.trim().is_empty() {
            return Err(MentorError::Config(
                "provider.assistant_id is not set (use OPENAI_ASSISTANT_ID)".to_string(),
            ));
        }
        if self.polling.max_attempts == 0 {
            return Err(MentorError::Config(
                "polling.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP listener settings for the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Listening port.
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin.
    pub allowed_origins: Vec<String>,
    /// Directory with the widget's static files, served at `/` when set.
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            allowed_origins: vec![],
            static_dir: None,
        }
    }
}

/// Upstream assistant provider settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API credential. Never exposed to the browser.
    pub api_key: String,
    /// Assistant the runs are executed against.
    pub assistant_id: String,
    /// Base URL of the assistants API.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            assistant_id: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("assistant_id", &self.assistant_id)
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Run polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay before each status check, in milliseconds.
    pub interval_ms: u64,
    /// Maximum number of status checks per run.
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_attempts: 60,
        }
    }
}

/// Conversation client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Host names that select the local relay.
    pub local_hosts: Vec<String>,
    /// Relay API base used when running locally.
    pub local_api_base: String,
    /// Relay API base used everywhere else.
    pub deployed_api_base: String,
    /// How many times voice capture restarts the recognizer on its own
    /// before giving up.
    pub voice_restart_limit: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            local_hosts: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            local_api_base: "http://localhost:3000/api".to_string(),
            deployed_api_base: "https://mentordivergente.vercel.app/api".to_string(),
            voice_restart_limit: 1,
        }
    }
}

impl ClientConfig {
    /// Pick the relay API base for a page served from `host`.
    pub fn api_base_for_host(&self, host: &str) -> &str {
        if self.local_hosts.iter().any(|h| h.eq_ignore_ascii_case(host)) {
            &self.local_api_base
        } else {
            &self.deployed_api_base
        }
    }
}
