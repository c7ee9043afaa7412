//! Application state shared across all route handlers.
//!
//! Passed to handlers via axum's State extractor. Each relay process builds
//! exactly one; tests build as many independent ones as they like.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mentor_core::config::{MentorConfig, ServerConfig};

use crate::openai::OpenAiAssistants;
use crate::poll::RunPoller;
use crate::provider::AssistantProvider;
use crate::service::RelayService;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Relay operations over the upstream provider.
    pub relay: Arc<RelayService>,
    /// Listener, CORS and static file settings.
    pub server: Arc<ServerConfig>,
    /// When this state was built; reported as uptime at shutdown.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(relay: RelayService, server: ServerConfig) -> Self {
        Self {
            relay: Arc::new(relay),
            server: Arc::new(server),
            start_time: Instant::now(),
        }
    }

    /// State wired to an arbitrary provider and poller.
    pub fn with_provider(
        provider: Arc<dyn AssistantProvider>,
        poller: RunPoller,
        server: ServerConfig,
    ) -> Self {
        Self::new(RelayService::new(provider, poller), server)
    }

    /// Production state: OpenAI provider, real clock.
    pub fn from_config(config: &MentorConfig) -> Self {
        let provider = Arc::new(OpenAiAssistants::new(&config.provider));
        Self::with_provider(
            provider,
            RunPoller::from_config(&config.polling),
            config.server.clone(),
        )
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::InstantClock;
    use crate::provider::MockProvider;

    fn state() -> AppState {
        AppState::with_provider(
            Arc::new(MockProvider::new()),
            RunPoller::new(Duration::from_secs(1), 60, Arc::new(InstantClock::new())),
            ServerConfig::default(),
        )
    }

    #[test]
    fn test_uptime_counts_from_construction() {
        let state = state();
        let earlier = state.uptime();
        std::thread::sleep(Duration::from_millis(5));
        assert!(state.uptime() >= earlier + Duration::from_millis(5));
    }

    #[test]
    fn test_clones_share_start_time() {
        let state = state();
        let copy = state.clone();
        assert_eq!(state.start_time, copy.start_time);
    }
}
