//! Mentor relay - axum HTTP server in front of an assistants API.
//!
//! Creates conversation threads upstream, forwards user messages, polls each
//! run until it finishes and relays the assistant's text back to the browser
//! without exposing provider credentials.

pub mod error;
pub mod handlers;
pub mod openai;
pub mod poll;
pub mod provider;
pub mod registry;
pub mod routes;
pub mod service;
pub mod state;

pub use error::{ApiError, RelayError};
pub use openai::OpenAiAssistants;
pub use poll::{Clock, InstantClock, RunPoller, TokioClock};
pub use provider::{AssistantProvider, MockProvider, ProviderError, RunStatus};
pub use routes::{create_router, start_server};
pub use service::RelayService;
pub use state::AppState;
