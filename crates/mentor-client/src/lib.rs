//! Mentor client - conversation widget logic.
//!
//! Talks to the relay over HTTP, drives the chat session state machine and
//! keeps a renderer-agnostic view model. Voice input plugs in through the
//! `SpeechRecognizer` trait.

pub mod api;
pub mod error;
pub mod messages;
pub mod session;
pub mod view;
pub mod voice;

pub use api::{HttpRelayApi, RelayApi};
pub use error::{ClientError, VoiceError};
pub use session::{ChatSession, SessionState};
pub use view::ChatView;
pub use voice::{
    RecognitionEvent, RecognizerError, RecognizerErrorKind, SpeechRecognizer, VoiceCapture,
};
