//! Error types for the conversation client.

use mentor_core::error::MentorError;

use crate::session::SessionState;

/// Errors from the relay API client and the session state machine.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Backend server is not running: {0}")]
    RelayUnreachable(String),
    #[error("{0}")]
    Relay(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected relay response: {0}")]
    Decode(String),
    #[error("No active thread")]
    NoActiveThread,
    #[error("invalid session transition: {from} -> {to}")]
    InvalidTransition { from: SessionState, to: SessionState },
}

impl From<ClientError> for MentorError {
    fn from(err: ClientError) -> Self {
        MentorError::Client(err.to_string())
    }
}

/// Errors from voice capture.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoiceError {
    #[error("speech recognition is not available")]
    Unsupported,
    #[error("speech recognition stopped: {0}")]
    Stopped(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        assert_eq!(
            ClientError::Relay("threadId and content are required".into()).to_string(),
            "threadId and content are required"
        );
        assert_eq!(ClientError::NoActiveThread.to_string(), "No active thread");
        let err = ClientError::InvalidTransition {
            from: SessionState::Error,
            to: SessionState::Sending,
        };
        assert_eq!(err.to_string(), "invalid session transition: Error -> Sending");
    }

    #[test]
    fn test_client_error_into_mentor_error() {
        let err: MentorError = ClientError::Transport("connection refused".into()).into();
        assert!(matches!(err, MentorError::Client(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_voice_error_display() {
        assert_eq!(
            VoiceError::Unsupported.to_string(),
            "speech recognition is not available"
        );
        assert_eq!(
            VoiceError::Stopped("not-allowed".into()).to_string(),
            "speech recognition stopped: not-allowed"
        );
    }
}
