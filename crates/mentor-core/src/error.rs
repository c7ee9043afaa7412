use thiserror::Error;

/// Top-level error type for the Mentor system.
///
/// Subsystem crates keep their own error enums and convert into this one at
/// the composition root, so `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MentorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for MentorError {
    fn from(err: toml::de::Error) -> Self {
        MentorError::Config(err.to_string())
    }
}

/// A specialized `Result` type for Mentor operations.
pub type Result<T> = std::result::Result<T, MentorError>;
