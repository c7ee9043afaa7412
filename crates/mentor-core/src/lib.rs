//! Shared building blocks for the Mentor relay and conversation client.
//!
//! Holds the TOML configuration model, the top-level error type and the
//! JSON wire types exchanged between the browser-side client and the relay.

pub mod config;
pub mod error;
pub mod types;

pub use config::MentorConfig;
pub use error::{MentorError, Result};
pub use types::*;
