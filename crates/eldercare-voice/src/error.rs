//! Error types for the voice session.

use thiserror::Error;

/// Result type alias using [`VoiceError`].
pub type Result<T> = std::result::Result<T, VoiceError>;

#[derive(Debug, Error)]
pub enum VoiceError {
    /// Recording permission was refused. Surfaced as a warning, never fatal.
    #[error("Microphone permission denied")]
    PermissionDenied,

    /// The vendor client failed to initialise, connect, or disconnect.
    #[error("Voice client error: {0}")]
    Vendor(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
