//! Error types for the aria gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the voice agent pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration, raised before any agent is constructed
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech-to-text failed or produced no usable text
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Chat provider failure, or an empty reply
    #[error("chat completion error: {0}")]
    ChatCompletion(String),

    /// Speech engine failure during playback
    #[error("speech synthesis error: {0}")]
    SpeechSynthesis(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
