//! Error types for parlo.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParloError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("API key not set: export PARLO_API_KEY or set api.key in the config file")]
    ApiKeyMissing,

    // Backend errors
    #[error("Backend request failed: {message}")]
    Backend {
        message: String,
        status: Option<u16>,
    },

    #[error("Backend returned an unexpected response: {message}")]
    BackendResponse { message: String },

    // Audio errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio output failed: {message}")]
    AudioOutput { message: String },

    #[error("Audio decode failed: {message}")]
    AudioDecode { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl ParloError {
    /// Heuristically classify this error as a rate-limit/quota condition.
    ///
    /// Remote APIs surface quota exhaustion in several shapes: an HTTP 429
    /// status, a `RESOURCE_EXHAUSTED` status string in the body, or prose
    /// mentioning "quota" or "rate limit". Matching is case-insensitive
    /// across all of them. Rate-limited failures get a transient
    /// user-visible notice; everything else is surfaced generically.
    pub fn is_rate_limited(&self) -> bool {
        let (message, status) = match self {
            ParloError::Backend { message, status } => (message.as_str(), *status),
            ParloError::BackendResponse { message } => (message.as_str(), None),
            ParloError::Other(message) => (message.as_str(), None),
            _ => return false,
        };

        if status == Some(429) {
            return true;
        }

        let lower = message.to_lowercase();
        lower.contains("429")
            || lower.contains("resource_exhausted")
            || lower.contains("quota")
            || lower.contains("rate limit")
            || lower.contains("rate-limit")
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ParloError>;
