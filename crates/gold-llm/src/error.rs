//! Error types for LLM operations

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors raised while talking to a completion service
#[derive(Error, Debug)]
pub enum LLMError {
    /// No response arrived (connect, TLS, timeout, body read)
    #[cfg(feature = "openai")]
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Credentials were rejected
    #[error("Authentication rejected by {provider}")]
    Unauthorized { provider: String },

    /// The service throttled the request
    #[error("Rate limited by {provider}: {detail}")]
    RateLimited { provider: String, detail: String },

    /// Any other non-success status
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    /// The requested model does not exist
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// The request was rejected before or by the service
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A response arrived but could not be understood
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Provider set up incorrectly
    #[error("Configuration error: {0}")]
    Configuration(String),
}
