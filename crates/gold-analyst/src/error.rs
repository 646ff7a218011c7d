//! Error types for gold analysis operations

use thiserror::Error;

/// Gold analysis specific errors
#[derive(Debug, Error)]
pub enum AnalystError {
    /// Caller input is missing or malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Market data could not be fetched for a symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable {
        symbol: String,
        reason: String,
    },

    /// News search failed or quota is exhausted
    #[error("News unavailable: {0}")]
    NewsUnavailable(String),

    /// Real-time search service failed
    #[error("Intelligence unavailable: {0}")]
    IntelligenceUnavailable(String),

    /// Language model call failed, timed out or returned nothing
    #[error("Completion unavailable: {0}")]
    CompletionUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalystError>;

impl AnalystError {
    /// Create a `DataUnavailable` error
    pub fn data_unavailable(symbol: impl Into<String>, reason: impl ToString) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.to_string(),
        }
    }

    /// Message safe to show to API callers
    ///
    /// Upstream response bodies and prompt text stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidRequest(msg) => msg.clone(),
            Self::DataUnavailable { symbol, .. } => {
                format!("Market data unavailable for {symbol}")
            },
            Self::CompletionUnavailable(_) => "Analysis service unavailable".to_string(),
            Self::NewsUnavailable(_) => "News service unavailable".to_string(),
            Self::IntelligenceUnavailable(_) => "Market intelligence unavailable".to_string(),
            Self::ConfigError(_) => "Internal server error".to_string(),
        }
    }
}

impl From<gold_utils::EnvError> for AnalystError {
    fn from(err: gold_utils::EnvError) -> Self {
        AnalystError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gold_utils::EnvError;

    #[test]
    fn test_error_display() {
        let err = AnalystError::InvalidRequest("Query cannot be empty".to_string());
        assert_eq!(err.to_string(), "Invalid request: Query cannot be empty");

        let err = AnalystError::data_unavailable("GC=F", "No data found");
        assert_eq!(err.to_string(), "Data not available for GC=F: No data found");
    }

    #[test]
    fn test_public_message_hides_upstream_detail() {
        let err = AnalystError::CompletionUnavailable("HTTP 500: {\"error\": \"boom\"}".to_string());
        assert_eq!(err.public_message(), "Analysis service unavailable");

        let err = AnalystError::data_unavailable("GC=F", "yahoo said: fetching failed");
        assert_eq!(err.public_message(), "Market data unavailable for GC=F");

        let err = AnalystError::InvalidRequest("Query cannot be empty".to_string());
        assert_eq!(err.public_message(), "Query cannot be empty");
    }

    #[test]
    fn test_env_error_conversion() {
        let err: AnalystError = EnvError::Missing("NEWS_API_KEY".to_string()).into();
        match err {
            AnalystError::ConfigError(msg) => {
                assert_eq!(msg, "NEWS_API_KEY environment variable not set");
            },
            other => panic!("Expected ConfigError, got {other:?}"),
        }
    }
}
