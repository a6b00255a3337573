// Error handling module
// Defines the error taxonomy shared by the HTTP client, auth and handlers

use thiserror::Error;

/// Errors that can occur while handling a Connect invocation
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed input or missing required field
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Credential resolution or token exchange failed
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Connection, DNS or timeout failure on a single attempt
    #[error("Transport error: {0}")]
    TransportError(String),

    /// 408, 429 or 5xx on a single attempt
    #[error("request returned retryable status: {status}")]
    RetryableStatus { status: u16, body: String },

    /// Any other non-2xx status
    #[error("request returned non-2xx status: {status}, body: {body}")]
    FatalStatus { status: u16, body: String },

    /// Every attempt failed with a retryable error
    #[error("request failed after {attempts} attempts: {cause}")]
    RetriesExhausted { attempts: u32, cause: String },

    /// Downstream JSON did not have the expected shape
    #[error("Invalid response: {0}")]
    ResponseShapeError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::TransportError(_) | ApiError::RetryableStatus { .. }
        )
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RetryableStatus { status, .. } | ApiError::FatalStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Result type alias for handler operations
pub type Result<T> = std::result::Result<T, ApiError>;
