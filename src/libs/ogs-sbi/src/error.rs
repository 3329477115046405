//! SBI Error Types
//!
//! Transport-level failures raised while talking to a peer NF.
//! Application-level failures travel as `ProblemDetails` instead.

use thiserror::Error;

use crate::constants::status;

/// SBI Error type
#[derive(Error, Debug)]
pub enum SbiError {
    /// HTTP/2 connection error
    #[error("HTTP/2 connection error: {0}")]
    ConnectionError(String),

    /// Invalid URI
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Invalid method
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Server error
    #[error("Server error: {0}")]
    ServerError(String),

    /// Client error
    #[error("Client error: {0}")]
    ClientError(String),

    /// Hyper error
    #[error("Hyper error: {0}")]
    HyperError(String),

    /// Invalid response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl SbiError {
    /// Status to report when a peer could not be reached
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ConnectionError(_) | Self::HyperError(_) => Some(status::GATEWAY_TIMEOUT),
            _ => None,
        }
    }
}

/// Result type for SBI operations
pub type SbiResult<T> = Result<T, SbiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_code() {
        let err = SbiError::ConnectionError("refused".to_string());
        assert_eq!(err.status_code(), Some(status::GATEWAY_TIMEOUT));
        assert_eq!(status::GATEWAY_TIMEOUT, 504);

        let err = SbiError::InvalidUri("::".to_string());
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_error_display() {
        let err = SbiError::InvalidMethod("TRACE".to_string());
        assert_eq!(err.to_string(), "Invalid HTTP method: TRACE");
    }
}
