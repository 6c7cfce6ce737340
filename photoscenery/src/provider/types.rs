//! Provider error type.

use std::fmt;

/// Errors from talking to a map server.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The request did not complete within the client timeout
    Timeout(String),
    /// The server answered with a non-success status
    Status { status: u16, url: String },
    /// Connection, TLS or body read failure
    Transport(String),
    /// The body arrived but is not a usable image
    InvalidResponse(String),
    /// The HTTP client could not be constructed
    ClientBuild(String),
}

/// Status map servers use to ask clients to back off.
pub const SERVICE_UNAVAILABLE: u16 = 503;

impl ProviderError {
    /// Whether another attempt may succeed: timeouts and 503 only.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout(_) => true,
            ProviderError::Status { status, .. } => *status == SERVICE_UNAVAILABLE,
            _ => false,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Timeout(url) => write!(f, "Request timed out: {}", url),
            ProviderError::Status { status, url } => write!(f, "HTTP {} from {}", status, url),
            ProviderError::Transport(msg) => write!(f, "Transport error: {}", msg),
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ProviderError::ClientBuild(msg) => write!(f, "Failed to create HTTP client: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::Timeout("u".into()).is_retryable());
        assert!(ProviderError::Status {
            status: 503,
            url: "u".into()
        }
        .is_retryable());
        assert!(!ProviderError::Status {
            status: 404,
            url: "u".into()
        }
        .is_retryable());
        assert!(!ProviderError::Status {
            status: 500,
            url: "u".into()
        }
        .is_retryable());
        assert!(!ProviderError::Transport("reset".into()).is_retryable());
        assert!(!ProviderError::InvalidResponse("empty".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = ProviderError::Status {
            status: 503,
            url: "http://tiles/x".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503 from http://tiles/x");
    }
}
