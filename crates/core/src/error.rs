//! Error types for the upstream CIViC client.

use serde::Deserialize;

/// Result type for CIViC client operations.
pub type CivicResult<T> = Result<T, CivicError>;

/// Errors that can occur while talking to the CIViC GraphQL API.
#[derive(Debug, thiserror::Error)]
pub enum CivicError {
    /// HTTP request failed at the transport level.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-success status.
    #[error("CIViC API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Upstream returned 200 with GraphQL-level errors.
    #[error("GraphQL error: {0}")]
    Graphql(String),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request timed out after retries were exhausted.
    #[error("Request timed out")]
    Timeout,

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl CivicError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Create an API error from a status code and response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct UpstreamError {
            error: String,
        }

        if let Ok(parsed) = serde_json::from_str::<UpstreamError>(body) {
            Self::Api {
                status,
                message: parsed.error,
            }
        } else {
            Self::Api {
                status,
                message: body.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(CivicError::Api {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(CivicError::Api {
            status: 429,
            message: "slow down".into()
        }
        .is_retryable());
        assert!(!CivicError::Api {
            status: 400,
            message: "bad query".into()
        }
        .is_retryable());
        assert!(!CivicError::Graphql("field not found".into()).is_retryable());
        assert!(CivicError::Timeout.is_retryable());
    }

    #[test]
    fn test_from_response_parses_json_body() {
        let err = CivicError::from_response(500, r#"{"error": "internal"}"#);
        match err {
            CivicError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "internal");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_response_falls_back_to_raw_body() {
        let err = CivicError::from_response(502, "Bad Gateway");
        match err {
            CivicError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
