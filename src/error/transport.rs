//! Transport-level failures: the request never produced an HTTP response.

use thiserror::Error;

use crate::traits::HttpError;

/// The exchange with the backend failed before a status code was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection to the server failed.
    #[error("connection to {url} failed: {message}")]
    ConnectionFailed { url: String, message: String },

    /// Request timed out.
    #[error("request to {url} timed out: {message}")]
    Timeout { url: String, message: String },

    /// The URL could not be built or parsed.
    #[error("invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// Request was cancelled.
    #[error("request to {url} was cancelled")]
    Cancelled { url: String },

    /// Any other I/O level failure.
    #[error("request to {url} failed: {message}")]
    Other { url: String, message: String },
}

impl TransportError {
    /// Classify an [`HttpError`] that carries no status code.
    pub fn from_http(url: &str, err: HttpError) -> Self {
        let url = url.to_string();
        match err {
            HttpError::ConnectionFailed(message) => TransportError::ConnectionFailed { url, message },
            HttpError::Timeout(message) => TransportError::Timeout { url, message },
            HttpError::InvalidUrl(message) => TransportError::InvalidUrl { url, message },
            HttpError::Cancelled => TransportError::Cancelled { url },
            HttpError::Io(message) | HttpError::Other(message) => {
                TransportError::Other { url, message }
            }
            HttpError::ServerError { status, message } => TransportError::Other {
                url,
                message: format!("unexpected status {}: {}", status, message),
            },
        }
    }

    /// The URL the failed request was sent to.
    pub fn url(&self) -> &str {
        match self {
            TransportError::ConnectionFailed { url, .. }
            | TransportError::Timeout { url, .. }
            | TransportError::InvalidUrl { url, .. }
            | TransportError::Cancelled { url }
            | TransportError::Other { url, .. } => url,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::ConnectionFailed { .. } => "TRANSPORT_CONNECT",
            TransportError::Timeout { .. } => "TRANSPORT_TIMEOUT",
            TransportError::InvalidUrl { .. } => "TRANSPORT_URL",
            TransportError::Cancelled { .. } => "TRANSPORT_CANCELLED",
            TransportError::Other { .. } => "TRANSPORT_OTHER",
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::ConnectionFailed { .. } => {
                "Unable to connect to the registry. Please check the address and your network."
                    .to_string()
            }
            TransportError::Timeout { .. } => {
                "The registry did not answer in time. Please try again.".to_string()
            }
            TransportError::InvalidUrl { url, .. } => {
                format!("The registry address '{}' is not a valid URL.", url)
            }
            TransportError::Cancelled { .. } => "The request was cancelled.".to_string(),
            TransportError::Other { message, .. } => {
                format!("The request could not be completed: {}", message)
            }
        }
    }

    /// Whether a later attempt could succeed without any change.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectionFailed { .. } | TransportError::Timeout { .. }
        )
    }
}
