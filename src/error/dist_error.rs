//! Unified error type for distsync.

use thiserror::Error;

use super::category::ErrorCategory;
use super::protocol::ProtocolError;
use super::transport::TransportError;
use super::validation::ValidationError;

/// Unified error type: every fallible operation in the crate returns this.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistError {
    /// Connection/timeout level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Non-2xx status or undecodable body.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Rejected locally before submission.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl DistError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            DistError::Transport(_) => ErrorCategory::Network,
            DistError::Protocol(err) if err.is_auth() => ErrorCategory::Auth,
            DistError::Protocol(_) => ErrorCategory::Server,
            DistError::Validation(_) => ErrorCategory::User,
        }
    }

    /// Whether a later identical attempt could succeed. The core never acts on
    /// this; callers may.
    pub fn is_retryable(&self) -> bool {
        match self {
            DistError::Transport(err) => err.is_retryable(),
            DistError::Protocol(ProtocolError::Status { status, .. }) => {
                *status >= 500 || *status == 429 || *status == 408
            }
            DistError::Protocol(ProtocolError::Decode { .. } | ProtocolError::Encode { .. }) => {
                false
            }
            DistError::Validation(_) => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            DistError::Transport(err) => err.user_message(),
            DistError::Protocol(err) => err.user_message(),
            DistError::Validation(err) => err.user_message(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            DistError::Transport(err) => err.error_code(),
            DistError::Protocol(err) => err.error_code(),
            DistError::Validation(err) => err.error_code(),
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }

    /// True for locally detected validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, DistError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let transport: DistError = TransportError::ConnectionFailed {
            url: "http://h".to_string(),
            message: "refused".to_string(),
        }
        .into();
        assert_eq!(transport.category(), ErrorCategory::Network);
        assert!(transport.is_retryable());

        let unauthorized: DistError = ProtocolError::status(401, "").into();
        assert_eq!(unauthorized.category(), ErrorCategory::Auth);
        assert!(!unauthorized.is_retryable());

        let server: DistError = ProtocolError::status(502, "").into();
        assert_eq!(server.category(), ErrorCategory::Server);
        assert!(server.is_retryable());

        let validation: DistError = ValidationError::NoImages.into();
        assert_eq!(validation.category(), ErrorCategory::User);
        assert!(validation.is_validation());
    }

    #[test]
    fn test_display_is_transparent() {
        let err: DistError = ProtocolError::status(404, "instance abc not found").into();
        assert_eq!(err.to_string(), "HTTP 404: instance abc not found");
        assert_eq!(err.error_code(), "PROTOCOL_NOT_FOUND");
    }
}
